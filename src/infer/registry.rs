//! Type-system registry.
//!
//! The `Registry` owns the arena of unification-variable binding cells and
//! the counters for every fresh identity issued during one inference pass:
//! - Fresh unification variables (write-once binding cells)
//! - Fresh generalized variables
//! - Fresh nominal type identities
//! - Display names for variables left unbound after the pass

use std::collections::BTreeMap;

use crate::error::TypeError;
use crate::types::{GenId, RecordType, Type, TypeId, VarId};

use super::unify::UnifyResult;

/// Binding cell of one unification variable.
#[derive(Clone, Debug, Default)]
struct VarCell {
    binding: Option<Type>,
    name: Option<String>,
}

/// Inference state shared by every operation of one pass.
#[derive(Debug, Default)]
pub struct Registry {
    vars: Vec<VarCell>,
    next_gen: u32,
    next_type_id: u32,
    next_name: usize,
}

impl Registry {
    /// Create a new registry; use one per compilation unit.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Issue a fresh unbound unification variable.
    pub fn fresh_var_id(&mut self) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(VarCell::default());
        id
    }

    /// Issue a fresh unbound unification variable (as a Type).
    pub fn fresh_var(&mut self) -> Type {
        Type::Var(self.fresh_var_id())
    }

    /// Issue a fresh rigid placeholder.
    pub fn fresh_generalized(&mut self) -> GenId {
        let id = GenId(self.next_gen);
        self.next_gen += 1;
        id
    }

    /// Issue a fresh nominal identity for a type declaration.
    pub fn fresh_type_id(&mut self) -> TypeId {
        let id = TypeId(self.next_type_id);
        self.next_type_id += 1;
        id
    }

    /// Number of unification variables issued so far.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// The type a variable is directly bound to, if any.
    pub fn binding(&self, var: VarId) -> Option<&Type> {
        self.vars.get(var.0 as usize)?.binding.as_ref()
    }

    /// Display name assigned by [`normalize_display_names`](Self::normalize_display_names).
    pub fn display_name(&self, var: VarId) -> Option<&str> {
        self.vars.get(var.0 as usize)?.name.as_deref()
    }

    /// Write-once bind of `var` to `ty`.
    ///
    /// Rebinding to a structurally identical type is a no-op; rebinding to a
    /// different type is a `BindingConflict`. Callers perform the
    /// occurs-check.
    pub fn bind(&mut self, var: VarId, ty: Type) -> UnifyResult<()> {
        let existing = match self.vars.get(var.0 as usize) {
            None => {
                return Err(TypeError::UnknownVariable {
                    var: Type::Var(var),
                })
            }
            Some(cell) => cell.binding.clone(),
        };
        match existing {
            None => {
                log::trace!("bind {} := {}", Type::Var(var), ty);
                self.vars[var.0 as usize].binding = Some(ty);
                Ok(())
            }
            Some(existing) if self.same_shape(&existing, &ty) => Ok(()),
            Some(existing) => Err(TypeError::BindingConflict {
                var: Type::Var(var),
                existing: self.resolve(&existing),
                attempted: self.resolve(&ty),
            }),
        }
    }

    /// Follow bound variables to their representative.
    pub fn resolve(&self, ty: &Type) -> Type {
        let mut current = ty;
        while let Type::Var(id) = current {
            match self.binding(*id) {
                Some(bound) => current = bound,
                None => break,
            }
        }
        current.clone()
    }

    /// Resolve every variable in the term, merging chained records into one
    /// field map with a single tail.
    pub fn resolve_deep(&self, ty: &Type) -> Type {
        match self.resolve(ty) {
            Type::Func(arg, ret) => Type::func(self.resolve_deep(&arg), self.resolve_deep(&ret)),
            Type::Tuple(elements) => {
                Type::Tuple(elements.iter().map(|t| self.resolve_deep(t)).collect())
            }
            record @ Type::Record(_) => {
                let (fields, tail) = self.flatten_record(&record);
                let fields = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.resolve_deep(v)))
                    .collect();
                Type::Record(RecordType::open(fields, tail))
            }
            Type::Variant(mut variant) => {
                for (_, arg) in variant.args.iter_mut() {
                    *arg = self.resolve_deep(arg);
                }
                Type::Variant(variant)
            }
            Type::Alias(mut alias) => {
                for (_, arg) in alias.params.iter_mut() {
                    *arg = self.resolve_deep(arg);
                }
                alias.target = Box::new(self.resolve_deep(&alias.target));
                Type::Alias(alias)
            }
            Type::Opaque(mut opaque) => {
                for (_, arg) in opaque.params.iter_mut() {
                    *arg = self.resolve_deep(arg);
                }
                Type::Opaque(opaque)
            }
            Type::Constructor(mut ctor) => {
                ctor.owner = Box::new(self.resolve_deep(&ctor.owner));
                ctor.arg = ctor.arg.map(|a| Box::new(self.resolve_deep(&a)));
                Type::Constructor(ctor)
            }
            other => other,
        }
    }

    /// Split a record into its known fields and the first tail that is not a
    /// record (an unbound variable, a generalized variable or `EmptyRow`).
    ///
    /// A non-record argument yields no fields and itself as the tail.
    pub fn flatten_record(&self, ty: &Type) -> (BTreeMap<String, Type>, Type) {
        let mut fields = BTreeMap::new();
        let mut current = self.resolve(ty);
        while let Type::Record(record) = current {
            for (name, field_ty) in record.fields {
                fields.entry(name).or_insert(field_ty);
            }
            current = self.resolve(&record.tail);
        }
        (fields, current)
    }

    /// Check if a unification variable occurs in a type (occurs check).
    pub fn occurs_in(&self, var: VarId, ty: &Type) -> bool {
        match self.resolve(ty) {
            Type::Var(id) => id == var,
            Type::Int
            | Type::Float
            | Type::Bool
            | Type::String
            | Type::Char
            | Type::Unit
            | Type::EmptyRow
            | Type::Gen(_)
            | Type::Module(_) => false,

            Type::Func(arg, ret) => self.occurs_in(var, &arg) || self.occurs_in(var, &ret),
            Type::Tuple(elements) => elements.iter().any(|t| self.occurs_in(var, t)),
            Type::Record(record) => {
                record.fields.values().any(|t| self.occurs_in(var, t))
                    || self.occurs_in(var, &record.tail)
            }
            Type::Variant(variant) => variant.args.iter().any(|(_, t)| self.occurs_in(var, t)),
            Type::Alias(alias) => self.occurs_in(var, &alias.target),
            Type::Opaque(opaque) => opaque.params.iter().any(|(_, t)| self.occurs_in(var, t)),
            Type::Constructor(ctor) => {
                self.occurs_in(var, &ctor.owner)
                    || ctor.arg.as_ref().is_some_and(|a| self.occurs_in(var, a))
            }
        }
    }

    /// Structural identity after resolution. Never binds anything.
    pub fn same_shape(&self, a: &Type, b: &Type) -> bool {
        let a = self.resolve(a);
        let b = self.resolve(b);
        match (&a, &b) {
            (Type::Alias(alias), other) | (other, Type::Alias(alias)) => {
                if let (Type::Alias(x), Type::Alias(y)) = (&a, &b) {
                    if x.id == y.id && self.same_args(&x.params, &y.params) {
                        return true;
                    }
                }
                self.same_shape(&alias.target, other)
            }

            (Type::Var(x), Type::Var(y)) => x == y,
            (Type::Gen(x), Type::Gen(y)) => x == y,

            (Type::Func(a1, r1), Type::Func(a2, r2)) => {
                self.same_shape(a1, a2) && self.same_shape(r1, r2)
            }
            (Type::Tuple(xs), Type::Tuple(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.same_shape(x, y))
            }
            (Type::Record(_), Type::Record(_)) => {
                let (f1, t1) = self.flatten_record(&a);
                let (f2, t2) = self.flatten_record(&b);
                f1.len() == f2.len()
                    && f1
                        .iter()
                        .all(|(k, v)| f2.get(k).is_some_and(|w| self.same_shape(v, w)))
                    && self.same_shape(&t1, &t2)
            }
            (Type::Variant(x), Type::Variant(y)) => {
                x.id == y.id && self.same_args(&x.args, &y.args)
            }
            (Type::Opaque(x), Type::Opaque(y)) => {
                x.id == y.id && self.same_args(&x.params, &y.params)
            }
            (Type::Constructor(x), Type::Constructor(y)) => {
                x.name == y.name
                    && self.same_shape(&x.owner, &y.owner)
                    && match (&x.arg, &y.arg) {
                        (None, None) => true,
                        (Some(p), Some(q)) => self.same_shape(p, q),
                        _ => false,
                    }
            }
            (Type::Module(x), Type::Module(y)) => x.name == y.name,

            (Type::EmptyRow, Type::EmptyRow) => true,
            _ => a.is_primitive() && a == b,
        }
    }

    fn same_args(&self, xs: &[(String, Type)], ys: &[(String, Type)]) -> bool {
        xs.len() == ys.len()
            && xs
                .iter()
                .zip(ys)
                .all(|((_, x), (_, y))| self.same_shape(x, y))
    }

    /// Assign `a, b, …, z, aa, ab, …` to every variable still unbound and
    /// unnamed, in creation order. Purely cosmetic.
    pub fn normalize_display_names(&mut self) {
        for index in 0..self.vars.len() {
            let cell = &self.vars[index];
            if cell.binding.is_some() || cell.name.is_some() {
                continue;
            }
            let name = letter_name(self.next_name);
            self.next_name += 1;
            self.vars[index].name = Some(name);
        }
    }
}

/// Bijective base-26 name: 0 → `a`, 25 → `z`, 26 → `aa`, 27 → `ab`.
fn letter_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'a' + (index % 26) as u8));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_vars_are_distinct() {
        let mut registry = Registry::new();
        let v1 = registry.fresh_var_id();
        let v2 = registry.fresh_var_id();
        let g1 = registry.fresh_generalized();
        let g2 = registry.fresh_generalized();
        assert_ne!(v1, v2);
        assert_ne!(g1, g2);
        assert_eq!(registry.var_count(), 2);
    }

    #[test]
    fn test_resolve_follows_chain() {
        let mut registry = Registry::new();
        let a = registry.fresh_var_id();
        let b = registry.fresh_var_id();
        registry.bind(a, Type::Var(b)).unwrap();
        registry.bind(b, Type::Int).unwrap();
        assert_eq!(registry.resolve(&Type::Var(a)), Type::Int);
    }

    #[test]
    fn test_rebind_same_shape_is_noop() {
        let mut registry = Registry::new();
        let a = registry.fresh_var_id();
        registry.bind(a, Type::func(Type::Int, Type::Bool)).unwrap();
        assert!(registry.bind(a, Type::func(Type::Int, Type::Bool)).is_ok());
    }

    #[test]
    fn test_rebind_conflict() {
        let mut registry = Registry::new();
        let a = registry.fresh_var_id();
        registry.bind(a, Type::Int).unwrap();
        let err = registry.bind(a, Type::Bool).unwrap_err();
        assert!(matches!(err, TypeError::BindingConflict { .. }));
        assert_eq!(registry.resolve(&Type::Var(a)), Type::Int);
    }

    #[test]
    fn test_bind_foreign_variable() {
        let mut other = Registry::new();
        other.fresh_var_id();
        let foreign = other.fresh_var_id();

        let mut registry = Registry::new();
        let err = registry.bind(foreign, Type::Int).unwrap_err();
        assert!(matches!(err, TypeError::UnknownVariable { .. }));
    }

    #[test]
    fn test_occurs_check_through_chain() {
        let mut registry = Registry::new();
        let a = registry.fresh_var_id();
        let b = registry.fresh_var_id();
        registry.bind(b, Type::Tuple(vec![Type::Var(a), Type::Int])).unwrap();

        assert!(registry.occurs_in(a, &Type::func(Type::Var(b), Type::Int)));
        assert!(!registry.occurs_in(a, &Type::Int));
    }

    #[test]
    fn test_flatten_record_chain() {
        let mut registry = Registry::new();
        let r = registry.fresh_var_id();
        let tail = registry.fresh_var();
        registry
            .bind(r, Type::record_open([("y", Type::Bool)], tail.clone()))
            .unwrap();
        let record = Type::record_open([("x", Type::Int)], Type::Var(r));

        let (fields, rest) = registry.flatten_record(&record);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["y"], Type::Bool);
        assert_eq!(rest, tail);
    }

    #[test]
    fn test_same_shape_records_ignore_chaining() {
        let mut registry = Registry::new();
        let r = registry.fresh_var_id();
        registry.bind(r, Type::record([("y", Type::Bool)])).unwrap();
        let chained = Type::record_open([("x", Type::Int)], Type::Var(r));
        let flat = Type::record([("x", Type::Int), ("y", Type::Bool)]);
        assert!(registry.same_shape(&chained, &flat));
        assert!(!registry.same_shape(&flat, &Type::record([("x", Type::Int)])));
    }

    #[test]
    fn test_resolve_deep_merges_records() {
        let mut registry = Registry::new();
        let r = registry.fresh_var_id();
        let a = registry.fresh_var_id();
        registry.bind(a, Type::Char).unwrap();
        registry.bind(r, Type::record([("y", Type::Var(a))])).unwrap();
        let ty = Type::func(Type::record_open([("x", Type::Int)], Type::Var(r)), Type::Var(a));
        assert_eq!(
            registry.resolve_deep(&ty),
            Type::func(Type::record([("x", Type::Int), ("y", Type::Char)]), Type::Char)
        );
    }

    #[test]
    fn test_letter_names() {
        assert_eq!(letter_name(0), "a");
        assert_eq!(letter_name(25), "z");
        assert_eq!(letter_name(26), "aa");
        assert_eq!(letter_name(27), "ab");
        assert_eq!(letter_name(52), "ba");
        assert_eq!(letter_name(26 + 26 * 26), "aaa");
    }

    #[test]
    fn test_normalize_skips_bound_vars() {
        let mut registry = Registry::new();
        let a = registry.fresh_var_id();
        let b = registry.fresh_var_id();
        let c = registry.fresh_var_id();
        registry.bind(b, Type::Int).unwrap();
        registry.normalize_display_names();

        assert_eq!(registry.display_name(a), Some("a"));
        assert_eq!(registry.display_name(b), None);
        assert_eq!(registry.display_name(c), Some("b"));

        let d = registry.fresh_var_id();
        registry.normalize_display_names();
        assert_eq!(registry.display_name(a), Some("a"));
        assert_eq!(registry.display_name(d), Some("c"));
    }
}
