//! Core type definitions for rowml type inference.
//!
//! Type terms are plain owned trees. Unification variables are only an index
//! into the [`Registry`](crate::infer::Registry) arena, which owns the mutable
//! binding cell, so any number of terms can alias the same variable.

use std::collections::{BTreeMap, HashSet};

use crate::infer::TypeEnv;

/// Identity of a unification variable (index into the registry arena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u32);

/// Identity of a generalized (rigid) variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenId(pub u32);

/// Nominal identity of a declared variant, alias or opaque type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

/// Either kind of type variable, used as a substitution key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TVar {
    /// Unification variable.
    Unif(VarId),
    /// Generalized variable.
    Gen(GenId),
}

impl TVar {
    pub fn as_type(self) -> Type {
        match self {
            TVar::Unif(id) => Type::Var(id),
            TVar::Gen(id) => Type::Gen(id),
        }
    }
}

/// Type parameters of a nominal type: `(label, argument)` pairs in declaration order.
pub type TypeArgs = Vec<(String, Type)>;

/// Extensible record: known fields plus a row tail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordType {
    pub fields: BTreeMap<String, Type>,
    /// `EmptyRow` for a closed record, otherwise a variable or another record.
    pub tail: Box<Type>,
}

impl RecordType {
    pub fn closed(fields: BTreeMap<String, Type>) -> Self {
        RecordType {
            fields,
            tail: Box::new(Type::EmptyRow),
        }
    }

    pub fn open(fields: BTreeMap<String, Type>, tail: Type) -> Self {
        RecordType {
            fields,
            tail: Box::new(tail),
        }
    }
}

/// Algebraic data type instance. Equality is decided by `id` alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantType {
    pub id: TypeId,
    pub args: TypeArgs,
}

/// Transparent abbreviation with its arguments already substituted into `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasType {
    pub id: TypeId,
    pub params: TypeArgs,
    pub target: Box<Type>,
}

/// Type of a variant constructor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructorType {
    pub name: String,
    /// Always a `Type::Variant`.
    pub owner: Box<Type>,
    /// `None` for nullary constructors.
    pub arg: Option<Box<Type>>,
}

/// Abstract type declared without a visible definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpaqueType {
    pub id: TypeId,
    pub params: TypeArgs,
}

/// Structural type of a module value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleType {
    pub name: String,
    pub env: Box<TypeEnv>,
}

/// Core type representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    // === Primitive types ===
    Int,
    Float,
    Bool,
    String,
    Char,
    Unit,

    // === Type variables ===
    /// Unification variable; its binding lives in the registry.
    Var(VarId),
    /// Rigid placeholder introduced by generalization.
    Gen(GenId),

    // === Compound types ===
    Func(Box<Type>, Box<Type>),
    /// At least two elements.
    Tuple(Vec<Type>),
    Record(RecordType),
    /// Tail of a closed record.
    EmptyRow,
    Variant(VariantType),
    Alias(AliasType),
    Constructor(ConstructorType),
    Opaque(OpaqueType),
    Module(ModuleType),
}

impl Type {
    // === Constructors ===

    pub fn func(arg: Type, ret: Type) -> Self {
        Type::Func(Box::new(arg), Box::new(ret))
    }

    /// Curried function over several parameters.
    pub fn func_n(params: impl IntoIterator<Item = Type>, ret: Type) -> Self {
        let params: Vec<Type> = params.into_iter().collect();
        params
            .into_iter()
            .rev()
            .fold(ret, |acc, param| Type::func(param, acc))
    }

    /// Tuple type; zero elements collapse to `Unit` and one element to itself.
    pub fn tuple(elements: Vec<Type>) -> Self {
        match elements.len() {
            0 => Type::Unit,
            1 => elements.into_iter().next().unwrap_or(Type::Unit),
            _ => Type::Tuple(elements),
        }
    }

    /// Closed record with the given fields.
    pub fn record(fields: impl IntoIterator<Item = (impl Into<String>, Type)>) -> Self {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Type::Record(RecordType::closed(fields))
    }

    /// Open record with the given fields and row tail.
    pub fn record_open(
        fields: impl IntoIterator<Item = (impl Into<String>, Type)>,
        tail: Type,
    ) -> Self {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Type::Record(RecordType::open(fields, tail))
    }

    pub fn variant(id: TypeId, args: TypeArgs) -> Self {
        Type::Variant(VariantType { id, args })
    }

    // === Predicates ===

    pub fn is_var(&self) -> bool {
        matches!(self, Type::Var(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Float | Type::Bool | Type::String | Type::Char | Type::Unit
        )
    }

    /// Nominal identity of a variant, alias or opaque type.
    pub fn nominal_id(&self) -> Option<TypeId> {
        match self {
            Type::Variant(v) => Some(v.id),
            Type::Alias(a) => Some(a.id),
            Type::Opaque(o) => Some(o.id),
            _ => None,
        }
    }

    /// Collect the variables of this term in first-occurrence order, without
    /// resolving bindings. Module types are closed and are not entered.
    pub fn collect_vars(&self, out: &mut Vec<TVar>, seen: &mut HashSet<TVar>) {
        match self {
            Type::Int
            | Type::Float
            | Type::Bool
            | Type::String
            | Type::Char
            | Type::Unit
            | Type::EmptyRow
            | Type::Module(_) => {}

            Type::Var(id) => {
                if seen.insert(TVar::Unif(*id)) {
                    out.push(TVar::Unif(*id));
                }
            }
            Type::Gen(id) => {
                if seen.insert(TVar::Gen(*id)) {
                    out.push(TVar::Gen(*id));
                }
            }

            Type::Func(arg, ret) => {
                arg.collect_vars(out, seen);
                ret.collect_vars(out, seen);
            }
            Type::Tuple(elements) => {
                for t in elements {
                    t.collect_vars(out, seen);
                }
            }
            Type::Record(record) => {
                for t in record.fields.values() {
                    t.collect_vars(out, seen);
                }
                record.tail.collect_vars(out, seen);
            }
            Type::Variant(VariantType { args, .. }) | Type::Opaque(OpaqueType { params: args, .. }) => {
                for (_, t) in args {
                    t.collect_vars(out, seen);
                }
            }
            Type::Alias(alias) => {
                for (_, t) in &alias.params {
                    t.collect_vars(out, seen);
                }
                alias.target.collect_vars(out, seen);
            }
            Type::Constructor(ctor) => {
                ctor.owner.collect_vars(out, seen);
                if let Some(arg) = &ctor.arg {
                    arg.collect_vars(out, seen);
                }
            }
        }
    }

    /// All variables of this term, in first-occurrence order.
    pub fn vars(&self) -> Vec<TVar> {
        let mut out = Vec::new();
        self.collect_vars(&mut out, &mut HashSet::new());
        out
    }

    /// Row tails of every record in this term that ends in a variable
    /// (unification or generalized), in first-occurrence order.
    pub fn open_row_tails(&self) -> Vec<TVar> {
        let mut out = Vec::new();
        self.collect_row_tails(&mut out, &mut HashSet::new());
        out
    }

    fn collect_row_tails(&self, out: &mut Vec<TVar>, seen: &mut HashSet<TVar>) {
        match self {
            Type::Record(record) => {
                for t in record.fields.values() {
                    t.collect_row_tails(out, seen);
                }
                let tail = match record.tail.as_ref() {
                    Type::Var(id) => Some(TVar::Unif(*id)),
                    Type::Gen(id) => Some(TVar::Gen(*id)),
                    _ => None,
                };
                match tail {
                    Some(tail) => {
                        if seen.insert(tail) {
                            out.push(tail);
                        }
                    }
                    None => record.tail.collect_row_tails(out, seen),
                }
            }
            Type::Func(arg, ret) => {
                arg.collect_row_tails(out, seen);
                ret.collect_row_tails(out, seen);
            }
            Type::Tuple(elements) => {
                for t in elements {
                    t.collect_row_tails(out, seen);
                }
            }
            Type::Variant(VariantType { args, .. }) | Type::Opaque(OpaqueType { params: args, .. }) => {
                for (_, t) in args {
                    t.collect_row_tails(out, seen);
                }
            }
            Type::Alias(alias) => alias.target.collect_row_tails(out, seen),
            Type::Constructor(ctor) => {
                ctor.owner.collect_row_tails(out, seen);
                if let Some(arg) = &ctor.arg {
                    arg.collect_row_tails(out, seen);
                }
            }
            _ => {}
        }
    }
}

/// Type scheme: a universally quantified type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scheme {
    /// Quantified generalized variables.
    pub vars: Vec<GenId>,
    pub body: Type,
}

impl Scheme {
    /// Create a monomorphic type scheme (no quantification).
    pub fn mono(body: Type) -> Self {
        Scheme { vars: vec![], body }
    }

    pub fn poly(vars: Vec<GenId>, body: Type) -> Self {
        Scheme { vars, body }
    }

    pub fn is_mono(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_construction() {
        assert!(Type::Int.is_primitive());
        assert!(Type::Var(VarId(0)).is_var());
        assert!(!Type::func(Type::Int, Type::Bool).is_primitive());
    }

    #[test]
    fn test_tuple_collapses_small_arities() {
        assert_eq!(Type::tuple(vec![]), Type::Unit);
        assert_eq!(Type::tuple(vec![Type::Int]), Type::Int);
        assert_eq!(
            Type::tuple(vec![Type::Int, Type::Bool]),
            Type::Tuple(vec![Type::Int, Type::Bool])
        );
    }

    #[test]
    fn test_func_n_is_curried() {
        let ty = Type::func_n([Type::Int, Type::Bool], Type::Unit);
        assert_eq!(
            ty,
            Type::func(Type::Int, Type::func(Type::Bool, Type::Unit))
        );
    }

    #[test]
    fn test_vars_in_first_occurrence_order() {
        let ty = Type::func(
            Type::Var(VarId(3)),
            Type::Tuple(vec![Type::Gen(GenId(1)), Type::Var(VarId(3)), Type::Var(VarId(0))]),
        );
        assert_eq!(
            ty.vars(),
            vec![TVar::Unif(VarId(3)), TVar::Gen(GenId(1)), TVar::Unif(VarId(0))]
        );
    }

    #[test]
    fn test_open_row_tails() {
        let inner = Type::record_open([("y", Type::Bool)], Type::Var(VarId(7)));
        let ty = Type::func(
            Type::record_open([("x", inner)], Type::Var(VarId(2))),
            Type::record([("z", Type::Int)]),
        );
        assert_eq!(
            ty.open_row_tails(),
            vec![TVar::Unif(VarId(7)), TVar::Unif(VarId(2))]
        );
    }

    #[test]
    fn test_scheme_mono() {
        assert!(Scheme::mono(Type::Int).is_mono());
        assert!(!Scheme::poly(vec![GenId(0)], Type::Gen(GenId(0))).is_mono());
    }
}
