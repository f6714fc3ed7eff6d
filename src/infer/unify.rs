//! Unification algorithm for type inference.
//!
//! Implements destructive unification over registry-bound variables:
//! - Primitives, functions, tuples
//! - Nominal variants and opaque types (identity first, then arguments)
//! - Transparent aliases
//! - Extensible records with row splitting
//!
//! A failed unification leaves every binding made before the failure in place.

use std::collections::BTreeMap;

use crate::error::TypeError;
use crate::types::{Type, TypeArgs};

use super::registry::Registry;

/// Result type for unification.
pub type UnifyResult<T> = Result<T, TypeError>;

impl Registry {
    /// Unify two types, binding unification variables as needed.
    pub fn unify(&mut self, a: &Type, b: &Type) -> UnifyResult<()> {
        let a = self.resolve(a);
        let b = self.resolve(b);
        log::trace!("unify {} ~ {}", a, b);

        match (&a, &b) {
            // Same variable
            (Type::Var(x), Type::Var(y)) if x == y => Ok(()),

            // Unbound variable binds to anything
            (Type::Var(var), other) | (other, Type::Var(var)) => {
                if self.occurs_in(*var, other) {
                    return Err(TypeError::Cyclic {
                        var: Type::Var(*var),
                        ty: self.resolve_deep(other),
                    });
                }
                self.bind(*var, other.clone())
            }

            // Rigid variables only match themselves
            (Type::Gen(x), Type::Gen(y)) if x == y => Ok(()),

            // Primitives
            (Type::Int, Type::Int)
            | (Type::Float, Type::Float)
            | (Type::Bool, Type::Bool)
            | (Type::String, Type::String)
            | (Type::Char, Type::Char)
            | (Type::Unit, Type::Unit)
            | (Type::EmptyRow, Type::EmptyRow) => Ok(()),

            // Aliases are transparent
            (Type::Alias(alias), other) | (other, Type::Alias(alias)) => {
                self.unify(&alias.target, other)
            }

            (Type::Func(a1, r1), Type::Func(a2, r2)) => {
                self.unify(a1, a2)?;
                self.unify(r1, r2)
            }

            (Type::Tuple(xs), Type::Tuple(ys)) => {
                if xs.len() != ys.len() {
                    return Err(self.mismatch(&a, &b));
                }
                for (x, y) in xs.iter().zip(ys) {
                    self.unify(x, y)?;
                }
                Ok(())
            }

            (Type::Variant(x), Type::Variant(y)) => {
                if x.id != y.id {
                    return Err(self.mismatch(&a, &b));
                }
                self.unify_args(&a, &b, &x.args, &y.args)
            }

            (Type::Opaque(x), Type::Opaque(y)) => {
                if x.id != y.id {
                    return Err(self.mismatch(&a, &b));
                }
                self.unify_args(&a, &b, &x.params, &y.params)
            }

            (Type::Constructor(x), Type::Constructor(y)) => {
                if x.name != y.name {
                    return Err(self.mismatch(&a, &b));
                }
                self.unify(&x.owner, &y.owner)?;
                match (&x.arg, &y.arg) {
                    (None, None) => Ok(()),
                    (Some(p), Some(q)) => self.unify(p, q),
                    _ => Err(self.mismatch(&a, &b)),
                }
            }

            (Type::Module(x), Type::Module(y)) if x.name == y.name => Ok(()),

            // Row types
            (Type::Record(_), Type::Record(_))
            | (Type::Record(_), Type::EmptyRow)
            | (Type::EmptyRow, Type::Record(_)) => self.unify_records(&a, &b),

            // Mismatch
            _ => Err(self.mismatch(&a, &b)),
        }
    }

    fn unify_args(
        &mut self,
        a: &Type,
        b: &Type,
        xs: &TypeArgs,
        ys: &TypeArgs,
    ) -> UnifyResult<()> {
        if xs.len() != ys.len() {
            return Err(self.mismatch(a, b));
        }
        for ((_, x), (_, y)) in xs.iter().zip(ys) {
            self.unify(x, y)?;
        }
        Ok(())
    }

    /// Unify two row types.
    fn unify_records(&mut self, a: &Type, b: &Type) -> UnifyResult<()> {
        let (mine, my_tail) = self.flatten_record(a);
        let (theirs, their_tail) = self.flatten_record(b);

        // Fields present on both sides unify pairwise
        let mut missing_from_theirs = BTreeMap::new();
        for (name, ty) in &mine {
            match theirs.get(name) {
                Some(other) => self.unify(ty, other)?,
                None => {
                    missing_from_theirs.insert(name.clone(), ty.clone());
                }
            }
        }
        let missing_from_mine: BTreeMap<String, Type> = theirs
            .iter()
            .filter(|(name, _)| !mine.contains_key(*name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        // Field unification may have solved a tail; split again from scratch.
        let my_tail = self.resolve(&my_tail);
        let their_tail = self.resolve(&their_tail);
        if matches!(my_tail, Type::Record(_)) || matches!(their_tail, Type::Record(_)) {
            return self.unify_records(a, b);
        }

        match (missing_from_mine.is_empty(), missing_from_theirs.is_empty()) {
            (true, true) => self.unify(&my_tail, &their_tail),

            (false, true) => {
                if !my_tail.is_var() {
                    return Err(self.mismatch(a, b));
                }
                self.unify(&my_tail, &Type::record_open(missing_from_mine, their_tail))
            }

            (true, false) => {
                if !their_tail.is_var() {
                    return Err(self.mismatch(a, b));
                }
                self.unify(&their_tail, &Type::record_open(missing_from_theirs, my_tail))
            }

            (false, false) => {
                // Both open, create a fresh row variable for the common tail
                if !my_tail.is_var() || !their_tail.is_var() || my_tail == their_tail {
                    return Err(self.mismatch(a, b));
                }
                let shared = self.fresh_var();
                self.unify(
                    &my_tail,
                    &Type::record_open(missing_from_mine, shared.clone()),
                )?;
                self.unify(&their_tail, &Type::record_open(missing_from_theirs, shared))
            }
        }
    }

    /// Create a structural mismatch error carrying both resolved operands.
    fn mismatch(&self, a: &Type, b: &Type) -> TypeError {
        TypeError::Mismatch {
            left: self.resolve_deep(a),
            right: self.resolve_deep(b),
        }
    }
}
