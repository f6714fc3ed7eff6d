//! Generalization and instantiation of type schemes.

use std::collections::HashSet;

use crate::error::TypeError;
use crate::types::{Scheme, Subst, TVar, Type, VarId};

use super::env::TypeEnv;
use super::registry::Registry;
use super::unify::UnifyResult;

impl Registry {
    /// Generalize every unbound variable of `ty` into a scheme.
    pub fn generalize(&mut self, ty: &Type) -> Scheme {
        self.generalize_excluding(ty, &HashSet::new())
    }

    /// Generalize a type over the variables not free in the environment.
    pub fn generalize_in(&mut self, env: &TypeEnv, ty: &Type) -> Scheme {
        let fixed = env.free_vars(self);
        self.generalize_excluding(ty, &fixed)
    }

    fn generalize_excluding(&mut self, ty: &Type, fixed: &HashSet<VarId>) -> Scheme {
        let ty = self.resolve_deep(ty);
        let mut vars = Vec::new();

        // Open records first: one quantifier per distinct row tail.
        let mut rows = Subst::empty();
        for tail in ty.open_row_tails() {
            if let TVar::Unif(id) = tail {
                if fixed.contains(&id) {
                    continue;
                }
                let gen = self.fresh_generalized();
                rows.insert(tail, Type::Gen(gen));
                vars.push(gen);
            }
        }
        let ty = rows.apply(&ty);

        // Then every remaining unbound variable.
        let mut rest = Subst::empty();
        for var in self.resolve_deep(&ty).vars() {
            if let TVar::Unif(id) = var {
                if fixed.contains(&id) {
                    continue;
                }
                let gen = self.fresh_generalized();
                rest.insert(var, Type::Gen(gen));
                vars.push(gen);
            }
        }
        let body = rest.apply(&ty);

        log::debug!("generalized {} over {} variable(s)", body, vars.len());
        Scheme { vars, body }
    }

    /// Instantiate a type scheme with fresh unification variables.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Type {
        let mut subst = self.fresh_row_tails(&scheme.body);
        for gen in &scheme.vars {
            let var = TVar::Gen(*gen);
            if !subst.contains(&var) {
                let fresh = self.fresh_var();
                subst.insert(var, fresh);
            }
        }
        subst.apply(&scheme.body)
    }

    /// Apply a type-constructor scheme to explicit arguments.
    pub fn instantiate_with(
        &mut self,
        name: &str,
        scheme: &Scheme,
        args: Vec<Type>,
    ) -> UnifyResult<Type> {
        let applied = apply_type_args(name, scheme, args)?;
        // Rows left open by the declaration itself still need their own tail.
        let rows = self.fresh_row_tails(&applied);
        Ok(rows.apply(&applied))
    }

    /// Apply a type-constructor scheme inside another type declaration.
    ///
    /// Open rows get fresh generalized tails rather than unification
    /// variables, so each use of the enclosing declaration opens them anew.
    pub fn instantiate_declared(
        &mut self,
        name: &str,
        scheme: &Scheme,
        args: Vec<Type>,
    ) -> UnifyResult<Type> {
        let applied = apply_type_args(name, scheme, args)?;
        let mut rows = Subst::empty();
        for tail in applied.open_row_tails() {
            if matches!(tail, TVar::Gen(_)) && !rows.contains(&tail) {
                rows.insert(tail, Type::Gen(self.fresh_generalized()));
            }
        }
        Ok(rows.apply(&applied))
    }

    /// One fresh variable per generalized open-record tail in `ty`.
    fn fresh_row_tails(&mut self, ty: &Type) -> Subst {
        let mut subst = Subst::empty();
        for tail in ty.open_row_tails() {
            if matches!(tail, TVar::Gen(_)) && !subst.contains(&tail) {
                let fresh = self.fresh_var();
                subst.insert(tail, fresh);
            }
        }
        subst
    }
}

fn apply_type_args(name: &str, scheme: &Scheme, args: Vec<Type>) -> UnifyResult<Type> {
    if scheme.vars.len() != args.len() {
        return Err(TypeError::TypeArity {
            name: name.to_string(),
            expected: scheme.vars.len(),
            found: args.len(),
        });
    }
    let subst: Subst = scheme
        .vars
        .iter()
        .map(|g| TVar::Gen(*g))
        .zip(args)
        .collect();
    Ok(subst.apply(&scheme.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeId;

    #[test]
    fn test_generalize_closed_type_is_mono() {
        let mut registry = Registry::new();
        let ty = Type::func(Type::Int, Type::Tuple(vec![Type::Bool, Type::Char]));
        let scheme = registry.generalize(&ty);
        assert!(scheme.vars.is_empty());
        assert_eq!(scheme.body, ty);
        let inst = registry.instantiate(&scheme);
        assert!(registry.same_shape(&inst, &ty));
    }

    #[test]
    fn test_generalize_identity() {
        let mut registry = Registry::new();
        let a = registry.fresh_var();
        let scheme = registry.generalize(&Type::func(a.clone(), a));
        assert_eq!(scheme.vars.len(), 1);
        let g = Type::Gen(scheme.vars[0]);
        assert_eq!(scheme.body, Type::func(g.clone(), g));
    }

    #[test]
    fn test_generalize_resolves_bound_vars() {
        let mut registry = Registry::new();
        let a = registry.fresh_var();
        let b = registry.fresh_var();
        registry.unify(&a, &Type::Int).unwrap();
        let scheme = registry.generalize(&Type::func(a, b));
        assert_eq!(scheme.vars.len(), 1);
        assert_eq!(scheme.body, Type::func(Type::Int, Type::Gen(scheme.vars[0])));
    }

    #[test]
    fn test_instantiations_are_independent() {
        let mut registry = Registry::new();
        let a = registry.fresh_var();
        let scheme = registry.generalize(&Type::func(a.clone(), a));

        let first = registry.instantiate(&scheme);
        let second = registry.instantiate(&scheme);
        registry.unify(&first, &Type::func(Type::Int, Type::Int)).unwrap();
        registry
            .unify(&second, &Type::func(Type::Bool, Type::Bool))
            .unwrap();
        assert!(registry.same_shape(&first, &Type::func(Type::Int, Type::Int)));
    }

    #[test]
    fn test_open_record_tail_is_quantified_first() {
        let mut registry = Registry::new();
        let field = registry.fresh_var();
        let row = registry.fresh_var();
        let record = Type::record_open([("x", field.clone())], row);
        let scheme = registry.generalize(&Type::func(record, field));

        assert_eq!(scheme.vars.len(), 2);
        let Type::Func(arg, _) = &scheme.body else {
            panic!("expected function, got {:?}", scheme.body);
        };
        let Type::Record(record) = arg.as_ref() else {
            panic!("expected record, got {:?}", arg);
        };
        assert_eq!(*record.tail, Type::Gen(scheme.vars[0]));
    }

    #[test]
    fn test_shared_row_stays_shared() {
        let mut registry = Registry::new();
        let row = registry.fresh_var();
        let record = Type::record_open([("x", Type::Int)], row);
        let scheme = registry.generalize(&Type::func(record.clone(), record));
        assert_eq!(scheme.vars.len(), 1);

        let inst = registry.instantiate(&scheme);
        let Type::Func(arg, ret) = inst else {
            panic!("expected function");
        };
        assert!(registry.same_shape(&arg, &ret));
    }

    #[test]
    fn test_instantiate_open_record_tail_outside_quantifiers() {
        let mut registry = Registry::new();
        let g = registry.fresh_generalized();
        let scheme = Scheme::mono(Type::record_open([("x", Type::Int)], Type::Gen(g)));
        let inst = registry.instantiate(&scheme);
        let (_, tail) = registry.flatten_record(&inst);
        assert!(tail.is_var());
    }

    #[test]
    fn test_generalize_in_keeps_env_vars() {
        let mut registry = Registry::new();
        let a = registry.fresh_var();
        let b = registry.fresh_var();
        let env = TypeEnv::empty().extend("x", Scheme::mono(a.clone()));
        let scheme = registry.generalize_in(&env, &Type::func(a.clone(), b));
        assert_eq!(scheme.vars.len(), 1);
        assert_eq!(scheme.body, Type::func(a, Type::Gen(scheme.vars[0])));
    }

    #[test]
    fn test_instantiate_with_args() {
        let mut registry = Registry::new();
        let g = registry.fresh_generalized();
        let body = Type::variant(TypeId(0), vec![("a".to_string(), Type::Gen(g))]);
        let scheme = Scheme::poly(vec![g], body);

        let applied = registry
            .instantiate_with("option", &scheme, vec![Type::Int])
            .unwrap();
        assert_eq!(
            applied,
            Type::variant(TypeId(0), vec![("a".to_string(), Type::Int)])
        );

        let err = registry
            .instantiate_with("option", &scheme, vec![])
            .unwrap_err();
        assert!(matches!(
            err,
            TypeError::TypeArity { expected: 1, found: 0, .. }
        ));
    }

    #[test]
    fn test_instantiate_declared_keeps_rows_rigid() {
        let mut registry = Registry::new();
        let g = registry.fresh_generalized();
        let scheme = Scheme::mono(Type::record_open([("x", Type::Int)], Type::Gen(g)));

        let first = registry.instantiate_declared("row", &scheme, vec![]).unwrap();
        let second = registry.instantiate_declared("row", &scheme, vec![]).unwrap();
        let (_, first_tail) = registry.flatten_record(&first);
        let (_, second_tail) = registry.flatten_record(&second);
        assert!(matches!(first_tail, Type::Gen(id) if id != g));
        assert!(matches!(second_tail, Type::Gen(_)));
        assert_ne!(first_tail, second_tail);
        assert_eq!(registry.var_count(), 0);
    }
}
