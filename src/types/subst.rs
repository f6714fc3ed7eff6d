//! Substitution of type variables by identity.
//!
//! Substitution never looks through registry bindings: a variable is replaced
//! only where it literally occurs in the term. Generalization resolves the
//! term first; instantiation works on scheme bodies, which hold no bound
//! variables of interest.

use std::collections::HashMap;

use super::ty::{
    AliasType, ConstructorType, OpaqueType, RecordType, Scheme, TVar, Type, TypeArgs, VariantType,
};

/// A substitution mapping type variables to types.
#[derive(Clone, Debug, Default)]
pub struct Subst {
    map: HashMap<TVar, Type>,
}

impl Subst {
    /// Create an empty substitution.
    pub fn empty() -> Self {
        Subst {
            map: HashMap::new(),
        }
    }

    /// Create a singleton substitution.
    pub fn singleton(var: TVar, ty: Type) -> Self {
        let mut map = HashMap::new();
        map.insert(var, ty);
        Subst { map }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, var: &TVar) -> Option<&Type> {
        self.map.get(var)
    }

    pub fn contains(&self, var: &TVar) -> bool {
        self.map.contains_key(var)
    }

    pub fn insert(&mut self, var: TVar, ty: Type) {
        self.map.insert(var, ty);
    }

    /// Apply this substitution to a substitutable value.
    pub fn apply<T: Substitutable>(&self, t: &T) -> T {
        t.apply_subst(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TVar, &Type)> {
        self.map.iter()
    }
}

impl FromIterator<(TVar, Type)> for Subst {
    fn from_iter<T: IntoIterator<Item = (TVar, Type)>>(iter: T) -> Self {
        Subst {
            map: iter.into_iter().collect(),
        }
    }
}

/// Trait for values that can have substitutions applied.
pub trait Substitutable {
    fn apply_subst(&self, subst: &Subst) -> Self;
}

impl Substitutable for Type {
    fn apply_subst(&self, subst: &Subst) -> Self {
        if subst.is_empty() {
            return self.clone();
        }
        match self {
            Type::Int
            | Type::Float
            | Type::Bool
            | Type::String
            | Type::Char
            | Type::Unit
            | Type::EmptyRow => self.clone(),

            Type::Var(id) => subst
                .get(&TVar::Unif(*id))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            Type::Gen(id) => subst
                .get(&TVar::Gen(*id))
                .cloned()
                .unwrap_or_else(|| self.clone()),

            Type::Func(arg, ret) => Type::func(arg.apply_subst(subst), ret.apply_subst(subst)),
            Type::Tuple(elements) => Type::Tuple(elements.apply_subst(subst)),
            Type::Record(record) => Type::Record(RecordType {
                fields: record
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.apply_subst(subst)))
                    .collect(),
                tail: Box::new(record.tail.apply_subst(subst)),
            }),
            Type::Variant(variant) => Type::Variant(VariantType {
                id: variant.id,
                args: apply_args(&variant.args, subst),
            }),
            Type::Alias(alias) => Type::Alias(AliasType {
                id: alias.id,
                params: apply_args(&alias.params, subst),
                target: Box::new(alias.target.apply_subst(subst)),
            }),
            Type::Constructor(ctor) => Type::Constructor(ConstructorType {
                name: ctor.name.clone(),
                owner: Box::new(ctor.owner.apply_subst(subst)),
                arg: ctor.arg.as_ref().map(|a| Box::new(a.apply_subst(subst))),
            }),
            Type::Opaque(opaque) => Type::Opaque(OpaqueType {
                id: opaque.id,
                params: apply_args(&opaque.params, subst),
            }),
            // Module members hold their own closed schemes.
            Type::Module(_) => self.clone(),
        }
    }
}

fn apply_args(args: &TypeArgs, subst: &Subst) -> TypeArgs {
    args.iter()
        .map(|(label, ty)| (label.clone(), ty.apply_subst(subst)))
        .collect()
}

impl Substitutable for Scheme {
    fn apply_subst(&self, subst: &Subst) -> Self {
        // Quantified variables are bound by the scheme and stay untouched.
        let filtered: Subst = subst
            .iter()
            .filter(|(var, _)| !matches!(var, TVar::Gen(g) if self.vars.contains(g)))
            .map(|(var, ty)| (*var, ty.clone()))
            .collect();
        Scheme {
            vars: self.vars.clone(),
            body: self.body.apply_subst(&filtered),
        }
    }
}

impl<T: Substitutable> Substitutable for Vec<T> {
    fn apply_subst(&self, subst: &Subst) -> Self {
        self.iter().map(|t| t.apply_subst(subst)).collect()
    }
}

impl Type {
    /// Replace every occurrence of the variable `from` with `to`.
    ///
    /// `from` must be a unification or generalized variable; any other term
    /// leaves `self` unchanged.
    pub fn substitute(&self, from: &Type, to: &Type) -> Type {
        let var = match from {
            Type::Var(id) => TVar::Unif(*id),
            Type::Gen(id) => TVar::Gen(*id),
            _ => return self.clone(),
        };
        Subst::singleton(var, to.clone()).apply(self)
    }
}
