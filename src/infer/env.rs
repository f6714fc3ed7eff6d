//! Type environment for name bindings.
//!
//! The type environment maps value names and type-constructor names to their
//! type schemes, supporting scoping through immutable extension: every nested
//! scope works on its own copy, so sibling scopes never observe each other's
//! bindings.

use std::collections::{HashMap, HashSet};

use crate::error::TypeError;
use crate::types::{Scheme, TVar, TypeId, VarId};

use super::registry::Registry;
use super::unify::UnifyResult;

/// Type environment mapping names to type schemes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeEnv {
    values: HashMap<String, Scheme>,
    types: HashMap<String, Scheme>,
}

impl TypeEnv {
    /// Create an empty environment.
    pub fn empty() -> Self {
        TypeEnv::default()
    }

    /// Independent snapshot of this scope.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Look up a value name.
    pub fn lookup_binding(&self, name: &str) -> UnifyResult<&Scheme> {
        self.values.get(name).ok_or_else(|| TypeError::UnboundName {
            name: name.to_string(),
        })
    }

    /// Look up a type-constructor name.
    pub fn lookup_type(&self, name: &str) -> UnifyResult<&Scheme> {
        self.types
            .get(name)
            .ok_or_else(|| TypeError::UnboundTypeConstructor {
                name: name.to_string(),
            })
    }

    /// Bind a value name in this scope, shadowing any previous binding.
    pub fn add_binding(&mut self, name: impl Into<String>, scheme: Scheme) {
        self.values.insert(name.into(), scheme);
    }

    /// Bind a type-constructor name in this scope.
    pub fn add_type(&mut self, name: impl Into<String>, scheme: Scheme) {
        self.types.insert(name.into(), scheme);
    }

    /// Extend the environment with a new value binding.
    /// Returns a new environment (immutable extension).
    pub fn extend(&self, name: impl Into<String>, scheme: Scheme) -> Self {
        let mut env = self.copy();
        env.add_binding(name, scheme);
        env
    }

    /// Extend the environment with a new type constructor.
    pub fn extend_type(&self, name: impl Into<String>, scheme: Scheme) -> Self {
        let mut env = self.copy();
        env.add_type(name, scheme);
        env
    }

    /// Unbound unification variables reachable from the value bindings.
    pub fn free_vars(&self, registry: &Registry) -> HashSet<VarId> {
        let mut vars = HashSet::new();
        for scheme in self.values.values() {
            for var in registry.resolve_deep(&scheme.body).vars() {
                if let TVar::Unif(id) = var {
                    vars.insert(id);
                }
            }
        }
        vars
    }

    /// The user-facing name of the declared type with nominal identity `id`.
    pub fn type_name_of(&self, id: TypeId) -> Option<&str> {
        self.types
            .iter()
            .find(|(_, scheme)| scheme.body.nominal_id() == Some(id))
            .map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.types.is_empty()
    }
}
