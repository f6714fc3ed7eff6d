//! Type inference module for rowml.
//!
//! This module provides the core type inference implementation:
//! - `registry`: Arena of unification variables and fresh identities
//! - `env`: Scoped value and type-constructor bindings
//! - `unify`: Unification with occurs check and row splitting
//! - `scheme`: Generalization and instantiation
//! - `type_lookup`: Resolution of written type syntax
//! - `infer`: Inference for expressions and patterns
//! - `decl`: Declarations and whole programs

mod decl;
mod env;
mod infer;
mod registry;
mod scheme;
mod type_lookup;
mod unify;

#[cfg(test)]
mod prop_tests;

pub use decl::{Declared, ProgramReport};
pub use env::TypeEnv;
pub use infer::InferResult;
pub use registry::Registry;
pub use type_lookup::TypeVarScope;
pub use unify::UnifyResult;
