//! Type system module for rowml.
//!
//! This module provides the type-term representation, substitution and
//! pretty-printing for the inference core.

mod pretty;
mod subst;
mod ty;

pub use pretty::PrettyContext;
pub use subst::{Subst, Substitutable};
pub use ty::{
    AliasType, ConstructorType, GenId, ModuleType, OpaqueType, RecordType, Scheme, TVar, Type,
    TypeArgs, TypeId, VarId, VariantType,
};
