//! rowml: type inference for a small ML-family language.
//!
//! This library provides the static type-inference core of the language:
//!
//! - **Hindley-Milner inference** with let-polymorphism
//! - **Algebraic data types** with nominal identity and constructor arity checks
//! - **Row polymorphism** for extensible records
//! - **Type aliases, abstract types and modules**
//! - **Diagnostics** rendered against the source with ariadne

pub mod builtins;
pub mod diagnostics;
pub mod error;
pub mod infer;
pub mod syntax;
pub mod types;
