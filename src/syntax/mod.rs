//! Syntax consumed by the type checker.
//!
//! The lexer and parser live outside this crate; this module only defines
//! the trees they produce.

pub mod ast;
mod span;

pub use ast::{Arm, Decl, Expr, Literal, Pattern, TypeDef, TypeSyntax};
pub use span::Span;
