//! Error types for the rowml type checker.

use thiserror::Error;

use crate::syntax::Span;
use crate::types::Type;

/// Type checking errors.
///
/// Types carried here are resolved at the point of failure; render them with
/// [`PrettyContext`](crate::types::PrettyContext) for user-facing names.
#[derive(Debug, Clone, Error)]
pub enum TypeError {
    #[error("Cannot unify {left} with {right}")]
    Mismatch { left: Type, right: Type },

    #[error("Infinite type: {var} occurs in {ty}")]
    Cyclic { var: Type, ty: Type },

    /// Internal invariant violation: the binding discipline is broken.
    #[error("Conflicting binding for {var}: bound to {existing}, rebound to {attempted}")]
    BindingConflict {
        var: Type,
        existing: Type,
        attempted: Type,
    },

    /// Internal invariant violation: a variable issued by another registry.
    #[error("Unknown type variable {var}")]
    UnknownVariable { var: Type },

    #[error("Unbound name '{name}'")]
    UnboundName { name: String },

    #[error("Unbound type constructor '{name}'")]
    UnboundTypeConstructor { name: String },

    #[error("Unbound type variable '{label}")]
    UnboundTypeVariable { label: String },

    #[error("Constructor {constructor} expects {expected} argument(s), but is applied to {found}")]
    ConstructorArity {
        constructor: String,
        expected: usize,
        found: usize,
    },

    #[error("Type constructor {name} expects {expected} argument(s), but is given {found}")]
    TypeArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("'{name}' is not a constructor")]
    NotAConstructor { name: String },

    #[error("'{name}' is not a module")]
    NotAModule { name: String },

    #[error("Field '{field}' is defined more than once")]
    DuplicateField { field: String },
}

impl TypeError {
    /// Cyclic types are reported as structural mismatches at the API boundary.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, TypeError::Mismatch { .. } | TypeError::Cyclic { .. })
    }

    /// Attach the span of the syntax where this error surfaced.
    pub fn at(self, span: Span) -> InferError {
        InferError { kind: self, span }
    }
}

/// A type error located in the source.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct InferError {
    pub kind: TypeError,
    pub span: Span,
}

impl InferError {
    pub fn span(&self) -> Span {
        self.span
    }
}
