//! # Error Types
//!
//! Every error a slot, a namespace or the class factory can raise.
//! None of them are recovered inside the workspace; callers match on the
//! variant they expect.

use std::fmt;

use thiserror::Error;

/// The attribute operation that was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    /// Reading the attribute.
    Get,
    /// Writing the attribute.
    Set,
    /// Clearing the attribute.
    Delete,
}

impl Access {
    /// Name of the violation raised when this access is refused.
    #[must_use]
    pub const fn violation(self) -> &'static str {
        match self {
            Self::Get => "secret",
            Self::Set => "read-only",
            Self::Delete => "protected",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("get"),
            Self::Set => f.write_str("set"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Errors raised by slots, namespaces and class construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassError {
    /// The capability of a slot forbids the attempted access.
    #[error("{} violation: cannot {} '{}'", .access.violation(), .access, .facet)]
    AccessDenied {
        /// The refused operation.
        access: Access,
        /// The facet that was accessed (`value`, `name`, `type`, ...).
        facet: String,
    },

    /// A value's runtime type disagrees with the expected type.
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The expected type.
        expected: String,
        /// The type that was actually supplied.
        found: String,
        /// Where the mismatch happened.
        context: String,
    },

    /// A namespace key already claimed by a slot was assigned again.
    #[error("variable name '{0}' is already assigned to a slot")]
    NamingConflict(String),

    /// A namespace or registry lookup found nothing.
    #[error("key not found: {0}")]
    NotFound(String),

    /// A namespace failed the validity probe.
    #[error("invalid namespace (code {code}): {reason}")]
    InvalidNamespace {
        /// Diagnostic code of the failed probe step.
        code: u8,
        /// Description of the failed step.
        reason: String,
    },

    /// A capability change was attempted without the slot's root token.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A required argument could not be extracted.
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// An integer outside the capability range 0..=3.
    #[error("capability levels range from 0 to 3 inclusive, but received {0}")]
    OutOfRange(i64),

    /// The operation is impossible in the current state.
    #[error("invalid state: {0}")]
    State(String),

    /// A mapping does not implement the requested operation.
    #[error("operation not supported: {0}")]
    Unsupported(String),
}

impl ClassError {
    /// Creates an access violation for the given facet.
    #[must_use]
    pub fn access_denied(access: Access, facet: impl Into<String>) -> Self {
        Self::AccessDenied {
            access,
            facet: facet.into(),
        }
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(
        expected: impl fmt::Display,
        found: impl fmt::Display,
        context: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            context: context.into(),
        }
    }

    /// Returns true if this is a not-found signal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for class and slot operations.
pub type ClassResult<T> = Result<T, ClassError>;
