//! Error types for roadmap operations.
//!
//! Errors live on two levels:
//!
//! - **`Error`**: infrastructure failures (database, I/O, configuration).
//!   Returned by the store, the config loader and the CLI plumbing.
//! - **`DependencyError`**: business-rule rejections produced while mutating
//!   or querying the dependency graph. The service never lets these escape as
//!   `Err`; it folds them into a [`Response`](crate::Response) so callers can
//!   show the reason directly.
//!
//! ## Error Categorization
//!
//! `ErrorKind` uses a 4xx/5xx style split:
//! - Input problems (caller can fix): self-reference, missing entity,
//!   duplicate, cycle
//! - Internal problems (store failed): persistence

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id_generation::IdGenerationError;
use crate::types::{DependencyId, DependencyKind, EntityRef};

/// Result type for infrastructure operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level infrastructure error.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),

    /// Could not allocate a unique id
    #[error("id generation failed: {0}")]
    IdGeneration(#[from] IdGenerationError),

    /// A requested row does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Invariant violation inside the crate (poisoned lock, corrupt row)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Which end of a candidate edge failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The `from` side.
    Source,
    /// The `to` side.
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("Source"),
            Self::Target => f.write_str("Target"),
        }
    }
}

/// A rejected dependency operation.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// `from` and `to` are the same entity.
    #[error("Cannot create a dependency from an entity to itself")]
    SelfReference,

    /// One or both endpoints do not resolve to a live entity.
    #[error("{}", missing_messages(.0).join("; "))]
    MissingEntities(Vec<(Endpoint, EntityRef)>),

    /// No dependency with this id.
    #[error("Dependency '{0}' not found")]
    DependencyNotFound(DependencyId),

    /// An edge with the same `(from, to, kind)` already exists.
    #[error("Dependency already exists: {from} → {to} ({kind})")]
    Duplicate {
        /// Source of the existing edge.
        from: EntityRef,
        /// Target of the existing edge.
        to: EntityRef,
        /// Kind of the existing edge.
        kind: DependencyKind,
    },

    /// Adding the edge would close a loop. `path` starts and ends at the
    /// candidate's source.
    #[error("Cannot create dependency: it would create a cycle ({})", .path.join(" → "))]
    Cycle {
        /// Display labels along the loop.
        path: Vec<String>,
    },

    /// The store failed; the transaction was rolled back.
    #[error("Failed to persist dependency change: {0}")]
    Store(#[from] Error),
}

impl DependencyError {
    /// Category of this rejection.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SelfReference => ErrorKind::SelfReference,
            Self::MissingEntities(_) | Self::DependencyNotFound(_) => ErrorKind::NotFound,
            Self::Duplicate { .. } => ErrorKind::Duplicate,
            Self::Cycle { .. } => ErrorKind::Cycle,
            Self::Store(_) => ErrorKind::Persistence,
        }
    }

    /// Human-readable messages, one per distinct problem.
    ///
    /// `MissingEntities` yields one message per failing side; everything
    /// else yields exactly one.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::MissingEntities(missing) => missing_messages(missing),
            other => vec![other.to_string()],
        }
    }
}

fn missing_messages(missing: &[(Endpoint, EntityRef)]) -> Vec<String> {
    missing
        .iter()
        .map(|(side, entity)| format!("{side} {} '{}' does not exist", entity.kind, entity.id))
        .collect()
}

/// Category of a [`DependencyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // === Input Problems (analogous to HTTP 4xx) ===
    /// Edge from an entity to itself
    SelfReference,

    /// Entity or dependency id does not exist
    NotFound,

    /// Same `(from, to, kind)` already stored
    Duplicate,

    /// Edge would close a loop
    Cycle,

    // === Internal Problems (analogous to HTTP 5xx) ===
    /// Store rejected the write
    Persistence,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReference => write!(f, "self reference"),
            Self::NotFound => write!(f, "not found"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Cycle => write!(f, "cycle"),
            Self::Persistence => write!(f, "persistence"),
        }
    }
}

impl ErrorKind {
    /// Returns `true` if this is an input problem (4xx-style).
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        !self.is_internal_error()
    }

    /// Returns `true` if this is an internal problem (5xx-style).
    #[must_use]
    pub fn is_internal_error(&self) -> bool {
        matches!(self, Self::Persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_categorization() {
        assert!(ErrorKind::SelfReference.is_input_error());
        assert!(ErrorKind::NotFound.is_input_error());
        assert!(ErrorKind::Duplicate.is_input_error());
        assert!(ErrorKind::Cycle.is_input_error());
        assert!(!ErrorKind::Cycle.is_internal_error());

        assert!(ErrorKind::Persistence.is_internal_error());
        assert!(!ErrorKind::Persistence.is_input_error());
    }

    #[test]
    fn missing_entities_yields_one_message_per_side() {
        let error = DependencyError::MissingEntities(vec![
            (Endpoint::Source, EntityRef::project("p1")),
            (Endpoint::Target, EntityRef::task("t9")),
        ]);

        let messages = error.messages();
        assert_eq!(
            messages,
            vec![
                "Source project 'p1' does not exist".to_string(),
                "Target task 't9' does not exist".to_string(),
            ]
        );
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn cycle_message_contains_word_and_path() {
        let error = DependencyError::Cycle {
            path: vec!["Gamma".into(), "Alpha".into(), "Beta".into(), "Gamma".into()],
        };

        let message = error.to_string();
        assert!(message.contains("cycle"));
        assert!(message.contains("Gamma → Alpha → Beta → Gamma"));
    }

    #[test]
    fn store_errors_are_persistence() {
        let error = DependencyError::from(Error::Internal("boom".into()));
        assert_eq!(error.kind(), ErrorKind::Persistence);
        assert!(error.to_string().contains("boom"));
    }
}
