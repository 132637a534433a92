//! Error taxonomy returned by every graph operation.
//!
//! # Invariants
//! - Callers only ever see the five kinds of `ErrorKind`.
//! - Raw `rusqlite` errors are wrapped as `Fatal`, never surfaced bare.
//! - Repositories raise the most specific kind; the service never downgrades it.

use crate::db::DbError;
use crate::model::record::RecordKind;
use crate::model::validation::ValidationError;
use thiserror::Error;
use uuid::Uuid;

pub type GraphResult<T> = Result<T, GraphError>;

/// Coarse classification used by transport layers for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    Fatal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: Uuid },
    #[error("access denied to {kind} {id}")]
    Forbidden { kind: RecordKind, id: Uuid },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Fatal(#[from] DbError),
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Fatal(_) => ErrorKind::Fatal,
        }
    }

    pub(crate) fn not_found(kind: RecordKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }

    pub(crate) fn forbidden(kind: RecordKind, id: Uuid) -> Self {
        Self::Forbidden { kind, id }
    }
}

impl From<rusqlite::Error> for GraphError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Fatal(DbError::Sqlite(value))
    }
}
