use std::fmt;

use thiserror::Error;

/// Why a state-changing operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    AlreadyClosed,
    NoWinner,
    RatingsAlreadyApplied,
    EntriesClosed,
}

impl ConflictKind {
    /// Stable machine-readable name.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyClosed => "already_closed",
            Self::NoWinner => "no_winner",
            Self::RatingsAlreadyApplied => "ratings_already_applied",
            Self::EntriesClosed => "entries_closed",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyClosed => write!(f, "challenge is already closed"),
            Self::NoWinner => write!(f, "challenge has no winner"),
            Self::RatingsAlreadyApplied => write!(f, "ratings were already applied for this challenge"),
            Self::EntriesClosed => write!(f, "challenge is not accepting entries"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    #[error("Concurrent update: {0}")]
    Concurrency(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    /// Serialization failures, deadlocks and lock timeouts. The caller may retry.
    pub fn is_contention(&self) -> bool {
        match self {
            StorageError::Concurrency(_) => true,
            StorageError::Database(e) => is_contention_code(e),
            _ => false,
        }
    }

    pub fn is_conflict(&self, kind: ConflictKind) -> bool {
        matches!(self, StorageError::Conflict(k) if *k == kind)
    }

    /// Folds retryable database failures into `Concurrency` so callers only match one variant.
    pub(crate) fn classify(self) -> Self {
        match self {
            StorageError::Database(e) if is_contention_code(&e) => {
                StorageError::Concurrency(e.to_string())
            }
            other => other,
        }
    }
}

fn is_contention_code(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => {
            matches!(e.code().as_deref(), Some("40001") | Some("40P01") | Some("55P03"))
        }
        _ => false,
    }
}
