//! Unified error type for the bakery ledger.
//!
//! Store failures keep the underlying [`DbErr`] so callers can classify them
//! into the user-facing categories (temporarily unavailable, permission
//! denied) via [`Error::store_failure`].

use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised by the ledger operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Item '{item}' not found in shop '{shop}'")]
    ItemNotFound { shop: String, item: String },

    #[error("Item '{item}' already exists in shop '{shop}'")]
    DuplicateItem { shop: String, item: String },

    #[error("Invalid price: {value}")]
    InvalidPrice { value: String },

    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Import error: {message}")]
    Import { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Coarse classification of a store failure, used to pick the notice shown
/// to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    /// The store could not be reached; retrying later may succeed.
    Unavailable,
    /// The store rejected the operation for lack of permission.
    PermissionDenied,
    /// Any other store error.
    Other,
}

impl Error {
    /// Classifies a database error, returning `None` for non-store errors.
    #[must_use]
    pub fn store_failure(&self) -> Option<StoreFailure> {
        match self {
            Self::Database(err) => Some(classify_db_err(err)),
            _ => None,
        }
    }

    /// Message suitable for an operator-facing notice.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.store_failure() {
            Some(StoreFailure::Unavailable) => {
                "Store temporarily unavailable. Please try again.".to_string()
            }
            Some(StoreFailure::PermissionDenied) => {
                "Permission denied. Please check the store permissions.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

fn classify_db_err(err: &DbErr) -> StoreFailure {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => StoreFailure::Unavailable,
        other => {
            let text = other.to_string().to_lowercase();
            if text.contains("readonly") || text.contains("permission") {
                StoreFailure::PermissionDenied
            } else if text.contains("locked") || text.contains("busy") {
                StoreFailure::Unavailable
            } else {
                StoreFailure::Other
            }
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_connection_errors_are_unavailable() {
        let err = Error::from(DbErr::Conn(RuntimeErr::Internal("refused".to_string())));
        assert_eq!(err.store_failure(), Some(StoreFailure::Unavailable));
        assert!(err.user_message().contains("temporarily unavailable"));
    }

    #[test]
    fn test_readonly_errors_are_permission_denied() {
        let err = Error::from(DbErr::Custom(
            "attempt to write a readonly database".to_string(),
        ));
        assert_eq!(err.store_failure(), Some(StoreFailure::PermissionDenied));
        assert!(err.user_message().starts_with("Permission denied"));
    }

    #[test]
    fn test_non_store_errors_have_no_classification() {
        let err = Error::InvalidDate {
            value: "yesterday".to_string(),
        };
        assert_eq!(err.store_failure(), None);
        assert_eq!(
            err.user_message(),
            "Invalid date 'yesterday', expected YYYY-MM-DD"
        );
    }
}
