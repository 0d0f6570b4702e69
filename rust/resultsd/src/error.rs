//! Error types for the store and auth collaborators.

use thiserror::Error;

/// Result type for data store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a [`DataStore`](crate::store::DataStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Path has an empty or illegal segment.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A key inside a written value is not storable.
    #[error("invalid key {key:?} at {path:?}")]
    InvalidKey { path: String, key: String },

    /// The store has been closed.
    #[error("store closed")]
    Closed,

    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored document could not be (de)serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Stable code used in IPC envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidPath { .. } => "invalid_path",
            StoreError::InvalidKey { .. } => "invalid_key",
            StoreError::Closed => "store_closed",
            StoreError::Sqlite(_) => "db_query_failed",
            StoreError::Json(_) => "bad_json",
        }
    }

    /// True when the failure says something about the connection rather than
    /// the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, StoreError::Closed | StoreError::Sqlite(_))
    }
}

/// Result type for auth provider operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors raised by an [`AuthProvider`](crate::auth::AuthProvider).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth/invalid-email: the email address is badly formatted")]
    InvalidEmail,

    #[error("auth/weak-password: password should be at least {min_len} characters")]
    WeakPassword { min_len: usize },

    #[error("auth/email-already-in-use: the email address is already in use by another account")]
    EmailInUse,

    #[error("auth/user-not-found: there is no user record corresponding to this identifier")]
    UserNotFound,

    #[error("auth/wrong-password: the password is invalid")]
    WrongPassword,

    #[error("auth/invalid-token: the session token is not recognized")]
    InvalidToken,

    #[error("auth/internal-error: {0}")]
    Backend(#[from] rusqlite::Error),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidEmail => "auth/invalid-email",
            AuthError::WeakPassword { .. } => "auth/weak-password",
            AuthError::EmailInUse => "auth/email-already-in-use",
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::InvalidToken => "auth/invalid-token",
            AuthError::Backend(_) => "auth/internal-error",
        }
    }
}
