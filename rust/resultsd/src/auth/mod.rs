//! Email/password authentication provider seam.

mod local;

use crate::error::AuthResult;
use serde::{Deserialize, Serialize};

pub use local::{LocalAuth, MIN_PASSWORD_LEN};

/// An authenticated account as handed out by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: String,
    /// Opaque session token, revoked by sign-out.
    #[serde(skip_serializing)]
    #[serde(default)]
    pub token: String,
}

pub trait AuthProvider: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity>;

    /// Creates the account and returns it signed in.
    fn create_account(&self, email: &str, password: &str) -> AuthResult<Identity>;

    fn sign_out(&self, identity: &Identity) -> AuthResult<()>;
}
