use super::roles::Role;
use super::ResultsClient;
use crate::auth::Identity;
use crate::error::AuthError;
use crate::store::{server_timestamp, DbPath};
use crate::subscription::Subscription;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

/// Result of a sign-in, sign-up or sign-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthOutcome {
    fn ok(user: Option<Identity>) -> Self {
        Self {
            success: true,
            user,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            user: None,
            error: Some(error.into()),
        }
    }
}

/// Profile fields written to `users/{uid}` on sign-up.
#[derive(Debug, Clone)]
pub struct SignUpProfile {
    pub name: String,
    pub role: Role,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

impl AuthEvent {
    pub fn user(&self) -> Option<&Identity> {
        match self {
            AuthEvent::SignedIn(id) => Some(id),
            AuthEvent::SignedOut => None,
        }
    }
}

impl ResultsClient {
    pub fn sign_in(&self, email: &str, password: &str) -> AuthOutcome {
        match self.auth.sign_in(email, password) {
            Ok(identity) => {
                self.set_current(Some(identity.clone()));
                AuthOutcome::ok(Some(identity))
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                AuthOutcome::failed(e.to_string())
            }
        }
    }

    /// Creates the account, then writes its user record. A failed record
    /// write is reported as failure but the account stays created and
    /// signed in.
    pub fn sign_up(&self, email: &str, password: &str, profile: &SignUpProfile) -> AuthOutcome {
        let identity = match self.auth.create_account(email, password) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "sign-up failed");
                return AuthOutcome::failed(e.to_string());
            }
        };
        self.set_current(Some(identity.clone()));

        let record = json!({
            "email": identity.email,
            "name": profile.name,
            "role": profile.role,
            "department": profile.department,
            "createdAt": server_timestamp(),
        });
        let written = DbPath::parse("users")
            .and_then(|users| users.child(&identity.uid))
            .map_err(|e| e.to_string())
            .and_then(|path| self.guarded("set", &path, |s| s.set(&path, record)));
        match written {
            Ok(()) => {
                info!(uid = %identity.uid, role = %profile.role, "user record created");
                AuthOutcome::ok(Some(identity))
            }
            Err(e) => {
                warn!(uid = %identity.uid, error = %e, "account created but user record write failed");
                AuthOutcome::failed(format!("user record not saved: {e}"))
            }
        }
    }

    /// Signing out with nobody signed in is a no-op success.
    pub fn sign_out(&self) -> AuthOutcome {
        let Some(identity) = self.current_user() else {
            return AuthOutcome::ok(None);
        };
        match self.auth.sign_out(&identity) {
            Ok(()) | Err(AuthError::InvalidToken) => {
                self.swap_current(None);
                AuthOutcome::ok(None)
            }
            Err(e) => {
                warn!(error = %e, "sign-out failed");
                AuthOutcome::failed(e.to_string())
            }
        }
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.current.read().clone()
    }

    /// Registers `observer` and calls it right away with the current state.
    pub fn on_auth_state_changed(
        &self,
        observer: impl Fn(&AuthEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let sub = self.auth_observers.subscribe(observer);
        self.auth_observers.emit_to(sub.id(), &self.current_event());
        sub
    }

    fn current_event(&self) -> AuthEvent {
        match self.current_user() {
            Some(id) => AuthEvent::SignedIn(id),
            None => AuthEvent::SignedOut,
        }
    }

    /// Makes `next` current and revokes the token of the identity it
    /// replaces.
    pub(super) fn set_current(&self, next: Option<Identity>) {
        if let Some(prev) = self.swap_current(next) {
            self.revoke(&prev);
        }
    }

    fn swap_current(&self, next: Option<Identity>) -> Option<Identity> {
        let prev = std::mem::replace(&mut *self.current.write(), next);
        // Emit after the write lock is released so observers can read it.
        self.auth_observers.emit(&self.current_event());
        prev
    }

    /// Best-effort token revocation. An already revoked token is fine.
    pub(super) fn revoke(&self, identity: &Identity) {
        match self.auth.sign_out(identity) {
            Ok(()) | Err(AuthError::InvalidToken) => {}
            Err(e) => warn!(uid = %identity.uid, error = %e, "token revocation failed"),
        }
    }
}
