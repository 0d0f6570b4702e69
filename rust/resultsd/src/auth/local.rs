use super::{AuthProvider, Identity};
use crate::db;
use crate::error::{AuthError, AuthResult};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Accounts kept in the workspace database.
pub struct LocalAuth {
    conn: Mutex<Connection>,
}

impl LocalAuth {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            conn: Mutex::new(db::open_db(workspace)?),
        })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self {
            conn: Mutex::new(db::open_memory()?),
        })
    }

    fn issue_token(conn: &Connection, uid: &str) -> AuthResult<String> {
        let token = Uuid::new_v4().simple().to_string();
        conn.execute(
            "INSERT INTO auth_tokens(token, uid, issued_at) VALUES(?, ?, ?)",
            (&token, uid, chrono::Utc::now().to_rfc3339()),
        )?;
        Ok(token)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn validate_email(email: &str) -> AuthResult<()> {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AuthError::InvalidEmail);
    };
    if local.is_empty() || domain.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(())
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

impl AuthProvider for LocalAuth {
    fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let email = email.trim();
        validate_email(email)?;
        let conn = self.conn.lock();
        let row: Option<(String, String, String, String)> = conn
            .query_row(
                "SELECT uid, email, password_salt, password_hash FROM accounts WHERE email_norm = ?",
                [normalize_email(email)],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .optional()?;
        let Some((uid, stored_email, salt, hash)) = row else {
            return Err(AuthError::UserNotFound);
        };
        if hash_password(&salt, password) != hash {
            debug!(uid = %uid, "password mismatch");
            return Err(AuthError::WrongPassword);
        }
        conn.execute(
            "UPDATE accounts SET last_sign_in_at = ? WHERE uid = ?",
            (chrono::Utc::now().to_rfc3339(), &uid),
        )?;
        let token = Self::issue_token(&conn, &uid)?;
        info!(uid = %uid, "signed in");
        Ok(Identity {
            uid,
            email: stored_email,
            token,
        })
    }

    fn create_account(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let email = email.trim();
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min_len: MIN_PASSWORD_LEN,
            });
        }
        let conn = self.conn.lock();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM accounts WHERE email_norm = ?",
                [normalize_email(email)],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let uid = Uuid::new_v4().simple().to_string();
        let salt = Uuid::new_v4().simple().to_string();
        conn.execute(
            "INSERT INTO accounts(uid, email, email_norm, password_salt, password_hash, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &uid,
                email,
                normalize_email(email),
                &salt,
                hash_password(&salt, password),
                chrono::Utc::now().to_rfc3339(),
            ),
        )?;
        let token = Self::issue_token(&conn, &uid)?;
        info!(uid = %uid, "account created");
        Ok(Identity {
            uid,
            email: email.to_string(),
            token,
        })
    }

    fn sign_out(&self, identity: &Identity) -> AuthResult<()> {
        let conn = self.conn.lock();
        let n = conn.execute(
            "DELETE FROM auth_tokens WHERE token = ? AND uid = ?",
            (&identity.token, &identity.uid),
        )?;
        if n == 0 {
            return Err(AuthError::InvalidToken);
        }
        info!(uid = %identity.uid, "signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_sign_in() {
        let auth = LocalAuth::open_in_memory().expect("open");
        let created = auth
            .create_account("T.Smith@School.org", "secret1")
            .expect("create");
        let again = auth
            .sign_in("t.smith@school.org", "secret1")
            .expect("sign in");
        assert_eq!(created.uid, again.uid);
        assert_eq!(again.email, "T.Smith@School.org");
        assert_ne!(created.token, again.token);
    }

    #[test]
    fn provider_error_codes() {
        let auth = LocalAuth::open_in_memory().expect("open");
        assert_eq!(
            auth.create_account("nope", "secret1").unwrap_err().code(),
            "auth/invalid-email"
        );
        assert_eq!(
            auth.create_account("a@b.c", "12345").unwrap_err().code(),
            "auth/weak-password"
        );
        auth.create_account("a@b.c", "123456").expect("create");
        assert_eq!(
            auth.create_account("A@B.C", "123456").unwrap_err().code(),
            "auth/email-already-in-use"
        );
        assert_eq!(
            auth.sign_in("x@b.c", "123456").unwrap_err().code(),
            "auth/user-not-found"
        );
        assert_eq!(
            auth.sign_in("a@b.c", "654321").unwrap_err().code(),
            "auth/wrong-password"
        );
    }

    #[test]
    fn sign_out_revokes_token_once() {
        let auth = LocalAuth::open_in_memory().expect("open");
        let who = auth.create_account("a@b.c", "123456").expect("create");
        auth.sign_out(&who).expect("sign out");
        assert_eq!(auth.sign_out(&who).unwrap_err().code(), "auth/invalid-token");
    }

    #[test]
    fn salted_hashes_differ() {
        assert_ne!(hash_password("s1", "pw"), hash_password("s2", "pw"));
        assert_eq!(hash_password("s1", "pw").len(), 64);
    }
}
