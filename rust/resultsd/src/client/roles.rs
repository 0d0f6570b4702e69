use super::ResultsClient;
use crate::store::DbPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

/// Record stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub created_at: Option<i64>,
}

fn user_path(uid: &str) -> Option<DbPath> {
    DbPath::parse("users").and_then(|p| p.child(uid)).ok()
}

impl ResultsClient {
    /// Role stored for `uid`. `None` for a missing uid, record or role, or an
    /// unrecognized role value.
    pub fn get_role(&self, uid: Option<&str>) -> Option<Role> {
        let path = user_path(uid?)?.child("role").ok()?;
        let value = self.guarded("get", &path, |s| s.get(&path)).ok()?;
        match value {
            Value::String(s) => match s.parse() {
                Ok(role) => Some(role),
                Err(e) => {
                    warn!(path = %path, error = %e, "ignoring role");
                    None
                }
            },
            _ => None,
        }
    }

    /// Checks `uid`, or the signed-in user when `uid` is `None`.
    pub fn is_admin(&self, uid: Option<&str>) -> bool {
        self.role_of(uid) == Some(Role::Admin)
    }

    /// Checks `uid`, or the signed-in user when `uid` is `None`.
    pub fn is_teacher(&self, uid: Option<&str>) -> bool {
        self.role_of(uid) == Some(Role::Teacher)
    }

    fn role_of(&self, uid: Option<&str>) -> Option<Role> {
        match uid {
            Some(uid) => self.get_role(Some(uid)),
            None => {
                let current = self.current_user()?;
                self.get_role(Some(&current.uid))
            }
        }
    }

    pub fn get_user_record(&self, uid: &str) -> Option<UserRecord> {
        let path = user_path(uid)?;
        let value = self.guarded("get", &path, |s| s.get(&path)).ok()?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path, error = %e, "malformed user record");
                None
            }
        }
    }
}
