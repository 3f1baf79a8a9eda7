use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::Role;

/// Fixed id of the bootstrap administrator.
pub const ADMIN_ID: &str = "admin";
/// Fixed username of the bootstrap administrator.
pub const ADMIN_USERNAME: &str = "admin";
/// Credential the bootstrap administrator is created with.
pub const DEFAULT_ADMIN_SECRET: &str = "admin123";

/// A login credential record.
///
/// `secret` is stored and compared in plaintext. This mirrors the hosted
/// store's existing rows and is not a hardened credential scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub secret: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// The administrator record inserted when the store has none.
    pub fn default_admin() -> Self {
        Self {
            id: ADMIN_ID.to_string(),
            username: ADMIN_USERNAME.to_string(),
            secret: DEFAULT_ADMIN_SECRET.to_string(),
            role: Role::Admin,
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.username, self.role, self.id)
    }
}

/// Candidate for a new credential record.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Id to use; a fresh UUID is generated when absent.
    pub id: Option<String>,
    pub username: String,
    pub secret: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(username: impl Into<String>, secret: impl Into<String>, role: Role) -> Self {
        Self {
            id: None,
            username: username.into(),
            secret: secret.into(),
            role,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_admin() {
        let admin = User::default_admin();
        assert_eq!(admin.id, "admin");
        assert_eq!(admin.username, "admin");
        assert!(admin.is_admin());
        assert!(admin.created_at.is_some());
    }

    #[test]
    fn test_user_without_created_at_deserializes() {
        let json = r#"{"id":"u1","username":"alice","secret":"p1","role":"staff"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.role, Role::Staff);
        assert!(user.created_at.is_none());
    }

    #[test]
    fn test_new_user_with_id() {
        let candidate = NewUser::new("Bob", "p2", Role::Staff).with_id("42");
        assert_eq!(candidate.id.as_deref(), Some("42"));
        assert_eq!(candidate.username, "Bob");
    }
}
