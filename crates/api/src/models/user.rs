//! User domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stepup_core::{Email, UserId, UserRole};

/// A registered account.
///
/// The password hash is kept for login checks and never leaves the server.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized login email.
    pub email: Email,
    /// Argon2id PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Customer or admin.
    pub role: UserRole,
    /// Display name.
    pub name: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: UserId::generate(),
            email: Email::parse("sari@example.com").unwrap(),
            password_hash: "$argon2id$v=19$secret".to_owned(),
            role: UserRole::Customer,
            name: "Sari".to_owned(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "sari@example.com");
        assert_eq!(json["role"], "customer");
    }
}
