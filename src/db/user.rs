//! User model for gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::datetime::parse_db_timestamp;

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique user ID.
    pub id: Uuid,
    /// User name (unique, case-sensitive).
    pub name: String,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row type for a user from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            created_at: parse_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// User name.
    pub name: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Create a new user registered at `created_at`.
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_row() {
        let id = Uuid::new_v4();
        let row = UserRow {
            id,
            name: "kahya".to_string(),
            created_at: "2024-01-15T10:30:00.000000Z".to_string(),
            updated_at: "2024-01-15 10:31:00".to_string(),
        };
        let user = User::from(row);
        assert_eq!(user.id, id);
        assert_eq!(user.name, "kahya");
        assert_eq!(user.created_at.to_rfc3339(), "2024-01-15T10:30:00+00:00");
        assert_eq!(user.updated_at.to_rfc3339(), "2024-01-15T10:31:00+00:00");
    }

    #[test]
    fn test_new_user() {
        let now = Utc::now();
        let user = NewUser::new("holgith", now);
        assert_eq!(user.name, "holgith");
        assert_eq!(user.created_at, now);
    }
}
