/// User model and database operations
///
/// This module provides the User identity record and the operations the
/// profile-update flow needs. Users belong to accounts through the
/// AccountUser model.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(255),
///     display_name VARCHAR(255),
///     avatar_key VARCHAR(512),
///     confirmed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     groq_token TEXT NOT NULL DEFAULT '',
///     wavoip_token TEXT NOT NULL DEFAULT ''
/// );
/// ```
///
/// The token columns default to the empty string and are never null; an
/// empty token means "not configured".
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, name, display_name, avatar_key, \
     groq_token, wavoip_token, confirmed_at, created_at, updated_at";

/// User identity record
///
/// Passwords are stored as Argon2id hashes, never in plaintext, and the hash
/// is never serialized into API responses (see [`UserView`]).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address (case-insensitive via CITEXT, unique)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Full name
    pub name: Option<String>,

    /// Name shown to contacts in conversations
    pub display_name: Option<String>,

    /// Key of the avatar blob in the avatar store, if one is attached
    pub avatar_key: Option<String>,

    /// Speech-to-text API token, empty when not configured
    pub groq_token: String,

    /// Voice-over-IP API token, empty when not configured
    pub wavoip_token: String,

    /// When the email address was confirmed (None while unconfirmed)
    pub confirmed_at: Option<DateTime<Utc>>,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Outward representation of a user, safe to return to API callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub avatar_key: Option<String>,
    pub groq_token: String,
    pub wavoip_token: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            display_name: user.display_name,
            avatar_key: user.avatar_key,
            groq_token: user.groq_token,
            wavoip_token: user.wavoip_token,
            confirmed: user.confirmed_at.is_some(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (stored case-insensitively via CITEXT)
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Optional full name
    pub name: Option<String>,

    /// Optional display name
    pub display_name: Option<String>,
}

/// A validated, whitelist-filtered set of profile changes
///
/// Built by the profile-update boundary after whitelist filtering and
/// validation. Every populated field is applied in a single UPDATE statement,
/// so either all of them commit or none do.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    /// `Some(None)` clears the column
    pub name: Option<Option<String>>,

    /// `Some(None)` clears the column
    pub display_name: Option<Option<String>>,

    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub avatar_key: Option<String>,
    pub groq_token: Option<String>,
    pub wavoip_token: Option<String>,
}

impl ProfileChanges {
    /// True when no field is populated
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.display_name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.avatar_key.is_none()
            && self.groq_token.is_none()
            && self.wavoip_token.is_none()
    }
}

impl User {
    /// Whether the email address has been confirmed
    pub fn confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint
    /// violation) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, display_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.name)
        .bind(data.display_name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Applies a set of profile changes as one UPDATE statement
    ///
    /// Only populated fields are written; `updated_at` is always refreshed.
    /// Nullable columns populated with `Some(None)` are written as NULL,
    /// clearing them.
    /// Because every field lands in the same statement, a failing change
    /// (e.g. an email unique-constraint violation) leaves the row untouched.
    ///
    /// # Returns
    ///
    /// The updated user, or None if no user with `id` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the new email is already taken by another user or
    /// the database connection fails.
    pub async fn apply_profile(
        pool: &PgPool,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the statement based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        let mut push_column = |column: &str, present: bool| {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {column} = ${bind_count}"));
            }
        };

        push_column("name", changes.name.is_some());
        push_column("display_name", changes.display_name.is_some());
        push_column("email", changes.email.is_some());
        push_column("password_hash", changes.password_hash.is_some());
        push_column("avatar_key", changes.avatar_key.is_some());
        push_column("groq_token", changes.groq_token.is_some());
        push_column("wavoip_token", changes.wavoip_token.is_some());

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = changes.name {
            q = q.bind(name);
        }
        if let Some(display_name) = changes.display_name {
            q = q.bind(display_name);
        }
        if let Some(email) = changes.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = changes.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(avatar_key) = changes.avatar_key {
            q = q.bind(avatar_key);
        }
        if let Some(groq_token) = changes.groq_token {
            q = q.bind(groq_token);
        }
        if let Some(wavoip_token) = changes.wavoip_token {
            q = q.bind(wavoip_token);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Detaches the avatar by clearing `avatar_key`
    ///
    /// The caller is responsible for deleting the blob from the avatar store
    /// before clearing the key. No-op (still returns the row) when no avatar
    /// is attached.
    pub async fn clear_avatar(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET avatar_key = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Marks the user's email address as confirmed
    ///
    /// Idempotent: a second call leaves the original confirmation timestamp
    /// in place.
    ///
    /// # Returns
    ///
    /// True if the user was newly confirmed, false if already confirmed or
    /// the user doesn't exist.
    pub async fn confirm(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET confirmed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND confirmed_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_changes_default_is_empty() {
        let changes = ProfileChanges::default();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_profile_changes_with_field_is_not_empty() {
        let changes = ProfileChanges {
            display_name: Some(Some("Support Team".to_string())),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_profile_changes_clear_is_not_empty() {
        let changes = ProfileChanges {
            name: Some(None),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_user_view_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "agent@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: Some("Agent".to_string()),
            display_name: None,
            avatar_key: None,
            groq_token: String::new(),
            wavoip_token: String::new(),
            confirmed_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let view = UserView::from(user);
        assert!(view.confirmed);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "agent@example.com");
    }

    #[test]
    fn test_user_serialization_skips_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "agent@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: None,
            display_name: None,
            avatar_key: None,
            groq_token: "tok".to_string(),
            wavoip_token: String::new(),
            confirmed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    // Integration tests for database operations live in the API crate's
    // integration suite, which exercises these through the HTTP surface.
}
