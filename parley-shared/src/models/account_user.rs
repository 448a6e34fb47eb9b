/// AccountUser model and database operations
///
/// This module provides the per-(account, user) membership record carrying
/// presence state. Chat routing elsewhere in the platform reads these rows to
/// decide whether an agent can take conversations for an account.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE availability_status AS ENUM ('online', 'offline', 'busy');
///
/// CREATE TABLE account_users (
///     account_id UUID NOT NULL,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     availability availability_status NOT NULL DEFAULT 'offline',
///     auto_offline BOOLEAN NOT NULL DEFAULT TRUE,
///     active_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (account_id, user_id)
/// );
/// ```
///
/// Exactly one row exists per (account, user) pair. The presence mutators
/// never create rows: they are `UPDATE ... RETURNING` statements that yield
/// `None` when the membership is absent, and callers decide whether absence
/// is an error or a tolerated condition.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Agent availability within an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "availability_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// Accepting new conversations
    Online,

    /// Not accepting conversations
    Offline,

    /// Signed in but not taking new conversations
    Busy,
}

impl Availability {
    /// Converts the availability to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Online => "online",
            Availability::Offline => "offline",
            Availability::Busy => "busy",
        }
    }
}

/// Membership record linking a user to an account with presence state
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountUser {
    /// Account ID
    pub account_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Current availability within the account
    pub availability: Availability,

    /// Whether the agent is automatically marked offline when idle
    pub auto_offline: bool,

    /// Last-seen marker, stamped when the user switches to this account
    pub active_at: Option<DateTime<Utc>>,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountUser {
    /// Account ID
    pub account_id: Uuid,

    /// User ID
    pub user_id: Uuid,
}

impl AccountUser {
    /// Creates a new membership (adds a user to an account)
    ///
    /// New members start offline with `auto_offline` enabled, per account
    /// policy defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair already exists (unique constraint), the
    /// user doesn't exist (foreign key), or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateAccountUser) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, AccountUser>(
            r#"
            INSERT INTO account_users (account_id, user_id)
            VALUES ($1, $2)
            RETURNING account_id, user_id, availability, auto_offline, active_at, created_at
            "#,
        )
        .bind(data.account_id)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds the membership for an (account, user) pair
    pub async fn find(
        pool: &PgPool,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, AccountUser>(
            r#"
            SELECT account_id, user_id, availability, auto_offline, active_at, created_at
            FROM account_users
            WHERE account_id = $1 AND user_id = $2
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Lists all memberships for a user
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, AccountUser>(
            r#"
            SELECT account_id, user_id, availability, auto_offline, active_at, created_at
            FROM account_users
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Overwrites the availability for an existing membership
    ///
    /// Any availability is reachable from any other; there is no transition
    /// table.
    ///
    /// # Returns
    ///
    /// The updated membership, or None when the pair has no row. Never
    /// creates a row.
    pub async fn set_availability(
        pool: &PgPool,
        account_id: Uuid,
        user_id: Uuid,
        availability: Availability,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, AccountUser>(
            r#"
            UPDATE account_users
            SET availability = $3
            WHERE account_id = $1 AND user_id = $2
            RETURNING account_id, user_id, availability, auto_offline, active_at, created_at
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .bind(availability)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Overwrites the auto-offline flag for an existing membership
    ///
    /// # Returns
    ///
    /// The updated membership, or None when the pair has no row. Never
    /// creates a row.
    pub async fn set_auto_offline(
        pool: &PgPool,
        account_id: Uuid,
        user_id: Uuid,
        auto_offline: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, AccountUser>(
            r#"
            UPDATE account_users
            SET auto_offline = $3
            WHERE account_id = $1 AND user_id = $2
            RETURNING account_id, user_id, availability, auto_offline, active_at, created_at
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .bind(auto_offline)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Stamps `active_at` with the current time
    ///
    /// Called when the user switches to the account in their session.
    ///
    /// # Returns
    ///
    /// The updated membership, or None when the pair has no row. Never
    /// creates a row.
    pub async fn touch_active_at(
        pool: &PgPool,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, AccountUser>(
            r#"
            UPDATE account_users
            SET active_at = NOW()
            WHERE account_id = $1 AND user_id = $2
            RETURNING account_id, user_id, availability, auto_offline, active_at, created_at
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }
}
