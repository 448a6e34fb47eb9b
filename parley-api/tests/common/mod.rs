/// Common test utilities for integration tests
///
/// Provides a `TestContext` wired with a recording mailer and an in-memory
/// avatar store. Tests that need a live database call [`TestContext::try_new`]
/// and skip themselves when `TEST_DATABASE_URL` is unset; tests that only
/// exercise validation and auth failures use [`TestContext::detached`], which
/// never opens a connection.
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use parley_api::app::{build_router, AppState};
use parley_api::config::{ApiConfig, Config, JwtConfig};
use parley_shared::auth::jwt::{create_token, Claims};
use parley_shared::db::pool::DatabaseConfig;
use parley_shared::mailer::RecordingMailer;
use parley_shared::models::account_user::{AccountUser, CreateAccountUser};
use parley_shared::models::user::{CreateUser, User};
use parley_shared::storage::InMemoryAvatarStore;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;
use tower::Service as _;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context wrapping the router and its collaborator doubles
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub mailer: Arc<RecordingMailer>,
    pub avatars: Arc<InMemoryAvatarStore>,
}

fn test_config(database_url: &str) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: database_url.to_string(),
            ..Default::default()
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        avatar_storage_dir: PathBuf::from("/tmp/parley-test-avatars"),
    }
}

fn build_context(db: PgPool, config: Config) -> TestContext {
    let mailer = Arc::new(RecordingMailer::new());
    let avatars = Arc::new(InMemoryAvatarStore::new());
    let state = AppState::new(db.clone(), config, mailer.clone(), avatars.clone());
    let app = build_router(state);

    TestContext {
        db,
        app,
        mailer,
        avatars,
    }
}

impl TestContext {
    /// Creates a context against a live test database
    ///
    /// Returns None (after printing a notice) when `TEST_DATABASE_URL` is
    /// unset, so DB-backed tests skip instead of failing on machines without
    /// Postgres.
    pub async fn try_new() -> anyhow::Result<Option<Self>> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping database-backed test");
            return Ok(None);
        };

        let db = PgPool::connect(&url).await?;
        sqlx::migrate!("../migrations").run(&db).await?;

        Ok(Some(build_context(db, test_config(&url))))
    }

    /// Creates a context whose pool never connects
    ///
    /// Usable for requests that are rejected before any query runs (missing
    /// auth, validation failures).
    pub fn detached() -> Self {
        let url = "postgresql://127.0.0.1:1/parley_detached";
        let db = PgPool::connect_lazy(url).expect("lazy pool should parse URL");
        build_context(db, test_config(url))
    }

    /// Creates a user with a unique email and returns it with a session token
    pub async fn create_user(&self) -> anyhow::Result<(User, String)> {
        let user = User::create(
            &self.db,
            CreateUser {
                email: format!("agent-{}@example.com", Uuid::new_v4()),
                password_hash: parley_shared::auth::password::hash_password("Passw0rd!")?,
                name: Some("Test Agent".to_string()),
                display_name: None,
            },
        )
        .await?;

        let token = create_token(&Claims::new(user.id), JWT_SECRET)?;
        Ok((user, token))
    }

    /// Adds the user to a fresh account and returns the account id
    pub async fn create_membership(&self, user: &User) -> anyhow::Result<Uuid> {
        let account_id = Uuid::new_v4();
        AccountUser::create(
            &self.db,
            CreateAccountUser {
                account_id,
                user_id: user.id,
            },
        )
        .await?;
        Ok(account_id)
    }

    /// Dispatches a request through the router and parses the JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().call(request).await.expect("infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should collect");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, json)
    }
}

/// Builds a JSON request, optionally authenticated
pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };

    builder.body(body).expect("request should build")
}
