/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware. Authenticated routes go through
/// `session_auth_layer`, which validates the session token and injects a
/// [`Caller`] into request extensions so every handler receives the caller
/// identity explicitly.
use crate::config::Config;
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use parley_shared::auth::{jwt, Caller};
use parley_shared::mailer::Mailer;
use parley_shared::storage::AvatarStore;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request handler via Axum's `State` extractor; Arc internally so
/// clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Confirmation-email dispatch seam
    pub mailer: Arc<dyn Mailer>,

    /// Avatar blob storage seam
    pub avatars: Arc<dyn AvatarStore>,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        db: PgPool,
        config: Config,
        mailer: Arc<dyn Mailer>,
        avatars: Arc<dyn AvatarStore>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
            avatars,
        }
    }

    /// Secret used for session token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── /health                              # Health check (public)
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /signup                 # Create account (public)
///     │   └── POST /login                  # Obtain session token (public)
///     └── /profile                         # All authenticated
///         ├── GET    /                     # Own profile
///         ├── PUT    /                     # Update own profile (whitelisted)
///         ├── DELETE /avatar               # Remove avatar (idempotent)
///         ├── POST   /resend_confirmation  # Always reports success
///         ├── POST   /availability         # Strict membership lookup
///         ├── POST   /auto_offline         # Strict membership lookup
///         └── POST   /set_active_account   # Tolerant membership lookup
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public: no session required
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login));

    // Everything under /profile requires a valid session
    let profile_routes = Router::new()
        .route("/", get(routes::profile::show_profile))
        .route("/", put(routes::profile::update_profile))
        .route("/avatar", delete(routes::profile::delete_avatar))
        .route(
            "/resend_confirmation",
            post(routes::profile::resend_confirmation),
        )
        .route("/availability", post(routes::presence::set_availability))
        .route("/auto_offline", post(routes::presence::set_auto_offline))
        .route(
            "/set_active_account",
            post(routes::presence::set_active_account),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/profile", profile_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Session authentication middleware
///
/// Validates the Bearer session token from the Authorization header and
/// injects a [`Caller`] into request extensions. Operations behind this layer
/// never see a request without a resolved caller identity.
async fn session_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(Caller::from_claims(&claims));

    Ok(next.run(req).await)
}
