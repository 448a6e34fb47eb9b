/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Create an account and get a session token
/// - `POST /v1/auth/login` - Exchange credentials for a session token
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Json};
use parley_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (policy-checked)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Optional full name
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    /// Optional display name
    #[validate(length(max = 255, message = "Display name must be at most 255 characters"))]
    pub display_name: Option<String>,
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// User ID
    pub user_id: String,

    /// Session token
    pub access_token: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: String,

    /// Session token
    pub access_token: String,
}

/// Maps `validator` derive failures to the field-scoped error shape
fn validation_details(e: validator::ValidationErrors) -> ApiError {
    let errors: Vec<ValidationErrorDetail> = e
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    ApiError::ValidationError(errors)
}

/// Creates a new user account
///
/// The new user starts unconfirmed; confirmation instructions are dispatched
/// on signup and can be re-requested through the profile surface. Account
/// memberships are provisioned elsewhere when the user is invited into an
/// account.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: validation failed
/// - `409 Conflict`: email already exists
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Json<SignupResponse>> {
    req.validate().map_err(validation_details)?;

    password::validate_password_strength(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail::new("password", message)])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            name: req.name,
            display_name: req.display_name,
        },
    )
    .await?;

    if let Err(e) = state
        .mailer
        .send_confirmation(&user.email, user.name.as_deref())
        .await
    {
        tracing::warn!(email = %user.email, error = %e, "Confirmation dispatch failed on signup");
    }

    let claims = jwt::Claims::new(user.id);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(SignupResponse {
        user_id: user.id.to_string(),
        access_token,
    }))
}

/// Exchanges credentials for a session token
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password (indistinguishable
///   by design)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(validation_details)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let claims = jwt::Claims::new(user.id);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(LoginResponse {
        user_id: user.id.to_string(),
        access_token,
    }))
}
