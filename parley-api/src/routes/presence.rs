/// Presence endpoints
///
/// A thin update surface over the caller's membership rows, used by chat
/// routing to decide whether an agent is reachable for an account.
///
/// # Endpoints
///
/// - `POST /v1/profile/availability` - Overwrite availability
/// - `POST /v1/profile/auto_offline` - Overwrite the auto-offline flag
/// - `POST /v1/profile/set_active_account` - Stamp the last-seen marker
///
/// # Not-found handling
///
/// The two status setters treat a missing membership as an error: setting
/// your own status on an account you don't belong to means bad data, so they
/// fail with 404 through the error path. Switching the active account is a
/// user-facing action where absence is expected (stale client state after
/// being removed from an account), so it answers with a structured not-found
/// body instead. None of the three ever creates a membership row.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use parley_shared::{
    auth::Caller,
    models::account_user::{AccountUser, Availability},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Availability update request
#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    /// Account the status applies to
    pub account_id: Uuid,

    /// New availability
    pub availability: Availability,
}

/// Auto-offline update request
#[derive(Debug, Deserialize)]
pub struct AutoOfflineRequest {
    /// Account the flag applies to
    pub account_id: Uuid,

    /// New flag value; omitted means false
    pub auto_offline: Option<bool>,
}

/// Active-account switch request
#[derive(Debug, Deserialize)]
pub struct SetActiveAccountRequest {
    /// Account being switched to
    pub account_id: Uuid,
}

/// Overwrites the caller's availability for an account
///
/// # Errors
///
/// - `404 Not Found`: the caller has no membership in the account
pub async fn set_availability(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<AvailabilityRequest>,
) -> ApiResult<StatusCode> {
    AccountUser::set_availability(&state.db, req.account_id, caller.user_id, req.availability)
        .await?
        .ok_or_else(|| ApiError::NotFound("Membership not found".to_string()))?;

    Ok(StatusCode::OK)
}

/// Overwrites the caller's auto-offline flag for an account
///
/// An omitted flag is stored as false; that is a default-fallback policy, not
/// a validation error.
///
/// # Errors
///
/// - `404 Not Found`: the caller has no membership in the account
pub async fn set_auto_offline(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<AutoOfflineRequest>,
) -> ApiResult<StatusCode> {
    let auto_offline = req.auto_offline.unwrap_or(false);

    AccountUser::set_auto_offline(&state.db, req.account_id, caller.user_id, auto_offline)
        .await?
        .ok_or_else(|| ApiError::NotFound("Membership not found".to_string()))?;

    Ok(StatusCode::OK)
}

/// Switches the caller's active account
///
/// Stamps the membership's `active_at` with the current time. A missing
/// membership is answered with a structured 404 body rather than routed
/// through the error path; the client branches on it.
pub async fn set_active_account(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<SetActiveAccountRequest>,
) -> ApiResult<Response> {
    match AccountUser::touch_active_at(&state.db, req.account_id, caller.user_id).await? {
        Some(_) => Ok((StatusCode::OK, Json(json!({}))).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Account not found" })),
        )
            .into_response()),
    }
}
