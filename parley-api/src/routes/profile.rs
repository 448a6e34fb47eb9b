/// Profile endpoints
///
/// Operations on the caller's own profile. There is no cross-user update
/// path: the caller identity resolved by the auth layer is always the target
/// record.
///
/// # Endpoints
///
/// - `GET    /v1/profile` - Own profile
/// - `PUT    /v1/profile` - Update own profile (whitelisted fields)
/// - `DELETE /v1/profile/avatar` - Remove avatar (idempotent)
/// - `POST   /v1/profile/resend_confirmation` - Resend confirmation email
///
/// # Whitelist semantics
///
/// The update body is an arbitrary JSON object. Only the keys in
/// [`PERMITTED_PROFILE_FIELDS`] are read; anything else is silently dropped,
/// never an error. All recognized fields are applied in a single UPDATE, so a
/// failed validation leaves the record untouched.
use crate::{
    app::AppState,
    error::{is_email_taken, ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Extension, Json};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parley_shared::{
    auth::{password, Caller},
    models::user::{ProfileChanges, User, UserView},
    storage,
};
use serde_json::{json, Value};
use validator::ValidateEmail;

/// The fixed set of keys the profile update reads from caller input
pub const PERMITTED_PROFILE_FIELDS: [&str; 8] = [
    "name",
    "display_name",
    "email",
    "password",
    "password_confirmation",
    "avatar",
    "groq_token",
    "wavoip_token",
];

/// Raw, whitelist-filtered profile parameters
///
/// Values are taken verbatim from the request body; nothing is validated yet.
/// The nullable profile fields distinguish "absent" from "explicit null":
/// `Some(None)` means the caller sent `null` to clear the column.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProfileParams {
    pub name: Option<Option<String>>,
    pub display_name: Option<Option<String>>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    /// Base64-encoded image bytes
    pub avatar: Option<String>,
    pub groq_token: Option<String>,
    pub wavoip_token: Option<String>,
}

/// A fully validated update, ready to apply
#[derive(Debug)]
struct ValidatedProfileUpdate {
    changes: ProfileChanges,
    /// Decoded avatar bytes, stored before the row update
    avatar: Option<Vec<u8>>,
}

impl ProfileParams {
    /// Extracts the permitted fields from a raw JSON body
    ///
    /// Unrecognized keys are dropped without error. A recognized key bound to
    /// a non-string value is a validation error, except `null`: on the
    /// nullable fields (`name`, `display_name`) it requests a clear, anywhere
    /// else it counts as absent.
    pub fn from_body(body: &Value) -> Result<Self, ApiError> {
        let map = body
            .as_object()
            .ok_or_else(|| ApiError::BadRequest("Expected a JSON object".to_string()))?;

        let mut params = Self::default();
        let mut errors = Vec::new();

        for field in PERMITTED_PROFILE_FIELDS {
            match map.get(field) {
                None => {}
                Some(Value::Null) => params.clear(field),
                Some(Value::String(value)) => params.set(field, value.clone()),
                Some(_) => errors.push(ValidationErrorDetail::new(field, "must be a string")),
            }
        }

        if !errors.is_empty() {
            return Err(ApiError::ValidationError(errors));
        }

        Ok(params)
    }

    fn set(&mut self, field: &str, value: String) {
        match field {
            "name" => self.name = Some(Some(value)),
            "display_name" => self.display_name = Some(Some(value)),
            "email" => self.email = Some(value),
            "password" => self.password = Some(value),
            "password_confirmation" => self.password_confirmation = Some(value),
            "avatar" => self.avatar = Some(value),
            "groq_token" => self.groq_token = Some(value),
            "wavoip_token" => self.wavoip_token = Some(value),
            _ => {}
        }
    }

    fn clear(&mut self, field: &str) {
        match field {
            "name" => self.name = Some(None),
            "display_name" => self.display_name = Some(None),
            // The remaining columns are NOT NULL; null counts as absent
            _ => {}
        }
    }

    /// Validates the parameters into an applicable change set
    ///
    /// All failures are collected so the caller gets every field error in one
    /// response.
    fn validate(self) -> Result<ValidatedProfileUpdate, ApiError> {
        let mut errors = Vec::new();
        let mut changes = ProfileChanges {
            name: self.name,
            display_name: self.display_name,
            groq_token: self.groq_token,
            wavoip_token: self.wavoip_token,
            ..Default::default()
        };

        if let Some(email) = self.email {
            if email.validate_email() {
                changes.email = Some(email);
            } else {
                errors.push(ValidationErrorDetail::new("email", "is not a valid email"));
            }
        }

        // Password changes require a matching confirmation
        match (self.password, self.password_confirmation) {
            (None, None) => {}
            (Some(password), Some(confirmation)) => {
                if password != confirmation {
                    errors.push(ValidationErrorDetail::new(
                        "password_confirmation",
                        "doesn't match password",
                    ));
                } else if let Err(message) = password::validate_password_strength(&password) {
                    errors.push(ValidationErrorDetail::new("password", message));
                } else {
                    match password::hash_password(&password) {
                        Ok(hash) => changes.password_hash = Some(hash),
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            (Some(_), None) => {
                errors.push(ValidationErrorDetail::new(
                    "password_confirmation",
                    "can't be blank",
                ));
            }
            (None, Some(_)) => {
                errors.push(ValidationErrorDetail::new("password", "can't be blank"));
            }
        }

        let avatar = match self.avatar {
            None => None,
            Some(encoded) => match BASE64.decode(encoded.as_bytes()) {
                Ok(bytes) => Some(bytes),
                Err(_) => {
                    errors.push(ValidationErrorDetail::new(
                        "avatar",
                        "is not valid base64 image data",
                    ));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(ApiError::ValidationError(errors));
        }

        Ok(ValidatedProfileUpdate { changes, avatar })
    }
}

/// Returns the caller's own profile
///
/// # Endpoint
///
/// ```text
/// GET /v1/profile
/// Authorization: Bearer <token>
/// ```
pub async fn show_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<UserView>> {
    let user = User::find_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Updates the caller's own profile
///
/// Applies the whitelisted fields atomically. On validation failure the
/// response is 422 with a field→message list and the record is unchanged.
///
/// # Endpoint
///
/// ```text
/// PUT /v1/profile
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// {
///   "display_name": "Sam",
///   "email": "sam@example.com",
///   "ignored_key": "silently dropped"
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: validation failed (email format or
///   uniqueness, password/confirmation mismatch, undecodable avatar)
/// - `404 Not Found`: caller's record no longer exists
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<Value>,
) -> ApiResult<Json<UserView>> {
    let params = ProfileParams::from_body(&body)?;
    let ValidatedProfileUpdate { mut changes, avatar } = params.validate()?;

    // Read the current row first so a replaced avatar blob can be cleaned up
    let current = User::find_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // A body of only unrecognized keys applies nothing and mutates nothing
    if changes.is_empty() && avatar.is_none() {
        return Ok(Json(current.into()));
    }

    // New avatar bytes go into the store before the row points at them
    if let Some(bytes) = avatar {
        let key = storage::new_avatar_key();
        state.avatars.put(&key, &bytes).await?;
        changes.avatar_key = Some(key);
    }

    let new_avatar_key = changes.avatar_key.clone();

    let updated = match User::apply_profile(&state.db, caller.user_id, changes).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            discard_blob(&state, new_avatar_key).await;
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            discard_blob(&state, new_avatar_key).await;
            if is_email_taken(&e) {
                return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
                    "email",
                    "has already been taken",
                )]));
            }
            return Err(e.into());
        }
    };

    // Row committed; the previous blob is now unreferenced
    if updated.avatar_key != current.avatar_key {
        if let Some(old_key) = current.avatar_key {
            if let Err(e) = state.avatars.delete(&old_key).await {
                tracing::warn!(key = %old_key, error = %e, "Failed to delete replaced avatar blob");
            }
        }
    }

    Ok(Json(updated.into()))
}

/// Best-effort removal of a blob that never made it onto a row
async fn discard_blob(state: &AppState, key: Option<String>) {
    if let Some(key) = key {
        if let Err(e) = state.avatars.delete(&key).await {
            tracing::warn!(key = %key, error = %e, "Failed to discard orphaned avatar blob");
        }
    }
}

/// Removes the caller's avatar
///
/// Deletes the blob first, then clears the row's key, then re-reads the
/// record. A caller without an avatar gets the same refreshed representation
/// back; calling twice is a no-op, not an error.
///
/// # Endpoint
///
/// ```text
/// DELETE /v1/profile/avatar
/// Authorization: Bearer <token>
/// ```
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<UserView>> {
    let user = User::find_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if let Some(key) = &user.avatar_key {
        // Blob deletion completes before the key is cleared
        state.avatars.delete(key).await?;
        User::clear_avatar(&state.db, caller.user_id).await?;
    }

    let refreshed = User::find_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(refreshed.into()))
}

/// Resends confirmation instructions
///
/// Dispatches an email only when the caller is unconfirmed, but the response
/// is 200 either way so confirmation state is not directly enumerable. A
/// dispatch failure is logged and still reported as success.
///
/// # Endpoint
///
/// ```text
/// POST /v1/profile/resend_confirmation
/// Authorization: Bearer <token>
/// ```
pub async fn resend_confirmation(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Value>> {
    let user = User::find_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.confirmed() {
        if let Err(e) = state
            .mailer
            .send_confirmation(&user.email, user.name.as_deref())
            .await
        {
            tracing::warn!(email = %user.email, error = %e, "Confirmation dispatch failed");
        }
    }

    Ok(Json(json!({})))
}
