/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Signup and login
/// - `profile`: The caller's own profile (show, update, avatar, confirmation)
/// - `presence`: Per-account availability, auto-offline, and active-account

pub mod auth;
pub mod health;
pub mod presence;
pub mod profile;
