/// Database models for Parley
///
/// This module contains the identity record store: durable models and their
/// CRUD operations.
///
/// # Models
///
/// - `user`: User identity records (profile fields, credentials, tokens)
/// - `account_user`: Per-(account, user) membership rows carrying presence

pub mod account_user;
pub mod user;
