//! # Parley Shared Library
//!
//! This crate contains the types and business logic shared between the Parley
//! API server and supporting tooling: the identity record store (users and
//! their per-account membership rows), authentication utilities, the database
//! layer, and the mailer/avatar-storage seams.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, session tokens, caller identity
//! - `db`: Connection pool and migration runner
//! - `mailer`: Confirmation-email dispatch seam
//! - `storage`: Avatar blob storage seam

pub mod auth;
pub mod db;
pub mod mailer;
pub mod models;
pub mod storage;

/// Current version of the Parley shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
