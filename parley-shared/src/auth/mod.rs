/// Authentication utilities
///
/// - `password`: Argon2id hashing and the password policy
/// - `jwt`: HS256 session tokens
/// - `caller`: the resolved caller identity handed to every operation

pub mod caller;
pub mod jwt;
pub mod password;

pub use caller::Caller;
