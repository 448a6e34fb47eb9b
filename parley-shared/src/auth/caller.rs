/// Caller identity resolved by the authentication layer
///
/// Every profile and presence operation takes the authenticated principal
/// explicitly. The API server's auth middleware validates the session token
/// and inserts a `Caller` into request extensions; handlers never reach for
/// ambient session state.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;

/// The authenticated principal making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl Caller {
    /// Creates a caller identity for a user
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    /// Creates a caller identity from validated session claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id);
        assert_eq!(Caller::from_claims(&claims), Caller::new(user_id));
    }
}
