//! Authentication user types.

use crate::jwt::AccessClaims;

/// Identity admitted by the gate, stored in the request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// JWT claims from the access token
    pub claims: AccessClaims,
}

impl AuthenticatedUser {
    /// The user id the token was issued for.
    pub fn user_id(&self) -> &str {
        &self.claims.sub
    }
}
