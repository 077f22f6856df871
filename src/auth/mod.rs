//! Bearer token authentication.
//!
//! Access tokens are stateless JWTs valid for one hour. The gate verifies them
//! without a database lookup and there is no revocation list.

mod bearer;
mod errors;
mod gate;
mod types;

pub use bearer::get_bearer_token;
pub use errors::{ApiAuthError, AuthErrorKind};
pub use gate::{Auth, authenticate, require_auth};
pub use types::AuthenticatedUser;
