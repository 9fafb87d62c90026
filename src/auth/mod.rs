/// Authentication module
///
/// Password hashing, JWT issuing/verification, and the per-user
/// refresh-token registry.

mod claims;
mod jwt;
mod password;
pub mod refresh_token;

pub use claims::{AccessClaims, Identity, RefreshClaims};
pub use jwt::{TokenIssuer, TokenPair, TokenVerifier};
pub use password::{PasswordHasher, PasswordPolicy};
