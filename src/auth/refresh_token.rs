/// Refresh Token Registry
///
/// A user's refresh-token collection is the set of refresh tokens that are
/// still honoured. Membership is checked after cryptographic verification, so
/// removing a token (logout) revokes it even though its signature stays valid.
///
/// Tokens are hashed with SHA-256 before they enter the collection; the
/// plaintext only ever lives with the client. Stores add and remove digests
/// atomically per user (`UserStore::add_refresh_token`,
/// `UserStore::remove_refresh_token`), so concurrent sessions never overwrite
/// each other's entries.

use sha2::{Digest, Sha256};

use crate::user::User;

/// SHA-256 digest of a refresh token, as kept in the registry
pub fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Register `token` on a record that has not been persisted yet.
pub fn add(mut user: User, token: &str) -> User {
    user.refresh_tokens.push(digest(token));
    user
}

pub fn contains(user: &User, token: &str) -> bool {
    let digest = digest(token);
    user.refresh_tokens.iter().any(|stored| *stored == digest)
}
