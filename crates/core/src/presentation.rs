//! Presentation token generation and validity rules.
//!
//! A presentation token is a bearer capability for viewing one project under
//! a simulated role. Only the SHA-256 digest of the token is stored; the
//! plaintext is returned to the issuer exactly once.

use chrono::Duration;
use rand::Rng;

use crate::error::CoreError;
use crate::permissions::can_access_financial_data;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of the generated token string (alphanumeric characters).
pub const TOKEN_LENGTH: usize = 32;

/// Lifetime of a freshly issued token.
pub const TOKEN_TTL_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// The result of generating a new presentation token.
pub struct GeneratedToken {
    /// The plaintext token (returned once, never stored).
    pub plaintext: String,
    /// The SHA-256 hex digest of the plaintext (stored).
    pub hash: String,
}

/// Generate a new random presentation token from the thread-local CSPRNG.
pub fn generate_token() -> GeneratedToken {
    let token: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect();
    let hash = hash_token(&token);
    GeneratedToken {
        plaintext: token,
        hash,
    }
}

/// Compute the SHA-256 hex digest of a token.
///
/// Used at issue time to store the hash and at resolve time to look it up.
pub fn hash_token(token: &str) -> String {
    crate::hashing::sha256_hex(token.as_bytes())
}

/// Whether a string has the shape of an issued token. Lookups for anything
/// else can be rejected without touching the store.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Expiry for a token issued at `issued_at`.
pub fn expiry_for(issued_at: Timestamp) -> Timestamp {
    issued_at + Duration::hours(TOKEN_TTL_HOURS)
}

// ---------------------------------------------------------------------------
// Issue and resolve rules
// ---------------------------------------------------------------------------

/// Decide the viewing profile of a new token.
///
/// Defaults to the issuer's own role. A requested profile may not reveal
/// financial data the issuer cannot see.
pub fn resolve_view_role(issuer_role: Role, requested: Option<Role>) -> Result<Role, CoreError> {
    let view_role = requested.unwrap_or(issuer_role);
    if can_access_financial_data(view_role) && !can_access_financial_data(issuer_role) {
        return Err(CoreError::Forbidden(format!(
            "Role {issuer_role} cannot issue a {view_role} presentation with financial data"
        )));
    }
    Ok(view_role)
}

/// Check a stored token's state at read time.
///
/// Inactive tokens are invalid; active tokens past their expiry are expired.
/// A token is still valid at the exact expiry instant.
pub fn check_token_window(
    active: bool,
    expires_at: Timestamp,
    now: Timestamp,
) -> Result<(), CoreError> {
    if !active {
        return Err(CoreError::TokenInvalid);
    }
    if now > expires_at {
        return Err(CoreError::TokenExpired);
    }
    Ok(())
}

/// ADMIN may revoke any token; everyone else only the tokens they issued.
pub fn can_revoke(role: Role, issuer_id: DbId, acting_user_id: DbId) -> bool {
    role == Role::Admin || issuer_id == acting_user_id
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
