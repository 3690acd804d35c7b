//! Shared-secret check for the admin endpoint
//!
//! The expected key comes from the `ADMIN_KEY` environment variable. If it is
//! not set, the admin endpoint is disabled and every request is rejected.

use subtle::ConstantTimeEq;

/// Performs a constant-time comparison of two strings to prevent timing attacks.
/// Returns true if the strings are equal.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // The key length isn't secret, so the early exit is fine
    if a_bytes.len() != b_bytes.len() {
        return false;
    }

    a_bytes.ct_eq(b_bytes).into()
}

/// Returns `true` only when an admin key is configured and `provided` equals it.
pub fn admin_key_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    let Some(expected) = expected else {
        tracing::warn!("Admin request rejected: no admin key configured");
        return false;
    };

    match provided {
        Some(provided) if constant_time_compare(provided, expected) => true,
        Some(_) => {
            tracing::warn!("Invalid admin key provided");
            false
        }
        None => {
            tracing::warn!("Missing admin key in request");
            false
        }
    }
}
