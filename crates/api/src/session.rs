use axum::http::HeaderMap;

use exam_core::model::SessionKey;

/// Header carrying the caller's session identifier.
pub const SESSION_HEADER: &str = "x-session-id";

/// Extracts a well-formed session key from the request headers.
#[must_use]
pub fn session_key(headers: &HeaderMap) -> Option<SessionKey> {
    headers
        .get(SESSION_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// The header's key, or a freshly minted one when absent or malformed.
/// Used by `start`, which establishes the session.
#[must_use]
pub fn session_key_or_new(headers: &HeaderMap) -> SessionKey {
    session_key(headers).unwrap_or_else(SessionKey::generate)
}
