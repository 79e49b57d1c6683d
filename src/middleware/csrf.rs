//! Per-session CSRF tokens.
//!
//! `ClientCtx` issues the token when a page is rendered. Every form posts it
//! back as `csrf_token` and the handler checks it with
//! [`validate_csrf_token`] before writing anything.

use actix_session::Session;
use actix_web::{error, Error};
use rand::{distributions::Alphanumeric, Rng};

pub const CSRF_TOKEN_LENGTH: usize = 32;
const SESSION_KEY: &str = "csrf_token";

pub fn generate_csrf_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// The session's token, storing a fresh one on first use.
pub fn get_or_create_csrf_token(session: &Session) -> Result<String, Error> {
    if let Ok(Some(token)) = session.get::<String>(SESSION_KEY) {
        return Ok(token);
    }

    let token = generate_csrf_token();
    session.insert(SESSION_KEY, &token).map_err(|e| {
        log::error!("Failed to store CSRF token: {}", e);
        error::ErrorInternalServerError("Session error")
    })?;
    Ok(token)
}

/// 403 unless `submitted` equals the session's token.
pub fn validate_csrf_token(session: &Session, submitted: &str) -> Result<(), Error> {
    let expected = session
        .get::<String>(SESSION_KEY)
        .map_err(|_| error::ErrorInternalServerError("Session error"))?
        .ok_or_else(|| error::ErrorForbidden("Missing CSRF token."))?;

    if !constant_time_eq(submitted.as_bytes(), expected.as_bytes()) {
        log::warn!("Rejected form post with a mismatched CSRF token");
        return Err(error::ErrorForbidden("Invalid CSRF token."));
    }

    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
