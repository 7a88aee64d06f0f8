use argon2::password_hash::rand_core::{OsRng, RngCore};
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use chrono::{DateTime, Utc};
use time::Duration;

use crate::config::CONFIG;

pub const SESSION_COOKIE: &str = "session_token";

/// Opaque session token: 32 random bytes, base64url without padding.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub fn session_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + chrono::Duration::days(CONFIG.session_ttl_days)
}

pub fn build_session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE.to_string(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(CONFIG.session_ttl_days))
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
