use axum::RequestPartsExt;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::extract::PrivateCookieJar;
use chrono::Utc;
use headers::{Authorization, authorization::Bearer};

use crate::auth::session::SESSION_COOKIE;
use crate::db::models::User;
use crate::error::ForgeError;
use crate::router::ForgeState;

/// Extractor that resolves the caller to a signed-in user.
///
/// Accepts either:
/// - Header: `Authorization: Bearer <session token>`
/// - Private cookie: `session_token`
///
/// Rejects with 401 when neither resolves to a live session.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    ForgeState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ForgeError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = ForgeState::from_ref(state);

        let token = match bearer_token(parts).await {
            Some(token) => token,
            None => cookie_token(parts, &app).ok_or(ForgeError::Unauthorized)?,
        };

        let user = app.storage.find_session_user(&token, Utc::now()).await?;
        user.map(AuthUser).ok_or(ForgeError::Unauthorized)
    }
}

async fn bearer_token(parts: &mut Parts) -> Option<String> {
    let header = parts
        .extract::<Option<TypedHeader<Authorization<Bearer>>>>()
        .await
        .ok()??;
    let TypedHeader(Authorization(bearer)) = header;
    Some(bearer.token().to_string())
}

fn cookie_token(parts: &Parts, app: &ForgeState) -> Option<String> {
    let jar = PrivateCookieJar::from_headers(&parts.headers, app.cookie_key());
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}
