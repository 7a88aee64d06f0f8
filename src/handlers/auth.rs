use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::TypedHeader;
use axum_extra::extract::PrivateCookieJar;
use chrono::Utc;
use headers::{Authorization, authorization::Bearer};
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{
    SESSION_COOKIE, build_session_cookie, clear_session_cookie, new_session_token, session_expiry,
};
use crate::db::models::User;
use crate::error::ForgeError;
use crate::middleware::auth::AuthUser;
use crate::router::ForgeState;
use crate::types::api::{Credentials, SessionResponse};

/// POST /api/auth/signup -> 201 with a fresh session.
pub async fn signup(
    State(state): State<ForgeState>,
    jar: PrivateCookieJar,
    Json(creds): Json<Credentials>,
) -> Result<Response, ForgeError> {
    creds.validate_for_signup()?;

    let email = creds.email.trim().to_lowercase();
    let password_hash = hash_password(&creds.password)?;
    // Duplicate emails surface as a unique violation and map to 409.
    let user = state.storage.create_user(&email, &password_hash).await?;

    let (token, jar) = issue_session(&state, &user, jar).await?;
    info!(user_id = user.id, "account created");
    Ok((
        jar,
        (StatusCode::CREATED, Json(SessionResponse { token, user })),
    )
        .into_response())
}

/// POST /api/auth/signin -> 200 with a fresh session.
pub async fn signin(
    State(state): State<ForgeState>,
    jar: PrivateCookieJar,
    Json(creds): Json<Credentials>,
) -> Result<Response, ForgeError> {
    let email = creds.email.trim().to_lowercase();
    let account = state
        .storage
        .find_account_by_email(&email)
        .await?
        .ok_or(ForgeError::InvalidCredentials)?;

    if !verify_password(&creds.password, &account.password_hash) {
        return Err(ForgeError::InvalidCredentials);
    }

    let user = User::from(account);
    let (token, jar) = issue_session(&state, &user, jar).await?;
    info!(user_id = user.id, "signed in");
    Ok((jar, Json(SessionResponse { token, user })).into_response())
}

/// POST /api/auth/signout -> 204. Deletes the session row (if any) and
/// clears the cookie. Works with either auth mechanism.
pub async fn signout(
    State(state): State<ForgeState>,
    jar: PrivateCookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Response, ForgeError> {
    let token = bearer
        .map(|TypedHeader(Authorization(b))| b.token().to_string())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()));

    if let Some(token) = token {
        state.storage.delete_session(&token).await?;
    }

    let jar = jar.remove(clear_session_cookie());
    Ok((jar, StatusCode::NO_CONTENT).into_response())
}

/// GET /api/auth/me -> the signed-in user.
pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

async fn issue_session(
    state: &ForgeState,
    user: &User,
    jar: PrivateCookieJar,
) -> Result<(String, PrivateCookieJar), ForgeError> {
    let token = new_session_token();
    state
        .storage
        .create_session(user.id, &token, session_expiry(Utc::now()))
        .await?;
    let jar = jar.add(build_session_cookie(token.clone()));
    Ok((token, jar))
}
