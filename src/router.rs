use axum::{
    Router,
    extract::FromRef,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

use crate::db::Storage;
use crate::handlers;
use crate::llm::client::LlmClient;

/// Shared application state: storage pool, the LLM client, and the cookie
/// encryption key.
#[derive(Clone)]
pub struct ForgeState {
    pub storage: Storage,
    pub llm: Arc<LlmClient>,
    key: Key,
}

impl ForgeState {
    pub fn new(storage: Storage, llm: LlmClient, key: Key) -> Self {
        Self {
            storage,
            llm: Arc::new(llm),
            key,
        }
    }

    pub fn cookie_key(&self) -> Key {
        self.key.clone()
    }
}

impl FromRef<ForgeState> for Key {
    fn from_ref(state: &ForgeState) -> Key {
        state.key.clone()
    }
}

/// Build the axum router with all API routes.
pub fn forge_router(state: ForgeState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/signin", post(handlers::auth::signin))
        .route("/api/auth/signout", post(handlers::auth::signout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/specs",
            get(handlers::specs::list_specs).post(handlers::specs::create_spec),
        )
        .route("/api/specs/{id}", get(handlers::specs::get_spec))
        .route("/api/specs/{id}/generate", post(handlers::specs::generate_plan))
        .route("/api/specs/{id}/tasks", patch(handlers::specs::update_tasks))
        .route("/api/specs/{id}/export", get(handlers::specs::export_spec))
        .route("/api/status", get(handlers::status::status))
        .with_state(state)
}
