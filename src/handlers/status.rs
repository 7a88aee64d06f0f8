use axum::{Json, extract::State};
use tracing::warn;

use crate::router::ForgeState;
use crate::types::api::StatusResponse;

/// GET /api/status -> backend/database/LLM health booleans. Unauthenticated
/// so that a dashboard can poll it before sign-in.
pub async fn status(State(state): State<ForgeState>) -> Json<StatusResponse> {
    let database = match state.storage.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "database health check failed");
            false
        }
    };

    Json(StatusResponse {
        backend: true,
        database,
        llm: state.llm.health_check().await,
    })
}
