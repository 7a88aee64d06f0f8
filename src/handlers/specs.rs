use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::config::CONFIG;
use crate::db::models::{GeneratedOutput, Spec};
use crate::error::ForgeError;
use crate::export::{export_filename, render_markdown};
use crate::middleware::auth::AuthUser;
use crate::router::ForgeState;
use crate::types::api::{CreateSpecRequest, SpecWithOutput, UpdateTasksRequest};

/// GET /api/specs -> the caller's most recent specs, newest first.
pub async fn list_specs(
    State(state): State<ForgeState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Spec>>, ForgeError> {
    let specs = state
        .storage
        .recent_specs(user.id, CONFIG.recent_specs_limit)
        .await?;
    Ok(Json(specs))
}

/// POST /api/specs -> 201 with the created spec.
pub async fn create_spec(
    State(state): State<ForgeState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateSpecRequest>,
) -> Result<Response, ForgeError> {
    req.validate()?;
    let spec = state.storage.create_spec(user.id, &req).await?;
    info!(user_id = user.id, spec_id = spec.id, "spec created");
    Ok((StatusCode::CREATED, Json(spec)).into_response())
}

/// GET /api/specs/{id} -> the spec with its generated output inlined.
pub async fn get_spec(
    State(state): State<ForgeState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SpecWithOutput>, ForgeError> {
    let spec = owned_spec(&state, id, user.id).await?;
    let output = state.storage.get_output_by_spec(spec.id).await?;
    Ok(Json(SpecWithOutput { spec, output }))
}

/// POST /api/specs/{id}/generate -> call the LLM and upsert the output.
pub async fn generate_plan(
    State(state): State<ForgeState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<GeneratedOutput>, ForgeError> {
    let spec = owned_spec(&state, id, user.id).await?;

    let plan = state
        .llm
        .generate_plan(&spec)
        .await
        .inspect_err(|e| error!(spec_id = spec.id, error = %e, "LLM generation failed"))?;

    let output = state
        .storage
        .upsert_output(spec.id, &plan.user_stories, &plan.engineering_tasks)
        .await?;
    info!(
        spec_id = spec.id,
        stories = output.user_stories.len(),
        tasks = output.engineering_tasks.len(),
        "plan generated"
    );
    Ok(Json(output))
}

/// PATCH /api/specs/{id}/tasks -> persist a reordered/edited task list.
pub async fn update_tasks(
    State(state): State<ForgeState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTasksRequest>,
) -> Result<Json<GeneratedOutput>, ForgeError> {
    let spec = owned_spec(&state, id, user.id).await?;
    let output = state
        .storage
        .get_output_by_spec(spec.id)
        .await?
        .ok_or_else(|| ForgeError::not_found("Generated output not found for this spec"))?;

    req.validate()?;
    let updated = state.storage.update_output_tasks(output.id, &req.tasks).await?;
    Ok(Json(updated))
}

/// GET /api/specs/{id}/export -> the brief and plan as downloadable markdown.
pub async fn export_spec(
    State(state): State<ForgeState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ForgeError> {
    let spec = owned_spec(&state, id, user.id).await?;
    let output = state
        .storage
        .get_output_by_spec(spec.id)
        .await?
        .ok_or_else(|| ForgeError::not_found("Generated output not found for this spec"))?;

    let markdown = render_markdown(&spec, &output);
    let disposition = format!("attachment; filename=\"{}\"", export_filename(&spec.title));
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        markdown,
    )
        .into_response())
}

async fn owned_spec(state: &ForgeState, id: i64, user_id: i64) -> Result<Spec, ForgeError> {
    state
        .storage
        .get_spec(id, user_id)
        .await?
        .ok_or_else(|| ForgeError::not_found("Spec not found"))
}
