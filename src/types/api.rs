use serde::{Deserialize, Serialize};

use crate::ForgeError;
use crate::db::models::{GeneratedOutput, Spec, User};
use crate::types::plan::EngineeringTask;

/// Body of `POST /api/auth/signup` and `POST /api/auth/signin`.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Signup-time validation. Signin deliberately skips this so that
    /// legacy accounts with weaker passwords can still authenticate.
    pub fn validate_for_signup(&self) -> Result<(), ForgeError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ForgeError::validation("A valid email is required", "email"));
        }
        if self.password.len() < 8 {
            return Err(ForgeError::validation(
                "Password must be at least 8 characters",
                "password",
            ));
        }
        Ok(())
    }
}

/// Successful signup/signin payload. The token is also set as a private
/// cookie for browser clients.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

/// Body of `POST /api/specs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpecRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub target_users: String,
    #[serde(default)]
    pub constraints: String,
    #[serde(default)]
    pub risks: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
}

impl CreateSpecRequest {
    pub fn validate(&self) -> Result<(), ForgeError> {
        for (value, field, message) in [
            (&self.title, "title", "Title is required"),
            (&self.goal, "goal", "Goal is required"),
            (&self.target_users, "targetUsers", "Target users are required"),
            (&self.constraints, "constraints", "Constraints are required"),
        ] {
            if value.trim().is_empty() {
                return Err(ForgeError::validation(message, field));
            }
        }
        Ok(())
    }
}

/// Body of `PATCH /api/specs/{id}/tasks`.
#[derive(Debug, Deserialize)]
pub struct UpdateTasksRequest {
    pub tasks: Vec<EngineeringTask>,
}

impl UpdateTasksRequest {
    pub fn validate(&self) -> Result<(), ForgeError> {
        for task in &self.tasks {
            if task.id.trim().is_empty() {
                return Err(ForgeError::validation("Every task needs an id", "tasks"));
            }
            if task.title.trim().is_empty() {
                return Err(ForgeError::validation("Every task needs a title", "tasks"));
            }
            if task.group.trim().is_empty() {
                return Err(ForgeError::validation("Every task needs a group", "tasks"));
            }
        }
        Ok(())
    }
}

/// `GET /api/specs/{id}` response: the spec with its output inlined when a
/// plan has been generated.
#[derive(Debug, Serialize)]
pub struct SpecWithOutput {
    #[serde(flatten)]
    pub spec: Spec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<GeneratedOutput>,
}

/// `GET /api/status` response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub backend: bool,
    pub database: bool,
    pub llm: bool,
}
