use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::plan::{EngineeringTask, UserStory};

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Full account row, used only by the auth handlers.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccount> for User {
    fn from(a: UserAccount) -> Self {
        User {
            id: a.id,
            email: a.email,
            created_at: a.created_at,
        }
    }
}

/// A user-submitted feature brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub goal: String,
    pub target_users: String,
    pub constraints: String,
    pub risks: Option<String>,
    pub template: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The LLM-produced plan tied 1:1 to a spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOutput {
    pub id: i64,
    pub spec_id: i64,
    pub user_stories: Vec<UserStory>,
    pub engineering_tasks: Vec<EngineeringTask>,
    pub created_at: DateTime<Utc>,
}
