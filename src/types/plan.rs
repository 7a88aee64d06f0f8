use serde::{Deserialize, Serialize};

/// Given/When/Then acceptance criterion attached to a user story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    #[serde(default)]
    pub given: String,
    #[serde(default)]
    pub when: String,
    #[serde(default)]
    pub then: String,
}

/// One LLM-produced user story. All fields default so that a partially
/// well-formed model response still deserializes; normalization decides
/// what to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStory {
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub as_a: String,
    #[serde(default)]
    pub i_want: String,
    #[serde(default)]
    pub so_that: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
}

/// One LLM-produced engineering task. The id doubles as the drag-and-drop
/// handle on the client, so normalization guarantees it is present and
/// unique within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringTask {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub group: String,
}

/// The normalized result of one plan generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(default)]
    pub user_stories: Vec<UserStory>,
    #[serde(default)]
    pub engineering_tasks: Vec<EngineeringTask>,
}
