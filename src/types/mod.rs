//! Wire and domain types shared across handlers, storage, and the LLM layer.

pub mod api;
pub mod plan;

pub use api::{CreateSpecRequest, Credentials, SessionResponse, SpecWithOutput, StatusResponse, UpdateTasksRequest};
pub use plan::{AcceptanceCriterion, EngineeringTask, Plan, UserStory};
