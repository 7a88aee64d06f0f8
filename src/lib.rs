pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod handlers;
pub mod llm;
pub mod middleware;
pub mod router;
pub mod types;

pub use error::ForgeError;
pub use llm::client::LlmClient;
pub use router::{ForgeState, forge_router};
