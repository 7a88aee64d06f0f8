pub mod auth;
pub mod specs;
pub mod status;
