//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite)
//! - `sqlite.rs`: the `Storage` access layer

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{GeneratedOutput, Spec, User, UserAccount};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, Storage};
