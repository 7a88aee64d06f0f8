//! SQL DDL for initializing planforge storage.

/// SQLite schema.
///
/// - Timestamps are stored as RFC3339 TEXT.
/// - `generated_outputs.spec_id` is UNIQUE: a spec has at most one output
///   and regeneration upserts in place.
/// - JSON payloads (`user_stories`, `engineering_tasks`) are serialized text.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    token TEXT NOT NULL UNIQUE,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS specs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    goal TEXT NOT NULL,
    target_users TEXT NOT NULL,
    constraints TEXT NOT NULL,
    risks TEXT NULL,
    template TEXT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_specs_user_created ON specs(user_id, created_at);

CREATE TABLE IF NOT EXISTS generated_outputs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    spec_id INTEGER NOT NULL UNIQUE REFERENCES specs(id) ON DELETE CASCADE,
    user_stories TEXT NOT NULL,
    engineering_tasks TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;
