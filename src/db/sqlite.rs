use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

use crate::db::models::{GeneratedOutput, Spec, User, UserAccount};
use crate::db::schema::SQLITE_INIT;
use crate::error::ForgeError;
use crate::types::api::CreateSpecRequest;
use crate::types::plan::{EngineeringTask, UserStory};

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the SQLite database at `database_url` and
    /// run the bundled DDL.
    pub async fn connect(database_url: &str) -> Result<Self, ForgeError> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL statement by
    /// statement (sqlx::query does not accept multi-command strings).
    pub async fn init_schema(&self) -> Result<(), ForgeError> {
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Health probe used by the status endpoint.
    pub async fn ping(&self) -> Result<(), ForgeError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // --- users & sessions ---

    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, ForgeError> {
        let created_at = Utc::now();
        let result = sqlx::query("INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?)")
            .bind(email)
            .bind(password_hash)
            .bind(created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(User {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            created_at,
        })
    }

    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, ForgeError> {
        let row = sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_account).transpose()
    }

    /// Expired rows are swept here so the table does not grow without bound;
    /// every sign-in/signup passes through this path.
    pub async fn create_session(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ForgeError> {
        sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        sqlx::query("INSERT INTO sessions (user_id, token, expires_at, created_at) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(token)
            .bind(expires_at.to_rfc3339())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Resolve a session token to its user, honoring expiry.
    pub async fn find_session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, ForgeError> {
        let row = sqlx::query(
            r#"SELECT u.id, u.email, u.created_at
               FROM sessions s JOIN users u ON u.id = s.user_id
               WHERE s.token = ? AND s.expires_at > ?"#,
        )
        .bind(token)
        .bind(now.to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn delete_session(&self, token: &str) -> Result<(), ForgeError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- specs ---

    pub async fn create_spec(
        &self,
        user_id: i64,
        req: &CreateSpecRequest,
    ) -> Result<Spec, ForgeError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO specs (user_id, title, goal, target_users, constraints, risks, template, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.goal)
        .bind(&req.target_users)
        .bind(&req.constraints)
        .bind(&req.risks)
        .bind(&req.template)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(Spec {
            id: result.last_insert_rowid(),
            user_id,
            title: req.title.clone(),
            goal: req.goal.clone(),
            target_users: req.target_users.clone(),
            constraints: req.constraints.clone(),
            risks: req.risks.clone(),
            template: req.template.clone(),
            created_at,
        })
    }

    /// Fetch a spec scoped to its owner. Other users' specs read as absent.
    pub async fn get_spec(&self, id: i64, user_id: i64) -> Result<Option<Spec>, ForgeError> {
        let row = sqlx::query(
            r#"SELECT id, user_id, title, goal, target_users, constraints, risks, template, created_at
               FROM specs WHERE id = ? AND user_id = ?"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_spec).transpose()
    }

    pub async fn recent_specs(&self, user_id: i64, limit: i64) -> Result<Vec<Spec>, ForgeError> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, title, goal, target_users, constraints, risks, template, created_at
               FROM specs WHERE user_id = ?
               ORDER BY created_at DESC, id DESC LIMIT ?"#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_spec).collect()
    }

    // --- generated outputs ---

    /// Insert or replace the output for a spec. Regeneration keeps the 1:1
    /// relation by upserting on `spec_id`.
    pub async fn upsert_output(
        &self,
        spec_id: i64,
        stories: &[UserStory],
        tasks: &[EngineeringTask],
    ) -> Result<GeneratedOutput, ForgeError> {
        let stories_json = serde_json::to_string(stories)?;
        let tasks_json = serde_json::to_string(tasks)?;
        sqlx::query(
            r#"INSERT INTO generated_outputs (spec_id, user_stories, engineering_tasks, created_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(spec_id) DO UPDATE SET
                   user_stories=excluded.user_stories,
                   engineering_tasks=excluded.engineering_tasks,
                   created_at=excluded.created_at"#,
        )
        .bind(spec_id)
        .bind(&stories_json)
        .bind(&tasks_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.get_output_by_spec(spec_id).await?.ok_or_else(|| {
            ForgeError::not_found("Generated output not found for this spec")
        })
    }

    /// Ownership is checked by the caller via `get_spec` first, matching the
    /// handler flow.
    pub async fn get_output_by_spec(
        &self,
        spec_id: i64,
    ) -> Result<Option<GeneratedOutput>, ForgeError> {
        let row = sqlx::query(
            r#"SELECT id, spec_id, user_stories, engineering_tasks, created_at
               FROM generated_outputs WHERE spec_id = ?"#,
        )
        .bind(spec_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_output).transpose()
    }

    pub async fn update_output_tasks(
        &self,
        output_id: i64,
        tasks: &[EngineeringTask],
    ) -> Result<GeneratedOutput, ForgeError> {
        let tasks_json = serde_json::to_string(tasks)?;
        sqlx::query("UPDATE generated_outputs SET engineering_tasks = ? WHERE id = ?")
            .bind(&tasks_json)
            .bind(output_id)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query(
            r#"SELECT id, spec_id, user_stories, engineering_tasks, created_at
               FROM generated_outputs WHERE id = ?"#,
        )
        .bind(output_id)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_output(row)
    }

    // --- row mapping ---

    fn row_to_user(row: SqliteRow) -> Result<User, ForgeError> {
        Ok(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
        })
    }

    fn row_to_account(row: SqliteRow) -> Result<UserAccount, ForgeError> {
        Ok(UserAccount {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
        })
    }

    fn row_to_spec(row: SqliteRow) -> Result<Spec, ForgeError> {
        Ok(Spec {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            goal: row.try_get("goal")?,
            target_users: row.try_get("target_users")?,
            constraints: row.try_get("constraints")?,
            risks: row.try_get("risks")?,
            template: row.try_get("template")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
        })
    }

    fn row_to_output(row: SqliteRow) -> Result<GeneratedOutput, ForgeError> {
        let stories_json: String = row.try_get("user_stories")?;
        let tasks_json: String = row.try_get("engineering_tasks")?;
        let user_stories: Vec<UserStory> = serde_json::from_str(&stories_json)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let engineering_tasks: Vec<EngineeringTask> = serde_json::from_str(&tasks_json)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(GeneratedOutput {
            id: row.try_get("id")?,
            spec_id: row.try_get("spec_id")?,
            user_stories,
            engineering_tasks,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
        })
    }
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, ForgeError> {
    let parsed = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);
    Ok(parsed)
}
