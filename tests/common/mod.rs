use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum_extra::extract::cookie::Key;
use serde_json::Value;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

use planforge::db::Storage;
use planforge::llm::client::LlmClient;
use planforge::router::{ForgeState, forge_router};

/// A router wired to a throwaway SQLite file with the LLM disabled.
pub struct TestApp {
    pub app: Router,
    pub storage: Storage,
    db_path: PathBuf,
}

impl TestApp {
    pub async fn spawn(tag: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();

        let mut db_path = std::env::temp_dir();
        db_path.push(format!(
            "planforge-{tag}-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));

        let database_url = format!("sqlite:{}", db_path.display());
        let storage = Storage::connect(&database_url)
            .await
            .expect("storage init failed");

        let state = ForgeState::new(storage.clone(), LlmClient::Disabled, Key::generate());
        Self {
            app: forge_router(state),
            storage,
            db_path,
        }
    }

    /// Fire one request and return (status, parsed body). Non-JSON bodies
    /// come back as a JSON string value.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let resp = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// Create an account and return its session token.
    pub async fn signup(&self, email: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/signup",
                None,
                Some(serde_json::json!({ "email": email, "password": "hunter2hunter2" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        body["token"]
            .as_str()
            .expect("signup response missing token")
            .to_string()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}
