use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use planforge::db::models::Spec;
use planforge::error::ForgeError;
use planforge::llm::client::GeminiClient;

/// Read one HTTP request (headers plus Content-Length body) off the stream.
async fn read_request(stream: &mut TcpStream) {
    let mut buf = vec![0u8; 16 * 1024];
    let mut read = 0;
    loop {
        let Ok(n) = stream.read(&mut buf[read..]).await else {
            return;
        };
        if n == 0 {
            return;
        }
        read += n;
        let Some(head_end) = buf[..read].windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]);
        let content_length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        if read >= head_end + 4 + content_length {
            return;
        }
    }
}

fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// One-shot HTTP server: accepts a single connection, answers with the given
/// status line and JSON body, then closes.
async fn mock_gemini(status_line: &'static str, body: String) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = http_response(status_line, &body);

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_request(&mut stream).await;
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
    });

    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Repeating variant: serves the same canned response to every connection
/// and counts how many arrive. The `connection: close` header forces the
/// client to reconnect per attempt, so the count equals attempts made.
async fn mock_gemini_counting(
    status_line: &'static str,
    body: String,
) -> (Url, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = http_response(status_line, &body);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            read_request(&mut stream).await;
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (Url::parse(&format!("http://{addr}/")).unwrap(), hits)
}

fn sample_spec() -> Spec {
    Spec {
        id: 1,
        user_id: 1,
        title: "Bulk CSV Import".to_string(),
        goal: "Let admins import users in bulk".to_string(),
        target_users: "Workspace admins".to_string(),
        constraints: "Stream large files".to_string(),
        risks: None,
        template: Some("Web".to_string()),
        created_at: Utc::now(),
    }
}

fn candidate_response(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "modelVersion": "gemini-2.5-flash"
    })
    .to_string()
}

fn server_error_body() -> String {
    json!({ "error": { "message": "backend overloaded" } }).to_string()
}

#[tokio::test]
async fn generate_plan_parses_fenced_candidate() {
    let plan_text = concat!(
        "```json\n",
        r#"{
          "userStories": [{
            "number": 1,
            "title": "Upload a CSV",
            "asA": "workspace admin",
            "iWant": "to upload a member CSV",
            "soThat": "onboarding is fast",
            "acceptanceCriteria": [
              { "given": "a valid CSV", "when": "I upload it", "then": "members appear" }
            ]
          }],
          "engineeringTasks": [
            { "id": "task-1", "title": "CSV parser", "description": "Streaming", "group": "Backend" }
          ]
        }"#,
        "\n```"
    );
    let base = mock_gemini("HTTP/1.1 200 OK", candidate_response(plan_text)).await;

    let client = GeminiClient::new("test-key".to_string(), "gemini-2.5-flash".to_string(), base);
    let plan = client.generate_plan(&sample_spec()).await.unwrap();

    assert_eq!(plan.user_stories.len(), 1);
    assert_eq!(plan.user_stories[0].title, "Upload a CSV");
    assert_eq!(plan.user_stories[0].acceptance_criteria.len(), 1);
    assert_eq!(plan.engineering_tasks[0].id, "task-1");
}

#[tokio::test]
async fn client_error_status_is_surfaced() {
    let base = mock_gemini(
        "HTTP/1.1 400 Bad Request",
        json!({ "error": { "message": "API key not valid" } }).to_string(),
    )
    .await;

    let client = GeminiClient::new("bad-key".to_string(), "gemini-2.5-flash".to_string(), base);
    let err = client.generate_plan(&sample_spec()).await.unwrap_err();
    match err {
        ForgeError::LlmStatus(status) => assert_eq!(status.as_u16(), 400),
        other => panic!("expected LlmStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_then_surface_as_bad_gateway() {
    let (base, hits) =
        mock_gemini_counting("HTTP/1.1 500 Internal Server Error", server_error_body()).await;

    let client = GeminiClient::new("test-key".to_string(), "gemini-2.5-flash".to_string(), base);
    let err = client.generate_plan(&sample_spec()).await.unwrap_err();

    assert!(matches!(err, ForgeError::Reqwest(_)), "got {err:?}");
    assert_eq!(
        err.into_response().status(),
        axum::http::StatusCode::BAD_GATEWAY
    );
    // Initial attempt plus at least one backoff retry.
    assert!(
        hits.load(Ordering::SeqCst) >= 2,
        "upstream saw {} attempts",
        hits.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn health_check_succeeds_on_ok_response() {
    let base = mock_gemini("HTTP/1.1 200 OK", candidate_response("ok")).await;
    let client = GeminiClient::new("test-key".to_string(), "gemini-2.5-flash".to_string(), base);
    assert!(client.health_check().await);
}

#[tokio::test]
async fn health_check_fails_fast_without_retrying() {
    let (base, hits) =
        mock_gemini_counting("HTTP/1.1 500 Internal Server Error", server_error_body()).await;

    let client = GeminiClient::new("test-key".to_string(), "gemini-2.5-flash".to_string(), base);
    assert!(!client.health_check().await);
    assert_eq!(hits.load(Ordering::SeqCst), 1, "probe must be a single attempt");
}

#[tokio::test]
async fn empty_candidates_is_a_parse_error() {
    let base = mock_gemini(
        "HTTP/1.1 200 OK",
        json!({ "candidates": [], "promptFeedback": {} }).to_string(),
    )
    .await;

    let client = GeminiClient::new("test-key".to_string(), "gemini-2.5-flash".to_string(), base);
    let err = client.generate_plan(&sample_spec()).await.unwrap_err();
    assert!(matches!(err, ForgeError::LlmParse(_)), "got {err:?}");
}

#[tokio::test]
async fn candidate_without_json_is_a_parse_error() {
    let base = mock_gemini(
        "HTTP/1.1 200 OK",
        candidate_response("Sorry, I cannot help with that."),
    )
    .await;

    let client = GeminiClient::new("test-key".to_string(), "gemini-2.5-flash".to_string(), base);
    let err = client.generate_plan(&sample_spec()).await.unwrap_err();
    assert!(matches!(err, ForgeError::LlmParse(_)), "got {err:?}");
}
