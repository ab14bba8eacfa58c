//! Integration tests for the HTTP surface.
//!
//! Each test spins up the real Axum app on a random port and drives it
//! with reqwest. A stub `LlmProvider` stands in for DeepSeek so no test
//! touches the network.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use uuid::Uuid;

use todo_oracle::error::LlmError;
use todo_oracle::llm::{ChatRequest, FragmentStream, LlmProvider};
use todo_oracle::server::{AppState, app};
use todo_oracle::store::{LibSqlBackend, TodoStore};
use todo_oracle::todos::model::User;

/// Stub provider: counts calls, records the last request, and replays
/// canned output.
struct StubLlm {
    complete_text: String,
    fragments: Vec<String>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
}

impl StubLlm {
    fn new(complete_text: &str, fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            complete_text: complete_text.to_string(),
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        Ok(self.complete_text.clone())
    }

    async fn stream(&self, request: ChatRequest) -> Result<FragmentStream, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        let fragments = self.fragments.clone();
        Ok(futures_util::stream::iter(fragments.into_iter().map(Ok)).boxed())
    }
}

/// Start the app on a random port. Returns the base URL and the backend
/// handle (for seeding users and raw inspection).
async fn start_server(llm: Option<Arc<dyn LlmProvider>>) -> (String, Arc<LibSqlBackend>) {
    let backend = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let store: Arc<dyn TodoStore> = backend.clone();
    let state = AppState::new(store, llm);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), backend)
}

async fn seed_user(backend: &LibSqlBackend) -> Uuid {
    let user = User::new(Uuid::new_v4());
    backend.upsert_user(&user).await.unwrap();
    user.id
}

/// Parse `data: ` frames out of an SSE body and return their `content`.
fn sse_contents(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| {
            serde_json::from_str::<Value>(data).unwrap()["content"]
                .as_str()
                .unwrap()
                .to_string()
        })
        .collect()
}

// ── Todo API ────────────────────────────────────────────────────────

#[tokio::test]
async fn todo_lifecycle_over_http() {
    let (base, backend) = start_server(None).await;
    let user = seed_user(&backend).await;
    let client = reqwest::Client::new();
    let uid = user.to_string();

    // Create: empty body back.
    let resp = client
        .post(format!("{base}/add"))
        .header("x-user-id", &uid)
        .json(&json!({ "text": "buy milk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "");

    // Listed, pending, not completed.
    let all: Vec<Value> = client
        .get(format!("{base}/all"))
        .header("x-user-id", &uid)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["text"], "buy milk");
    assert_eq!(all[0]["completed"], false);
    let todo_id = all[0]["id"].as_str().unwrap().to_string();

    // Complete it.
    let resp = client
        .put(format!("{base}/complete"))
        .header("x-user-id", &uid)
        .json(&json!({ "todo_id": todo_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let completed: Vec<Value> = client
        .get(format!("{base}/completed"))
        .header("x-user-id", &uid)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);
    let pending: Vec<Value> = client
        .get(format!("{base}/pending"))
        .header("x-user-id", &uid)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(pending.is_empty());

    // Delete it.
    let resp = client
        .delete(format!("{base}/delete"))
        .header("x-user-id", &uid)
        .json(&json!({ "todo_id": todo_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "deleted": true }));

    let all: Vec<Value> = client
        .get(format!("{base}/all"))
        .header("x-user-id", &uid)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_404() {
    let (base, backend) = start_server(None).await;
    let user = seed_user(&backend).await;
    let client = reqwest::Client::new();
    let uid = user.to_string();

    for todo_id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let resp = client
            .put(format!("{base}/complete"))
            .header("x-user-id", &uid)
            .json(&json!({ "todo_id": todo_id }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["detail"], "Todo not found");

        let resp = client
            .delete(format!("{base}/delete"))
            .header("x-user-id", &uid)
            .json(&json!({ "todo_id": todo_id }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }
}

#[tokio::test]
async fn other_users_todos_are_invisible_over_http() {
    let (base, backend) = start_server(None).await;
    let alice = seed_user(&backend).await;
    let bob = seed_user(&backend).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/add"))
        .header("x-user-id", alice.to_string())
        .json(&json!({ "text": "secret" }))
        .send()
        .await
        .unwrap();
    let all: Vec<Value> = client
        .get(format!("{base}/all"))
        .header("x-user-id", alice.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let todo_id = all[0]["id"].as_str().unwrap();

    // Bob sees nothing and mutates nothing; both collapse to 404.
    let bobs: Vec<Value> = client
        .get(format!("{base}/all"))
        .header("x-user-id", bob.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(bobs.is_empty());

    let resp = client
        .put(format!("{base}/complete"))
        .header("x-user-id", bob.to_string())
        .json(&json!({ "todo_id": todo_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(format!("{base}/delete"))
        .header("x-user-id", bob.to_string())
        .json(&json!({ "todo_id": todo_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn missing_identity_is_401() {
    let (base, _backend) = start_server(None).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/all")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{base}/all"))
        .header("x-user-id", "not-a-uuid")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

// ── AI proxy ────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_returns_plain_completion_text() {
    let stub = StubLlm::new("恰恰相反。", &[]);
    let (base, _backend) = start_server(Some(stub.clone())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/chat"))
        .json(&json!({ "userinput": "今天天气很好" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "恰恰相反。");

    assert_eq!(stub.calls(), 1);
    let request = stub.last_request().unwrap();
    assert_eq!(request.user, "今天天气很好");
    assert_eq!(request.temperature, 0.0);
    assert_eq!(request.max_tokens, 1024);
    assert!(request.system.contains("反驳"));
}

#[tokio::test]
async fn chat_stream_emits_cumulative_events() {
    let stub = StubLlm::new("", &["It ", "is ", "not."]);
    let (base, _backend) = start_server(Some(stub.clone())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/chat_stream"))
        .json(&json!({ "userinput": "it is sunny" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let body = resp.text().await.unwrap();
    assert_eq!(sse_contents(&body), vec!["It ", "It is ", "It is not."]);

    let request = stub.last_request().unwrap();
    assert_eq!(request.temperature, 0.7);
}

#[tokio::test]
async fn divination_streams_with_inputs_embedded() {
    let stub = StubLlm::new("", &["乾卦", "，元亨利贞。"]);
    let (base, _backend) = start_server(Some(stub.clone())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/divination"))
        .json(&json!({ "q": "事业如何", "current": "乾为天", "future": "水天需" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = resp.text().await.unwrap();
    assert_eq!(sse_contents(&body), vec!["乾卦", "乾卦，元亨利贞。"]);

    let request = stub.last_request().unwrap();
    assert!(request.system.contains("<question>事业如何</question>"));
    assert!(request.system.contains("乾为天"));
    assert!(request.system.contains("水天需"));
    assert_eq!(request.user, "开始吧");
    assert_eq!(request.temperature, 0.7);
}

#[tokio::test]
async fn missing_credential_fails_fast_without_provider_calls() {
    // A counting stub exists but the server was configured without a
    // credential, so no provider handle is wired at all.
    let stub = StubLlm::new("unreachable", &["unreachable"]);
    let (base, _backend) = start_server(None).await;
    let client = reqwest::Client::new();

    for (path, body) in [
        ("/chat", json!({ "userinput": "hi" })),
        ("/chat_stream", json!({ "userinput": "hi" })),
        ("/divination", json!({ "q": "a", "current": "b", "future": "c" })),
    ] {
        let resp = client
            .post(format!("{base}{path}"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500, "{path} should fail fast");
        let detail: Value = resp.json().await.unwrap();
        assert!(
            detail["detail"].as_str().unwrap().contains("DEEPSEEK_API_KEY"),
            "{path} should name the missing credential"
        );
    }

    assert_eq!(stub.calls(), 0);
}
