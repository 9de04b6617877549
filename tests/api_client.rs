//! Client tests against an in-process axum stand-in for the backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use qualityguard::api::{
    ApiClient, ExecutionQuery, ExecutionStatus, ExportFormat, ReviewStatus, TestCaseCreate,
    TestCaseQuery, TestType,
};
use qualityguard::config::Config;
use qualityguard::error::QgError;

#[derive(Clone, Debug)]
struct Recorded {
    path: String,
    authorization: Option<String>,
    query: HashMap<String, String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct StubState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    /// Status returned for `GET /test-executions/{id}`.
    execution_status: Arc<Mutex<String>>,
}

impl StubState {
    fn record(&self, path: &str, headers: &HeaderMap, query: HashMap<String, String>, body: Option<Value>) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(Recorded {
                path: path.to_string(),
                authorization,
                query,
                body,
            });
        }
    }
}

struct Stub {
    base_url: String,
    state: StubState,
    join: JoinHandle<()>,
}

impl Stub {
    fn requests(&self) -> Vec<Recorded> {
        self.state
            .requests
            .lock()
            .map_or_else(|_| Vec::new(), |r| r.clone())
    }

    fn client(&self, token: Option<&str>) -> ApiClient {
        ApiClient::new(
            &self.base_url,
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }
}

impl Drop for Stub {
    fn drop(&mut self) {
        self.join.abort();
    }
}

async fn spawn_stub(execution_status: &str) -> Stub {
    let state = StubState {
        execution_status: Arc::new(Mutex::new(execution_status.to_string())),
        ..Default::default()
    };
    let api = Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/:id", get(missing_project))
        .route("/test-cases", get(list_test_cases).post(reject_test_case))
        .route("/test-plans/:id/execute", post(execute_plan))
        .route("/test-executions", get(list_executions))
        .route("/test-executions/batch", delete(batch_delete))
        .route("/test-executions/:id", get(get_execution))
        .route("/test-executions/:id/logs", get(execution_logs))
        .route("/reports/:id/export", get(export_report))
        .route("/auth/me", get(unauthorized))
        .route("/auth/login/json", post(login))
        .route("/auth/logout", post(logout))
        .route("/test-case-reviews/:id/approve", post(approve_review))
        .route("/test-case-reviews/:id/reject", post(reject_review));
    let app = Router::new().nest("/api/v1", api).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/api/v1", listener.local_addr().unwrap());
    let join = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Stub {
        base_url,
        state,
        join,
    }
}

async fn list_projects(State(state): State<StubState>, headers: HeaderMap) -> impl IntoResponse {
    state.record("/projects", &headers, HashMap::new(), None);
    Json(json!({ "projects": [{ "id": 1, "name": "Shop" }, { "id": 2, "name": "Admin" }] }))
}

async fn missing_project() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Project not found" })))
}

async fn list_test_cases(
    State(state): State<StubState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record("/test-cases", &headers, query, None);
    Json(json!([
        { "id": 10, "name": "login", "project_id": 1, "test_type": "api" },
        { "id": 11, "name": "soak", "project_id": 1, "test_type": "chaos" }
    ]))
}

async fn reject_test_case(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.record("/test-cases", &headers, HashMap::new(), Some(body));
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": [
            { "loc": ["body", "name"], "msg": "field required", "type": "value_error.missing" }
        ] })),
    )
}

async fn execute_plan(Path(id): Path<u64>) -> impl IntoResponse {
    Json(json!({ "execution_id": 40 + id, "status": "pending" }))
}

async fn list_executions(
    State(state): State<StubState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record("/test-executions", &headers, query, None);
    Json(json!({
        "items": [{ "id": 3, "status": "failed", "test_case_id": 10 }],
        "total": 31,
        "skip": 30,
        "limit": 10
    }))
}

async fn get_execution(State(state): State<StubState>, Path(id): Path<u64>) -> impl IntoResponse {
    let status = state
        .execution_status
        .lock()
        .map(|s| s.clone())
        .unwrap_or_default();
    Json(json!({ "id": id, "status": status, "result": { "summary": "done" } }))
}

async fn execution_logs(Path(id): Path<u64>) -> impl IntoResponse {
    Json(json!({ "execution_id": id, "logs": ["step 1 ok", "step 2 ok"], "status": "passed" }))
}

async fn batch_delete(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.record("/test-executions/batch", &headers, HashMap::new(), Some(body));
    StatusCode::NO_CONTENT
}

async fn export_report(
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    match query.get("format").map(String::as_str) {
        Some("json") => Json(json!({ "content": { "report_id": id } })),
        _ => Json(json!({ "content": format!("<html>report {}</html>", id) })),
    }
}

async fn unauthorized() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Could not validate credentials" })))
}

async fn login(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.record("/auth/login/json", &headers, HashMap::new(), Some(body.clone()));
    let user = body["username"].as_str().unwrap_or_default();
    Json(json!({ "access_token": format!("tok-{}", user), "token_type": "bearer" }))
}

async fn logout(State(state): State<StubState>, headers: HeaderMap) -> impl IntoResponse {
    state.record("/auth/logout", &headers, HashMap::new(), None);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "session store down" })))
}

fn review(id: u64, status: &str) -> Value {
    json!({ "id": id, "test_case_id": 10, "project_id": 1, "title": "login flow", "status": status })
}

async fn approve_review(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record(&format!("/test-case-reviews/{}/approve", id), &headers, query, None);
    Json(review(id, "approved"))
}

async fn reject_review(
    State(state): State<StubState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.record(&format!("/test-case-reviews/{}/reject", id), &headers, query, None);
    Json(review(id, "rejected"))
}

/// Run the `qg` binary off the async runtime so the stub keeps serving.
async fn run_qg(home: &std::path::Path, env: &[(&str, &str)], args: Vec<String>) -> std::process::Output {
    let home = home.to_path_buf();
    let env: Vec<(String, String)> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    tokio::task::spawn_blocking(move || {
        let mut cmd = assert_cmd::Command::cargo_bin("qg").unwrap();
        cmd.env("HOME", &home).env("NO_COLOR", "1");
        for key in ["QG_API_URL", "QG_TOKEN", "QG_TIMEOUT", "QG_CONFIG", "QG_PASSWORD"] {
            cmd.env_remove(key);
        }
        for (k, v) in env {
            cmd.env(k, v);
        }
        cmd.args(args).output().unwrap()
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn keyed_envelope_and_bearer_token() {
    let stub = spawn_stub("passed").await;
    let projects = stub.client(Some("tok-1")).list_projects().await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[1].name, "Admin");

    let requests = stub.requests();
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok-1"));
}

#[tokio::test]
async fn no_token_sends_no_header() {
    let stub = spawn_stub("passed").await;
    stub.client(None).list_projects().await.unwrap();
    assert!(stub.requests()[0].authorization.is_none());
}

#[tokio::test]
async fn filters_become_query_params() {
    let stub = spawn_stub("passed").await;
    let cases = stub
        .client(None)
        .list_test_cases(&TestCaseQuery {
            project_id: Some(1),
            test_type: Some(TestType::Api),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(cases.len(), 2);
    // unknown types still decode
    assert_eq!(cases[1].test_type, TestType::Other);

    let query = &stub.requests()[0].query;
    assert_eq!(query.get("project_id").map(String::as_str), Some("1"));
    assert_eq!(query.get("test_type").map(String::as_str), Some("api"));
    assert!(!query.contains_key("search"));
}

#[tokio::test]
async fn paginated_executions() {
    let stub = spawn_stub("passed").await;
    let page = stub
        .client(None)
        .list_executions(&ExecutionQuery {
            status: Some(ExecutionStatus::Failed),
            skip: Some(30),
            limit: Some(10),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 31);
    assert_eq!(page.items[0].status, ExecutionStatus::Failed);
    assert_eq!(
        stub.requests()[0].query.get("status").map(String::as_str),
        Some("failed")
    );
}

#[tokio::test]
async fn execute_and_follow_logs() {
    let stub = spawn_stub("passed").await;
    let client = stub.client(None);
    let started = client.execute_test_plan(2).await.unwrap();
    assert_eq!(started.execution_id, 42);

    let execution = client.get_execution(started.execution_id).await.unwrap();
    assert!(execution.status.is_terminal());

    let logs = client.execution_logs(42).await.unwrap();
    assert_eq!(logs.text(), "step 1 ok\nstep 2 ok");
}

#[tokio::test]
async fn batch_delete_sends_ids_and_accepts_empty_reply() {
    let stub = spawn_stub("passed").await;
    stub.client(None)
        .batch_delete_executions(&[3, 4])
        .await
        .unwrap();
    let recorded = stub.requests();
    assert_eq!(recorded[0].path, "/test-executions/batch");
    assert_eq!(recorded[0].body, Some(json!({ "execution_ids": [3, 4] })));
}

#[tokio::test]
async fn report_export_formats() {
    let stub = spawn_stub("passed").await;
    let client = stub.client(None);
    let html = client.export_report(5, ExportFormat::Html).await.unwrap();
    assert_eq!(html, "<html>report 5</html>");

    let json = client.export_report(5, ExportFormat::Json).await.unwrap();
    let parsed: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, json!({ "report_id": 5 }));
}

#[tokio::test]
async fn error_statuses_map_to_variants() {
    let stub = spawn_stub("passed").await;
    let client = stub.client(Some("stale"));

    let err = client.get_project(99).await.unwrap_err();
    assert!(matches!(err, QgError::NotFound(ref p) if p == "/projects/99"));

    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, QgError::Unauthorized));

    let err = client
        .create_test_case(&TestCaseCreate {
            name: String::new(),
            description: None,
            project_id: 1,
            test_type: TestType::Api,
            steps: None,
            config: None,
            tags: None,
        })
        .await
        .unwrap_err();
    match err {
        QgError::ApiError { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("field required"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn execute_wait_exit_code_follows_result() {
    let stub = spawn_stub("failed").await;
    let home = tempfile::tempdir().unwrap();
    let base_url = stub.base_url.clone();
    let home_path = home.path().to_path_buf();

    let output = tokio::task::spawn_blocking(move || {
        assert_cmd::Command::cargo_bin("qg")
            .unwrap()
            .env("HOME", &home_path)
            .env("NO_COLOR", "1")
            .env_remove("QG_API_URL")
            .env_remove("QG_TOKEN")
            .args(["--api-url", &base_url, "--json"])
            .args(["test-plan", "execute", "1", "--wait", "--interval", "1"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let execution: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(execution["id"], 41);
    assert_eq!(execution["status"], "failed");
    assert!(String::from_utf8_lossy(&output.stderr).contains("finished with status 'failed'"));
}

#[tokio::test]
async fn review_decisions_send_comment_as_query() {
    let stub = spawn_stub("passed").await;
    let client = stub.client(Some("tok-1"));

    let approved = client.approve_review(7, Some("looks good")).await.unwrap();
    assert_eq!(approved.status, ReviewStatus::Approved);
    let rejected = client.reject_review(8, "missing negative case").await.unwrap();
    assert_eq!(rejected.status, ReviewStatus::Rejected);
    client.approve_review(9, None).await.unwrap();

    let recorded = stub.requests();
    assert_eq!(recorded[0].path, "/test-case-reviews/7/approve");
    assert_eq!(
        recorded[0].query.get("comment").map(String::as_str),
        Some("looks good")
    );
    assert_eq!(recorded[1].path, "/test-case-reviews/8/reject");
    assert_eq!(
        recorded[1].query.get("comment").map(String::as_str),
        Some("missing negative case")
    );
    assert!(recorded[2].query.is_empty());
    assert!(recorded.iter().all(|r| r.body.is_none()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_saves_token_and_url_but_not_env_overrides() {
    let stub = spawn_stub("passed").await;
    let home = tempfile::tempdir().unwrap();
    let config_path = home.path().join("qg.toml");

    let output = run_qg(
        home.path(),
        &[("QG_TIMEOUT", "7")],
        vec![
            "--config-file".into(),
            config_path.display().to_string(),
            "--api-url".into(),
            stub.base_url.clone(),
            "--json".into(),
            "auth".into(),
            "login".into(),
            "-u".into(),
            "alice".into(),
            "-p".into(),
            "s3cret".into(),
        ],
    )
    .await;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let saved = Config::load_file(&config_path).unwrap();
    assert_eq!(saved.api.token.as_deref(), Some("tok-alice"));
    assert_eq!(saved.api.url, stub.base_url);
    assert_eq!(saved.api.timeout_secs, 30);

    let recorded = stub.requests();
    assert_eq!(
        recorded[0].body,
        Some(json!({ "username": "alice", "password": "s3cret" }))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn logout_removes_token_even_when_server_fails() {
    let stub = spawn_stub("passed").await;
    let home = tempfile::tempdir().unwrap();
    let config_path = home.path().join("qg.toml");
    let mut config = Config::default();
    config.set("api.url", &stub.base_url).unwrap();
    config.set("api.token", "tok-old").unwrap();
    config.save_to(&config_path).unwrap();

    let output = run_qg(
        home.path(),
        &[],
        vec![
            "--config-file".into(),
            config_path.display().to_string(),
            "--json".into(),
            "auth".into(),
            "logout".into(),
        ],
    )
    .await;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed, json!({ "logged_out": true }));

    let saved = Config::load_file(&config_path).unwrap();
    assert!(saved.api.token.is_none());
    assert_eq!(saved.api.url, stub.base_url);

    let recorded = stub.requests();
    assert_eq!(recorded[0].path, "/auth/logout");
    assert_eq!(recorded[0].authorization.as_deref(), Some("Bearer tok-old"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watch_accepts_huge_wait_timeout() {
    let stub = spawn_stub("passed").await;
    let home = tempfile::tempdir().unwrap();

    let output = run_qg(
        home.path(),
        &[],
        vec![
            "--api-url".into(),
            stub.base_url.clone(),
            "--json".into(),
            "exec".into(),
            "watch".into(),
            "5".into(),
            "--wait-timeout".into(),
            u64::MAX.to_string(),
        ],
    )
    .await;
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let execution: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(execution["status"], "passed");
}
