//! Integration tests against an in-process mock backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::api::Resource;
use crate::config::Config;
use crate::errors::codes;
use crate::models::{
    project_color, Comment, Credentials, Notification, Priority, ProjectDraft, SubtaskDraft,
    TaskStatus, PROJECT_COLORS,
};
use crate::push::protocol::RECORD_SEPARATOR;
use crate::state::ClientState;
use crate::sync::SyncClient;
use crate::view::{navigate, Navigation, Route};

const USERNAME: &str = "ada";
const PASSWORD: &str = "correct horse";
const USER_ID: &str = "1";
const REFRESH_TOKEN: &str = "refresh-1";

/// How list endpoints shape their bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ListShape {
    Bare,
    Named,
    Bad,
}

struct MockData {
    role: String,
    token_ttl_secs: i64,
    refresh_allowed: bool,
    list_shape: ListShape,
    create_returns_record: bool,
    subtask_returns_record: bool,
    projects: Vec<Value>,
    tasks: Vec<Value>,
    users: Vec<Value>,
    notifications: Vec<Value>,
    comments: HashMap<String, Vec<Value>>,
    attachments: HashMap<String, Vec<Value>>,
    files: HashMap<String, Vec<u8>>,
    push_payloads: Vec<Value>,
    hits: HashMap<&'static str, usize>,
    last_task_patch: Option<Value>,
    last_project_create: Option<Value>,
    next_id: u64,
}

impl MockData {
    fn seeded() -> Self {
        Self {
            role: "Admin".to_string(),
            token_ttl_secs: 3600,
            refresh_allowed: true,
            list_shape: ListShape::Bare,
            create_returns_record: true,
            subtask_returns_record: true,
            projects: vec![json!({
                "id": 1,
                "title": "Website",
                "priority": "high",
                "owner": {"id": 1, "username": "Ada Lovelace", "email": "ada@example.com"},
                "members": [
                    {"id": 2, "username": "Bob", "email": "bob@example.com"},
                    {"id": 3, "username": "Cy", "email": "cy@example.com"}
                ]
            })],
            tasks: vec![
                json!({
                    "id": 10,
                    "title": "Design",
                    "status": "todo",
                    "projectId": 1,
                    "assignees": [{"id": 2, "username": "Bob"}]
                }),
                json!({
                    "id": 11,
                    "title": "Wireframes",
                    "projectId": 1,
                    "parentId": 10,
                    "nestedLevel": 1
                }),
            ],
            users: vec![
                json!({"id": 1, "username": "Ada Lovelace", "email": "ada@example.com"}),
                json!({"id": 2, "username": "Bob", "email": "bob@example.com"}),
                json!({"id": 3, "username": "Cy", "email": "cy@example.com"}),
            ],
            notifications: vec![json!({"id": 100, "message": "Welcome", "isRead": false})],
            comments: HashMap::new(),
            attachments: HashMap::new(),
            files: HashMap::new(),
            push_payloads: Vec::new(),
            hits: HashMap::new(),
            last_task_patch: None,
            last_project_create: None,
            next_id: 1000,
        }
    }

    fn hit(&mut self, key: &'static str) {
        *self.hits.entry(key).or_default() += 1;
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn list(&self, field: &str, items: &[Value]) -> Value {
        match self.list_shape {
            ListShape::Bare => json!(items),
            ListShape::Named => json!({ field: items }),
            ListShape::Bad => json!({ "data": items }),
        }
    }

    fn issue_tokens(&self) -> Value {
        let claims = json!({
            "nameid": USER_ID,
            "unique_name": USERNAME,
            "email": "ada@example.com",
            "role": self.role,
            "exp": chrono::Utc::now().timestamp() + self.token_ttl_secs,
        });
        json!({"accessToken": jwt(&claims), "refreshToken": REFRESH_TOKEN})
    }

    fn task_mut(&mut self, id: &str) -> Option<&mut Value> {
        self.tasks.iter_mut().find(|t| t["id"].to_string() == id)
    }
}

fn jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.mock-signature", header, payload)
}

#[derive(Clone)]
struct Backend {
    data: Arc<Mutex<MockData>>,
}

impl Backend {
    fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap()
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn require_bearer(req: Request, next: Next) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") && v.len() > "Bearer ".len());
    if authorized {
        next.run(req).await
    } else {
        error(StatusCode::UNAUTHORIZED, "Missing bearer token")
    }
}

// ==================== AUTH ====================

async fn login(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    let data = backend.data();
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        Json(json!({ "tokens": data.issue_tokens() })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Invalid username or password")
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body["username"].as_str().is_some_and(|u| u == USERNAME) {
        return error(StatusCode::CONFLICT, "Username is taken");
    }
    Json(json!({"success": true})).into_response()
}

async fn refresh_token(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    let mut data = backend.data();
    data.hit("refresh");
    if data.refresh_allowed && body["userId"] == USER_ID && body["refreshToken"] == REFRESH_TOKEN {
        Json(data.issue_tokens()).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "Invalid refresh token")
    }
}

// ==================== PROJECTS ====================

async fn list_projects(State(backend): State<Backend>) -> Json<Value> {
    let mut data = backend.data();
    data.hit("projects");
    Json(data.list("projects", &data.projects))
}

async fn create_project(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    let mut data = backend.data();
    let id = data.next_id();
    let mut record = body.clone();
    record["id"] = json!(id);
    data.projects.push(record.clone());
    data.last_project_create = Some(body);

    if data.create_returns_record {
        Json(json!({ "project": record }))
    } else {
        Json(json!({ "success": true }))
    }
}

async fn get_project(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    let data = backend.data();
    match data.projects.iter().find(|p| p["id"].to_string() == id) {
        Some(project) => Json(project.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Project not found"),
    }
}

async fn patch_project(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = backend.data();
    let Some(project) = data.projects.iter_mut().find(|p| p["id"].to_string() == id) else {
        return error(StatusCode::NOT_FOUND, "Project not found");
    };
    if let (Some(target), Some(fields)) = (project.as_object_mut(), body.as_object()) {
        target.extend(fields.clone());
    }
    StatusCode::NO_CONTENT.into_response()
}

// ==================== TASKS ====================

async fn list_tasks(State(backend): State<Backend>) -> Json<Value> {
    let mut data = backend.data();
    data.hit("tasks");
    Json(data.list("tasks", &data.tasks))
}

async fn get_task(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    let mut data = backend.data();
    match data.task_mut(&id) {
        Some(task) => Json(json!({ "task": task.clone() })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Task not found"),
    }
}

async fn patch_task(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = backend.data();
    data.hit("task_patch");
    data.last_task_patch = Some(body.clone());
    let Some(task) = data.task_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Task not found");
    };
    if let (Some(target), Some(fields)) = (task.as_object_mut(), body.as_object()) {
        target.extend(fields.clone());
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn assign_task(
    State(backend): State<Backend>,
    Path((id, user_id)): Path<(String, String)>,
) -> Response {
    let mut data = backend.data();
    data.hit("assign");
    let Some(user) = data
        .users
        .iter()
        .find(|u| u["id"].to_string() == user_id)
        .cloned()
    else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };
    let Some(task) = data.task_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Task not found");
    };
    if !task["assignees"].is_array() {
        task["assignees"] = json!([]);
    }
    if let Some(assignees) = task["assignees"].as_array_mut() {
        assignees.push(user);
    }
    Json(json!({"success": true})).into_response()
}

async fn add_subtask(
    State(backend): State<Backend>,
    Path((id, user_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut data = backend.data();
    if data.task_mut(&id).is_none() {
        return error(StatusCode::NOT_FOUND, "Parent task not found");
    }
    let new_id = data.next_id();
    let mut record = body;
    record["id"] = json!(new_id);
    record["parentId"] = json!(id.parse::<u64>().unwrap_or_default());
    record["nestedLevel"] = json!(1);
    record["ownerId"] = json!(user_id);
    data.tasks.push(record.clone());
    if data.subtask_returns_record {
        Json(record).into_response()
    } else {
        Json(json!({"ok": true})).into_response()
    }
}

// ==================== COMMENTS ====================

async fn list_comments(State(backend): State<Backend>, Path(id): Path<String>) -> Json<Value> {
    let data = backend.data();
    let comments = data.comments.get(&id).cloned().unwrap_or_default();
    Json(json!({ "comments": comments }))
}

async fn post_comment(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut data = backend.data();
    let comment_id = data.next_id();
    let record = json!({
        "id": comment_id,
        "content": body["content"],
        "postDate": "2024-01-05T10:00:00Z",
        "updatedAt": "2024-01-05T10:00:00Z",
        "taskId": id.parse::<u64>().unwrap_or_default(),
        "owner": {"id": 1, "username": "Ada Lovelace"}
    });
    data.comments.entry(id).or_default().push(record.clone());
    Json(json!({ "comment": record }))
}

// ==================== ATTACHMENTS ====================

async fn list_attachments(State(backend): State<Backend>, Path(id): Path<String>) -> Json<Value> {
    let mut data = backend.data();
    data.hit("attachments");
    Json(json!(data.attachments.get(&id).cloned().unwrap_or_default()))
}

async fn upload_attachment(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Response {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap().to_vec();
        upload = Some((name, content_type, bytes));
    }
    let Some((name, content_type, bytes)) = upload else {
        return error(StatusCode::BAD_REQUEST, "No file");
    };

    let mut data = backend.data();
    let attachment_id = data.next_id();
    let record = json!({
        "id": attachment_id,
        "attachmentName": name,
        "type": content_type,
        "size": bytes.len(),
        "taskId": id
    });
    data.files.insert(attachment_id.to_string(), bytes);
    data.attachments.entry(id).or_default().push(record);
    StatusCode::CREATED.into_response()
}

async fn download_attachment(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    match backend.data().files.get(&id) {
        Some(bytes) => bytes.clone().into_response(),
        None => error(StatusCode::NOT_FOUND, "Attachment not found"),
    }
}

async fn delete_attachment(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    let mut data = backend.data();
    data.files.remove(&id);
    for list in data.attachments.values_mut() {
        list.retain(|a| a["id"].to_string() != id);
    }
    StatusCode::NO_CONTENT.into_response()
}

// ==================== USERS & NOTIFICATIONS ====================

async fn list_users(State(backend): State<Backend>) -> Json<Value> {
    let mut data = backend.data();
    data.hit("users");
    Json(data.list("users", &data.users))
}

async fn get_user(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    let data = backend.data();
    match data.users.iter().find(|u| u["id"].to_string() == id) {
        Some(user) => Json(json!({ "user": user })).into_response(),
        None => error(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn list_notifications(State(backend): State<Backend>, Path(user_id): Path<String>) -> Response {
    let data = backend.data();
    if user_id != USER_ID {
        return error(StatusCode::FORBIDDEN, "Not your notifications");
    }
    Json(json!({ "notifications": data.notifications })).into_response()
}

async fn read_notification(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    let mut data = backend.data();
    match data.notifications.iter_mut().find(|n| n["id"].to_string() == id) {
        Some(n) => {
            n["isRead"] = json!(true);
            StatusCode::NO_CONTENT.into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Notification not found"),
    }
}

async fn delete_notification(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    let mut data = backend.data();
    data.notifications.retain(|n| n["id"].to_string() != id);
    StatusCode::NO_CONTENT.into_response()
}

// ==================== HUB ====================

async fn hub(State(backend): State<Backend>, ws: WebSocketUpgrade) -> Response {
    let payloads = backend.data().push_payloads.clone();
    ws.on_upgrade(move |socket| hub_session(socket, payloads))
}

async fn hub_session(mut socket: WebSocket, payloads: Vec<Value>) {
    // Handshake first
    match socket.recv().await {
        Some(Ok(WsMessage::Text(_))) => {}
        _ => return,
    }
    let ack = format!("{{}}{}", RECORD_SEPARATOR);
    if socket.send(WsMessage::Text(ack.into())).await.is_err() {
        return;
    }

    for payload in payloads {
        let record = format!(
            "{}{}",
            json!({"type": 1, "target": "notification", "arguments": [payload]}),
            RECORD_SEPARATOR
        );
        if socket.send(WsMessage::Text(record.into())).await.is_err() {
            return;
        }
    }

    while let Some(Ok(message)) = socket.recv().await {
        if let WsMessage::Close(_) = message {
            break;
        }
    }
}

fn create_router(backend: Backend) -> Router {
    let protected = Router::new()
        .route("/Project", get(list_projects).post(create_project))
        .route("/Project/{id}", get(get_project).patch(patch_project))
        .route("/ProjectTask", get(list_tasks))
        .route("/ProjectTask/{id}", get(get_task).patch(patch_task))
        .route("/ProjectTask/{id}/assign/{user_id}", post(assign_task))
        .route("/ProjectTask/{id}/subtask/{user_id}", post(add_subtask))
        .route("/Comment/task/{id}", get(list_comments))
        .route("/Comment/{id}", post(post_comment))
        .route("/Attachment/task/{id}", get(list_attachments))
        .route(
            "/Attachment/{id}",
            post(upload_attachment).delete(delete_attachment),
        )
        .route("/Attachment/{id}/download", get(download_attachment))
        .route("/User", get(list_users))
        .route("/User/{id}", get(get_user))
        .route(
            "/Notification/{id}",
            get(list_notifications).delete(delete_notification),
        )
        .route("/Notification/{id}/read", put(read_notification))
        .layer(middleware::from_fn(require_bearer));

    let auth = Router::new()
        .route("/Auth/login", post(login))
        .route("/Auth/register", post(register))
        .route("/Auth/refresh-token", post(refresh_token));

    Router::new()
        .nest("/api", protected.merge(auth))
        .route("/hubs/notification", get(hub))
        .with_state(backend)
}

/// Test fixture: a mock backend and a scratch storage directory.
struct TestFixture {
    backend: Backend,
    api_base_url: String,
    push_url: String,
    temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_data(MockData::seeded()).await
    }

    async fn with_data(data: MockData) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let backend = Backend {
            data: Arc::new(Mutex::new(data)),
        };
        let app = create_router(backend.clone());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestFixture {
            backend,
            api_base_url: format!("http://{}/api", addr),
            push_url: format!("ws://{}/hubs/notification", addr),
            temp_dir,
        }
    }

    fn config(&self) -> Config {
        let mut config = Config::for_backend(
            &self.api_base_url,
            &self.push_url,
            self.temp_dir.path().join("client.sqlite"),
        );
        config.push_reconnect_delay = Duration::from_millis(100);
        config
    }

    async fn client(&self) -> SyncClient {
        SyncClient::connect(self.config())
            .await
            .expect("Failed to build client")
    }

    async fn logged_in(&self) -> SyncClient {
        let client = self.client().await;
        let report = client.login(&credentials()).await.expect("Login failed");
        assert!(report.is_complete(), "unexpected failures: {:?}", report);
        client
    }

    fn hits(&self, key: &str) -> usize {
        self.backend.data().hits.get(key).copied().unwrap_or(0)
    }
}

fn credentials() -> Credentials {
    Credentials {
        username: USERNAME.to_string(),
        password: PASSWORD.to_string(),
    }
}

/// Poll state until `check` holds or a second passes.
async fn wait_for(client: &SyncClient, check: impl Fn(&ClientState) -> bool) -> bool {
    for _ in 0..50 {
        if check(&*client.state().read().await) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

// ==================== SESSION ====================

#[tokio::test]
async fn test_login_populates_state() {
    let fixture = TestFixture::new().await;
    let client = fixture.client().await;
    assert!(!client.is_authenticated().await);

    let report = client.login(&credentials()).await.unwrap();
    assert!(report.is_complete());
    assert!(client.is_authenticated().await);

    let stored = client.session_store().stored_tokens().await.unwrap();
    assert_eq!(stored.refresh_token, REFRESH_TOKEN);

    let session = client.current_session().await.unwrap();
    assert_eq!(session.user_id, USER_ID);
    assert_eq!(session.username.as_deref(), Some(USERNAME));
    assert_eq!(session.tokens, stored);

    let state = client.snapshot().await;
    assert_eq!(state.projects.len(), 1);
    assert_eq!(state.users.len(), 3);
    assert_eq!(state.tasks.len(), 2);
    assert_eq!(state.notifications.len(), 1);
    assert_eq!(state.projects[0].priority, Priority::High);

    assert_eq!(navigate(Route::Login, true), Navigation::Redirect(Route::Home));
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let fixture = TestFixture::new().await;
    let client = fixture.client().await;

    let err = client
        .login(&Credentials {
            username: USERNAME.to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), codes::UNAUTHORIZED);
    assert_eq!(err.message(), "Invalid username or password");
    assert!(!client.is_authenticated().await);
    assert!(client.session_store().stored_tokens().await.is_none());
    assert_eq!(fixture.hits("projects"), 0);
    assert_eq!(
        navigate(Route::Tasks, client.is_authenticated().await),
        Navigation::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn test_signup_does_not_log_in() {
    let fixture = TestFixture::new().await;
    let client = fixture.client().await;

    let request = crate::models::SignupRequest {
        username: "grace".to_string(),
        email: "grace@example.com".to_string(),
        password: "hopper".to_string(),
    };
    client.signup(&request).await.unwrap();
    assert!(!client.is_authenticated().await);

    let taken = crate::models::SignupRequest {
        username: USERNAME.to_string(),
        ..request.clone()
    };
    let err = client.signup(&taken).await.unwrap_err();
    assert_eq!(err.error_code(), codes::HTTP_ERROR);
    assert_eq!(err.message(), "HTTP 409: Username is taken");

    let blank = crate::models::SignupRequest {
        username: " ".to_string(),
        ..request
    };
    let err = client.signup(&blank).await.unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);
}

#[tokio::test]
async fn test_init_restores_valid_session() {
    let fixture = TestFixture::new().await;
    let first = fixture.logged_in().await;
    first.shutdown().await;
    drop(first);

    let client = fixture.client().await;
    let report = client.init().await.expect("session should be restored");
    assert!(report.is_complete());
    assert!(client.is_authenticated().await);
    assert_eq!(fixture.hits("refresh"), 0);
    assert_eq!(client.snapshot().await.tasks.len(), 2);
}

#[tokio::test]
async fn test_init_refreshes_expired_session() {
    let mut data = MockData::seeded();
    data.token_ttl_secs = -60;
    let fixture = TestFixture::with_data(data).await;

    let first = fixture.logged_in().await;
    first.shutdown().await;
    drop(first);
    let expired = fixture
        .client()
        .await
        .session_store()
        .stored_tokens()
        .await
        .unwrap();

    fixture.backend.data().token_ttl_secs = 3600;
    let client = fixture.client().await;
    assert!(client.session_store().is_token_valid().await.is_none());

    client.init().await.expect("expired session should be refreshed");
    assert_eq!(fixture.hits("refresh"), 1);

    let session = client.current_session().await.unwrap();
    assert_ne!(session.tokens.access_token, expired.access_token);
    assert!(client.session_store().is_token_valid().await.is_some());
}

#[tokio::test]
async fn test_init_failed_refresh_clears_tokens() {
    let mut data = MockData::seeded();
    data.token_ttl_secs = -60;
    data.refresh_allowed = false;
    let fixture = TestFixture::with_data(data).await;

    let first = fixture.logged_in().await;
    first.shutdown().await;
    drop(first);

    let client = fixture.client().await;
    assert!(client.init().await.is_none());
    assert!(!client.is_authenticated().await);
    assert!(client.session_store().stored_tokens().await.is_none());
}

#[tokio::test]
async fn test_logout_closes_push_and_clears_tokens() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;
    assert!(client.is_push_active().await);

    client.logout().await.unwrap();

    assert!(!client.is_push_active().await);
    assert!(!client.is_authenticated().await);
    assert!(!client.api().has_access_token().await);
    assert!(client.session_store().stored_tokens().await.is_none());
    let state = client.snapshot().await;
    assert!(state.projects.is_empty());
    assert!(state.notifications.is_empty());
    assert!(client.init().await.is_none());
}

// ==================== FETCHING ====================

#[tokio::test]
async fn test_named_list_bodies_match_bare_arrays() {
    let bare = TestFixture::new().await;
    let bare_state = bare.logged_in().await.snapshot().await;

    let mut data = MockData::seeded();
    data.list_shape = ListShape::Named;
    let named = TestFixture::with_data(data).await;
    let named_state = named.logged_in().await.snapshot().await;

    assert_eq!(bare_state.projects, named_state.projects);
    assert_eq!(bare_state.tasks, named_state.tasks);
    assert_eq!(bare_state.users, named_state.users);
}

#[tokio::test]
async fn test_unrecognized_list_bodies_degrade_to_empty() {
    let mut data = MockData::seeded();
    data.list_shape = ListShape::Bad;
    let fixture = TestFixture::with_data(data).await;
    let client = fixture.client().await;

    let report = client.login(&credentials()).await.unwrap();
    assert!(!report.is_complete());
    for resource in [Resource::Projects, Resource::Tasks, Resource::Users] {
        let err = report.failure(resource).unwrap();
        assert_eq!(err.error_code(), codes::DECODE_ERROR);
    }
    assert!(report.failure(Resource::Notifications).is_none());

    let state = client.snapshot().await;
    assert!(state.projects.is_empty());
    assert!(state.tasks.is_empty());
    assert!(state.users.is_empty());
    assert_eq!(state.notifications.len(), 1);

    let err = client.refresh_projects().await.unwrap_err();
    assert_eq!(err.error_code(), codes::DECODE_ERROR);
}

// ==================== PROJECTS ====================

#[tokio::test]
async fn test_create_project_appends_with_palette_color() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    let created = client
        .create_project(ProjectDraft {
            title: "Launch".to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-02-01".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .expect("record should be returned");

    let expected_color = PROJECT_COLORS[1 % PROJECT_COLORS.len()];
    assert_eq!(project_color(1), expected_color);

    let sent = fixture.backend.data().last_project_create.clone().unwrap();
    assert_eq!(sent["title"], "Launch");
    assert_eq!(sent["color"], expected_color);
    assert_eq!(sent["startDate"], "2024-01-01");
    assert_eq!(sent["priority"], "Medium");

    let state = client.snapshot().await;
    assert_eq!(state.projects.len(), 2);
    assert_eq!(state.projects[1], created);
    assert_eq!(created.color.as_deref(), Some(expected_color));
}

#[tokio::test]
async fn test_create_project_without_record_refetches() {
    let mut data = MockData::seeded();
    data.create_returns_record = false;
    let fixture = TestFixture::with_data(data).await;
    let client = fixture.logged_in().await;
    let fetches = fixture.hits("projects");

    let created = client
        .create_project(ProjectDraft {
            title: "Launch".to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-02-01".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(created.is_none());
    assert_eq!(fixture.hits("projects"), fetches + 1);
    let state = client.snapshot().await;
    assert_eq!(state.projects.len(), 2);
    assert_eq!(state.projects[1].title, "Launch");
}

#[tokio::test]
async fn test_create_project_validates_before_sending() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    let err = client
        .create_project(ProjectDraft {
            title: "  ".to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-02-01".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);

    let err = client
        .create_project(ProjectDraft {
            title: "Launch".to_string(),
            start_date: "01/01/2024".to_string(),
            end_date: "2024-02-01".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);

    assert!(fixture.backend.data().last_project_create.is_none());
    assert_eq!(client.snapshot().await.projects.len(), 1);
}

#[tokio::test]
async fn test_update_project_patches_state() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    let update = crate::models::UpdateProjectRequest {
        title: Some("Website v2".to_string()),
        ..Default::default()
    };
    client.update_project("1", &update).await.unwrap();

    assert_eq!(client.snapshot().await.projects[0].title, "Website v2");
    assert_eq!(fixture.backend.data().projects[0]["title"], "Website v2");

    let err = client.update_project("404", &update).await.unwrap_err();
    assert_eq!(err.error_code(), codes::NOT_FOUND);
}

// ==================== TASKS ====================

#[tokio::test]
async fn test_update_task_sends_only_changed_fields() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    let original = client.snapshot().await.task("10").cloned().unwrap();
    let mut edited = original.clone();
    edited.title = "Design system".to_string();
    edited.status = TaskStatus::InProgress;

    let update = client.update_task(&original, &edited).await.unwrap();
    assert!(!update.is_empty());

    let sent = fixture.backend.data().last_task_patch.clone().unwrap();
    assert_eq!(sent, json!({"title": "Design system", "status": "in_progress"}));

    let task = client.snapshot().await.task("10").cloned().unwrap();
    assert_eq!(task.title, "Design system");
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.assignees, original.assignees);

    let unchanged = client.update_task(&task, &task).await.unwrap();
    assert!(unchanged.is_empty());
    assert_eq!(fixture.hits("task_patch"), 1);
}

#[tokio::test]
async fn test_assign_same_user_twice_calls_once() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    let ids = vec!["3".to_string(), "3".to_string()];
    let report = client.assign_users("10", &ids).await.unwrap();
    assert_eq!(report.assigned, vec!["3"]);
    assert_eq!(report.skipped, vec!["3"]);
    assert!(report.failed.is_empty());
    assert_eq!(fixture.hits("assign"), 1);

    // Already assigned locally: no second call
    let report = client.assign_users("10", &["3".to_string()]).await.unwrap();
    assert!(report.assigned.is_empty());
    assert_eq!(report.skipped, vec!["3"]);
    assert_eq!(fixture.hits("assign"), 1);

    let task = client.snapshot().await.task("10").cloned().unwrap();
    let assignee_ids: Vec<&str> = task.assignees.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(assignee_ids, vec!["2", "3"]);
    assert_eq!(task.assignees[1].username.as_deref(), Some("Cy"));
}

#[tokio::test]
async fn test_assign_reports_partial_failure() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    let ids = vec!["99".to_string(), "1".to_string()];
    let report = client.assign_users("10", &ids).await.unwrap();
    assert!(report.is_partial());
    assert_eq!(report.assigned, vec!["1"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "99");
    assert_eq!(report.failed[0].1.error_code(), codes::NOT_FOUND);
    assert_eq!(fixture.hits("assign"), 2);

    let task = client.snapshot().await.task("10").cloned().unwrap();
    assert!(task.is_assigned("1"));
    assert!(!task.is_assigned("99"));
}

#[tokio::test]
async fn test_contributor_cannot_assign() {
    let mut data = MockData::seeded();
    data.role = "Contributor".to_string();
    let fixture = TestFixture::with_data(data).await;
    let client = fixture.logged_in().await;

    let err = client
        .assign_users("10", &["3".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), codes::FORBIDDEN);
    assert_eq!(fixture.hits("assign"), 0);
}

#[tokio::test]
async fn test_add_subtask_appends_created_record() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    let draft = SubtaskDraft {
        title: "Color palette".to_string(),
        description: "Pick eight".to_string(),
        priority: Priority::Low,
        ..Default::default()
    };
    let created = client.add_subtask("10", &draft).await.unwrap().unwrap();
    assert_eq!(created.parent_id.as_deref(), Some("10"));
    assert!(created.is_subtask_of("10"));

    let state = client.snapshot().await;
    let subtasks: Vec<String> = state.subtasks_of("10").into_iter().map(|t| t.title).collect();
    assert_eq!(subtasks, vec!["Wireframes", "Color palette"]);

    let err = client.add_subtask("404", &draft).await.unwrap_err();
    assert_eq!(err.error_code(), codes::NOT_FOUND);
    assert_eq!(client.snapshot().await.tasks.len(), 3);
}

#[tokio::test]
async fn test_add_subtask_without_record_refetches() {
    let mut data = MockData::seeded();
    data.subtask_returns_record = false;
    let fixture = TestFixture::with_data(data).await;
    let client = fixture.logged_in().await;
    let fetches = fixture.hits("tasks");

    let draft = SubtaskDraft {
        title: "Color palette".to_string(),
        ..Default::default()
    };
    let created = client.add_subtask("10", &draft).await.unwrap();

    assert!(created.is_none());
    assert_eq!(fixture.hits("tasks"), fetches + 1);
    let titles: Vec<String> = client
        .snapshot()
        .await
        .subtasks_of("10")
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Wireframes", "Color palette"]);
}

#[tokio::test]
async fn test_load_task_details_without_project() {
    let fixture = TestFixture::new().await;
    fixture
        .backend
        .data()
        .tasks
        .push(json!({"id": 12, "title": "Orphan", "projectId": 404}));
    let client = fixture.logged_in().await;

    let details = client.load_task_details("12").await.unwrap();
    assert_eq!(details.task.title, "Orphan");
    assert!(details.people.is_empty());
    assert!(client.snapshot().await.task("12").is_some());
}

#[tokio::test]
async fn test_load_task_details() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    let details = client.load_task_details("10").await.unwrap();
    assert_eq!(details.task.title, "Design");
    assert!(details.attachments.is_empty());
    assert!(details.comments.is_empty());

    let subtasks: Vec<&str> = details.subtasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(subtasks, vec!["11"]);

    // Owner first, Bob is already assigned
    let people: Vec<&str> = details.people.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(people, vec!["1", "3"]);
    assert_eq!(details.people[0].role, "Owner");

    let err = client.load_task_details("404").await.unwrap_err();
    assert_eq!(err.error_code(), codes::NOT_FOUND);
}

// ==================== COMMENTS & ATTACHMENTS ====================

#[tokio::test]
async fn test_add_comment_appends_server_record() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    let comment = client.add_comment("10", "Looks good").await.unwrap();

    let stored = fixture.backend.data().comments["10"][0].clone();
    let expected: Comment = serde_json::from_value(stored).unwrap();
    assert_eq!(comment, expected);
    assert_eq!(comment.content, "Looks good");
    assert_eq!(comment.post_date.as_deref(), Some("2024-01-05T10:00:00Z"));
    assert_eq!(comment.extra["updatedAt"], "2024-01-05T10:00:00Z");

    let state = client.snapshot().await;
    assert_eq!(state.comments_for("10"), &[expected]);
    assert_eq!(
        state.comments_for("10")[0].extra["updatedAt"],
        "2024-01-05T10:00:00Z"
    );

    let err = client.add_comment("10", "   ").await.unwrap_err();
    assert_eq!(err.error_code(), codes::VALIDATION_ERROR);
    assert_eq!(client.snapshot().await.comments_for("10").len(), 1);
}

#[tokio::test]
async fn test_attachment_changes_refetch_list() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;
    let contents = b"meeting notes".to_vec();

    let attachments = client
        .upload_attachment("10", "notes.txt", contents.clone(), Some("text/plain"))
        .await
        .unwrap();
    assert_eq!(fixture.hits("attachments"), 1);
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].name, "notes.txt");
    assert_eq!(attachments[0].content_type.as_deref(), Some("text/plain"));
    assert_eq!(attachments[0].size, Some(contents.len() as u64));
    assert_eq!(client.snapshot().await.attachments_for("10"), attachments.as_slice());

    let bytes = client.download_attachment(&attachments[0].id).await.unwrap();
    assert_eq!(bytes, contents);

    let download_dir = fixture.temp_dir.path().join("downloads");
    let path = client
        .save_attachment(&attachments[0], &download_dir)
        .await
        .unwrap();
    assert_eq!(path, download_dir.join("notes.txt"));
    assert_eq!(std::fs::read(&path).unwrap(), contents);

    let remaining = client
        .remove_attachment("10", &attachments[0].id)
        .await
        .unwrap();
    assert!(remaining.is_empty());
    assert_eq!(fixture.hits("attachments"), 2);
    assert!(client.snapshot().await.attachments_for("10").is_empty());
}

// ==================== NOTIFICATIONS ====================

#[tokio::test]
async fn test_push_notification_appends_one() {
    let payload = json!({
        "message": "You were assigned to Design",
        "taskId": 10
    });
    let mut data = MockData::seeded();
    data.push_payloads = vec![payload.clone()];
    let fixture = TestFixture::with_data(data).await;
    let client = fixture.logged_in().await;

    assert!(wait_for(&client, |s| s.notifications.len() == 2).await);

    // Nothing else arrives
    tokio::time::sleep(Duration::from_millis(100)).await;
    let state = client.snapshot().await;
    assert_eq!(state.notifications.len(), 2);

    assert_eq!(state.notifications[1].payload(), &payload);
    assert_eq!(state.notifications[1], Notification::new(payload));
    assert_eq!(state.notifications[1].field("taskId"), Some(&json!(10)));
    assert_eq!(state.unread_count(), 2);
}

#[tokio::test]
async fn test_notification_read_and_delete() {
    let fixture = TestFixture::new().await;
    let client = fixture.logged_in().await;

    client.mark_notification_read("100").await.unwrap();
    assert_eq!(client.snapshot().await.unread_count(), 0);
    assert_eq!(fixture.backend.data().notifications[0]["isRead"], true);

    client.delete_notification("100").await.unwrap();
    assert!(client.snapshot().await.notifications.is_empty());
    assert!(fixture.backend.data().notifications.is_empty());

    let err = client.mark_notification_read("100").await.unwrap_err();
    assert_eq!(err.error_code(), codes::NOT_FOUND);
}

#[tokio::test]
async fn test_requests_without_session_are_unauthorized() {
    let fixture = TestFixture::new().await;
    let client = fixture.client().await;

    let err = client.refresh_tasks().await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(client.snapshot().await.tasks.is_empty());

    let draft = SubtaskDraft {
        title: "x".to_string(),
        ..Default::default()
    };
    let err = client.add_subtask("10", &draft).await.unwrap_err();
    assert_eq!(err.error_code(), codes::UNAUTHORIZED);
}
