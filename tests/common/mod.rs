#![allow(dead_code)]

use axum::body::{ Body, Bytes };
use axum::http::{ header, HeaderMap, Method, Request, StatusCode, Uri };
use axum::routing::{ get as get_route, post };
use axum::{ Json, Router };
use counsel_gateway::client::{ BannerId, ChatView };
use counsel_gateway::config::{ GatewayConfig, IdPolicy, UpstreamConfig };
use counsel_gateway::models::chat::Message;
use counsel_gateway::server::{ router, AppState };
use serde_json::{ json, Value };
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::Mutex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceExt;

pub const REPLY: &str = "How does that make you feel?";

/// Serves `app` on an ephemeral local port.
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Like [`spawn`], but the server stops (and frees its port) once the sender fires.
pub async fn spawn_stoppable(app: Router) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });
    (addr, tx, handle)
}

/// A port nothing is listening on.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn gateway_config(upstream_port: u16, id_policy: IdPolicy) -> GatewayConfig {
    GatewayConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        upstream: UpstreamConfig::new("http", "127.0.0.1", upstream_port),
        static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/public")),
        id_policy,
        tls: None,
    }
}

pub fn gateway(upstream_port: u16, id_policy: IdPolicy) -> Router {
    let config = gateway_config(upstream_port, id_policy);
    router(AppState::new(&config).unwrap(), &config)
}

pub async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("read body");
    let json = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).expect("parse JSON") };
    (status, json)
}

pub fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

/// Upstream that answers every route with a description of what it received.
pub fn echo_upstream() -> Router {
    let mut app = Router::new();
    for path in [
        "/create_conversation",
        "/send_message",
        "/generate_message",
        "/generate_report",
        "/delete_conversation",
    ] {
        app = app.route(path, post(echo));
    }
    app.route("/get_messages", get_route(echo))
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let header_str = |name: header::HeaderName| {
        headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "content_length": header_str(header::CONTENT_LENGTH),
        "content_type": header_str(header::CONTENT_TYPE),
        "body_len": body.len(),
        "body": serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null),
    }))
}

/// Well-behaved counsellor API.
pub fn counsellor_upstream() -> Router {
    Router::new()
        .route("/create_conversation", post(|| async { Json(json!({ "conversation_id": "abc-123" })) }))
        .route("/send_message", post(|| async { Json(json!({})) }))
        .route("/generate_message", post(|| async { Json(json!({ "response": REPLY })) }))
        .route("/generate_report", post(|| async { Json(json!({ "response": "Session summary" })) }))
        .route(
            "/get_messages",
            get_route(|| async {
                Json(json!([
                    { "author_id": "user-1", "author_name": "User", "content": "hello" },
                    { "author_id": "counsellor", "author_name": "Counsellor", "content": REPLY }
                ]))
            })
        )
        .route(
            "/delete_conversation",
            post(|| async { (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown conversation" }))) })
        )
}

/// Upstream whose answers are not usable JSON.
pub fn broken_upstream(plain_body: String) -> Router {
    Router::new()
        .route(
            "/generate_report",
            post(move || {
                let body = plain_body.clone();
                async move {
                    (StatusCode::INTERNAL_SERVER_ERROR, [(header::CONTENT_TYPE, "text/plain")], body)
                }
            })
        )
        .route(
            "/generate_message",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/html")],
                    "<html><body><h1>Internal Server Error</h1><p>The server hit a snag.</p></body></html>",
                )
            })
        )
        .route(
            "/send_message",
            post(|| async { ([(header::CONTENT_TYPE, "application/json")], "{\"ack\": tru") })
        )
        .route("/create_conversation", post(|| async { Json(json!({ "status": "created" })) }))
}

#[derive(Default)]
pub struct RecordingView {
    transcript: Mutex<Vec<Message>>,
    banners: Mutex<Vec<(BannerId, String)>>,
    report: Mutex<Option<String>>,
    next_banner: AtomicU64,
}

impl RecordingView {
    pub fn transcript(&self) -> Vec<Message> {
        self.transcript.lock().unwrap().clone()
    }

    pub fn banners(&self) -> Vec<String> {
        self.banners.lock().unwrap().iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn report(&self) -> Option<String> {
        self.report.lock().unwrap().clone()
    }
}

impl ChatView for RecordingView {
    fn clear_transcript(&self) {
        self.transcript.lock().unwrap().clear();
    }

    fn clear_report(&self) {
        *self.report.lock().unwrap() = None;
    }

    fn clear_input(&self) {}

    fn append_message(&self, message: &Message) {
        self.transcript.lock().unwrap().push(message.clone());
    }

    fn show_report(&self, text: &str) {
        *self.report.lock().unwrap() = Some(text.to_string());
    }

    fn show_error(&self, text: &str) -> BannerId {
        let id = BannerId(self.next_banner.fetch_add(1, Ordering::SeqCst));
        self.banners.lock().unwrap().push((id, text.to_string()));
        id
    }

    fn remove_banner(&self, id: BannerId) {
        self.banners.lock().unwrap().retain(|(banner, _)| *banner != id);
    }
}
