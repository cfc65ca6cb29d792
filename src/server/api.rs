use crate::config::IdPolicy;
use crate::error::{ GatewayError, GatewayResult };
use crate::models::route::Route;
use crate::server::AppState;
use crate::server::proxy::Relayed;
use axum::{
    body::Bytes,
    extract::State,
    http::{ Method, Uri },
    routing::{ get, post, MethodRouter },
    Json,
    Router,
};
use log::warn;
use serde_json::{ json, Value };
use uuid::Uuid;

pub fn api_routes() -> Router<AppState> {
    Route::ALL
        .iter()
        .fold(Router::new(), |router, route| router.route(route.path(), forward_to(*route)))
        .route("/health", get(health_check))
}

fn forward_to(route: Route) -> MethodRouter<AppState> {
    let handler = move |State(state): State<AppState>, uri: Uri, body: Bytes| async move {
        forward(&state, route, &uri, &body).await
    };
    if route.method() == Method::GET { get(handler) } else { post(handler) }
}

async fn forward(state: &AppState, route: Route, uri: &Uri, body: &[u8]) -> GatewayResult<Relayed> {
    let mut payload = parse_body(body)?;

    let creating = route == Route::CreateConversation;
    if creating && state.id_policy == IdPolicy::Gateway {
        payload = json!({ "conversation_id": new_conversation_id() });
    }

    let mut relayed = state.proxy.forward(route.method(), route.path(), uri.query(), &payload).await?;

    if creating && state.id_policy == IdPolicy::Upstream && relayed.status.is_success() {
        ensure_conversation_id(&mut relayed.body);
    }
    Ok(relayed)
}

/// Client body as JSON; an absent body is forwarded as `{}`.
fn parse_body(body: &[u8]) -> GatewayResult<Value> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| GatewayError::BadRequest(e.to_string()))
}

pub fn new_conversation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Inserts a gateway-generated id when upstream answered without one.
fn ensure_conversation_id(body: &mut Value) {
    if let Some(obj) = body.as_object_mut() {
        let present = obj
            .get("conversation_id")
            .and_then(Value::as_str)
            .map_or(false, |id| !id.is_empty());
        if !present {
            let id = new_conversation_id();
            warn!("Upstream created a conversation without an id; assigning {}", id);
            obj.insert("conversation_id".into(), Value::String(id));
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "counsel-gateway",
        "upstream": state.proxy.upstream().base_url(),
    }))
}
