//! Forwarding of a single inbound call to the upstream counsellor API.
//!
//! The upstream status and JSON body are relayed unchanged. Anything else is
//! turned into a [`GatewayError`]: unreachable upstream → 503, non-JSON or
//! unparseable upstream body → 502, failure to build the call → 500.

use crate::config::UpstreamConfig;
use crate::error::{ GatewayError, GatewayResult };
use axum::http::{ header, HeaderValue, Method, StatusCode };
use axum::response::{ IntoResponse, Response };
use axum::Json;
use lazy_static::lazy_static;
use log::{ debug, error, info, warn };
use regex::Regex;
use serde_json::Value;

/// Longest excerpt of a raw upstream body echoed back in `details` or logs.
pub const EXCERPT_LIMIT: usize = 200;

pub const INVALID_RESPONSE: &str = "Received invalid response from API server";
pub const UNPROCESSABLE_RESPONSE: &str = "Failed to process API response";

lazy_static! {
    static ref PARAGRAPH: Regex = Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p\s*>").unwrap();
    static ref TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Upstream reply that is relayed as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Relayed {
    pub status: StatusCode,
    pub body: Value,
}

impl IntoResponse for Relayed {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Clone)]
pub struct Proxy {
    client: reqwest::Client,
    upstream: UpstreamConfig,
}

impl Proxy {
    pub fn new(upstream: UpstreamConfig) -> Result<Self, reqwest::Error> {
        // One upstream connection per inbound request: nothing is kept idle.
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);
        if let Some(timeout) = upstream.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { client: builder.build()?, upstream })
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }

    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: &Value
    ) -> GatewayResult<Relayed> {
        let url = self.upstream.url_for(path, query).map_err(GatewayError::internal)?;
        let payload = serde_json::to_vec(body).map_err(GatewayError::internal)?;

        info!("Proxying {} request to: {}", method, url);
        debug!("Upstream request body: {}", excerpt(&String::from_utf8_lossy(&payload)));

        let request = self.client
            .request(method, url.clone())
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .header(header::CONTENT_LENGTH, payload.len())
            .body(payload)
            .build()
            .map_err(|e| {
                error!("Failed to build upstream request for {}: {}", url, e);
                GatewayError::internal(e)
            })?;

        let response = self.client.execute(request).await.map_err(|e| {
            error!("Proxy request error for {}: {}", url, e);
            GatewayError::UpstreamUnavailable(e.to_string())
        })?;

        relay(response).await
    }
}

async fn relay(response: reqwest::Response) -> GatewayResult<Relayed> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase())
        .unwrap_or_default();

    let raw = response.bytes().await.map_err(|e| {
        error!("Failed to read upstream response body: {}", e);
        GatewayError::BadGateway {
            message: UNPROCESSABLE_RESPONSE.into(),
            details: e.to_string(),
        }
    })?;
    let text = String::from_utf8_lossy(&raw);

    info!("API Response Status: {}", status);
    debug!("API Response Body: {}", excerpt(&text));

    if !content_type.contains("application/json") {
        warn!("Received non-JSON response from API ({})", content_type);
        return Err(GatewayError::BadGateway {
            message: paragraph_text(&text).unwrap_or_else(|| INVALID_RESPONSE.to_string()),
            details: excerpt(&text),
        });
    }

    match serde_json::from_slice::<Value>(&raw) {
        Ok(body) => Ok(Relayed { status, body }),
        Err(e) => {
            error!("Error handling API response: {}", e);
            Err(GatewayError::BadGateway {
                message: UNPROCESSABLE_RESPONSE.into(),
                details: e.to_string(),
            })
        }
    }
}

/// First [`EXCERPT_LIMIT`] characters of `text`.
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_LIMIT).collect()
}

/// Best-effort text of the first `<p>` element in an HTML error page.
pub fn paragraph_text(html: &str) -> Option<String> {
    let inner = PARAGRAPH.captures(html)?.get(1)?.as_str();
    let stripped = TAG.replace_all(inner, "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() { None } else { Some(collapsed) }
}
