use axum::{ extract::Request, middleware::Next, response::Response };
use chrono::Utc;
use log::{ info, warn };
use std::future::Future;
use std::time::Instant;

tokio::task_local! {
    static SERVING_REQUEST: ();
}

/// Runs `fut` marked as request handling; see [`serving_request`].
pub async fn within_request<F: Future>(fut: F) -> F::Output {
    SERVING_REQUEST.scope((), fut).await
}

/// True while the current task is polling a request handler.
pub fn serving_request() -> bool {
    SERVING_REQUEST.try_with(|_| ()).is_ok()
}

/// Logs every inbound request and the status it was answered with.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started = Instant::now();
    info!("[{}] {} {}", Utc::now().to_rfc3339(), method, uri);

    let response = within_request(next.run(req)).await;

    let status = response.status();
    if status.is_server_error() {
        warn!("{} {} -> {} in {:?}", method, uri, status, started.elapsed());
    } else {
        info!("{} {} -> {} in {:?}", method, uri, status, started.elapsed());
    }
    response
}
