pub mod api;
pub mod assets;
pub mod logging;
pub mod proxy;

use crate::config::{ GatewayConfig, IdPolicy };
use crate::error::GatewayError;
use axum::{ middleware, response::{ IntoResponse, Response }, Router };
use log::{ error, info };
use proxy::Proxy;
use std::any::Any;
use std::error::Error;
use std::future::Future;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{ Any as AnyOrigin, CorsLayer };

#[derive(Clone)]
pub struct AppState {
    pub proxy: Proxy,
    pub id_policy: IdPolicy,
}

impl AppState {
    pub fn new(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            proxy: Proxy::new(config.upstream.clone())?,
            id_policy: config.id_policy,
        })
    }
}

pub fn router(state: AppState, config: &GatewayConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .merge(api::api_routes())
        .merge(assets::static_routes(&config.static_dir))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(logging::log_requests))
        .layer(cors)
        .with_state(state)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    GatewayError::Internal {
        message: "Unexpected gateway fault".into(),
        details,
    }.into_response()
}

pub struct Server {
    config: GatewayConfig,
}

impl Server {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Serves until `shutdown` resolves, then stops accepting connections and
    /// drains the ones in flight.
    pub async fn run<F>(self, shutdown: F) -> Result<(), Box<dyn Error + Send + Sync>>
        where F: Future<Output = ()> + Send + 'static
    {
        let state = AppState::new(&self.config)?;
        let app = router(state, &self.config);
        let addr = self.config.listen_addr;

        match &self.config.tls {
            Some(tls) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    tls.cert_path,
                    tls.key_path
                );
                let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                    &tls.cert_path,
                    &tls.key_path
                ).await?;

                let handle = axum_server::Handle::new();
                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    shutdown.await;
                    shutdown_handle.graceful_shutdown(None::<Duration>);
                });

                info!("Frontend server running at https://{}", addr);
                axum_server::bind_rustls(addr, tls_config)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                    .map_err(|e| {
                        error!("HTTPS server error: {}", e);
                        e
                    })?;
            }
            None => {
                let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                    error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                    e
                })?;
                info!("Frontend server running at http://{}", listener.local_addr()?);
                axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
            }
        }

        info!("Server closed");
        Ok(())
    }
}
