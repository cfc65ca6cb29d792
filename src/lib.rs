pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod supervisor;

use cli::GatewayArgs;
use config::GatewayConfig;
use log::info;
use server::Server;
use std::error::Error;
use supervisor::Supervisor;

/// Runs the gateway under a [`Supervisor`] and returns the process exit code.
pub async fn run(args: GatewayArgs) -> Result<i32, Box<dyn Error + Send + Sync>> {
    let config = GatewayConfig::from_args(&args)?;

    info!("--- Gateway Configuration ---");
    info!("Listen Address: {}", config.listen_addr);
    info!("Upstream API: {}", config.upstream.base_url());
    info!("Upstream Timeout: {:?}", config.upstream.timeout);
    info!("Static Directory: {}", config.static_dir.display());
    info!("Conversation Ids: {:?}", config.id_policy);
    info!("TLS Enabled: {}", config.tls.is_some());
    info!("-----------------------------");

    let supervisor = Supervisor::new();
    supervisor.install_panic_hook();

    let server = Server::new(config);
    let outcome = supervisor.supervise(server.run(supervisor.shutdown_signal())).await;
    info!("Gateway stopped: {:?}", outcome);

    Ok(outcome.exit_code())
}
