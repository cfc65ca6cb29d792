use clap::{ Parser, Subcommand, Args as ClapArgs };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false", global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the forwarding gateway (default).
    Serve,
    /// Chat with the counsellor from the terminal through a running gateway.
    Chat(ChatArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GatewayArgs {
    // --- Listener Args ---
    /// Host address and port for the gateway to listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:3000")]
    pub listen_addr: String,

    /// Directory holding the web client's static assets (index.html, main.js, ...).
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: String,

    // --- Upstream Args ---
    /// Protocol used to reach the counsellor API (http or https).
    #[arg(long, env = "UPSTREAM_PROTOCOL", default_value = "http")]
    pub upstream_protocol: String,

    /// Hostname of the counsellor API.
    #[arg(long, env = "UPSTREAM_HOST", default_value = "localhost")]
    pub upstream_host: String,

    /// Port of the counsellor API.
    #[arg(long, env = "UPSTREAM_PORT", default_value = "5000")]
    pub upstream_port: u16,

    /// Optional timeout in seconds for a single upstream call. Unset means transport default.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Who allocates conversation ids on create_conversation (upstream, gateway).
    /// With "upstream" the gateway only fills in an id when upstream omits one.
    #[arg(long, env = "CONVERSATION_IDS", default_value = "upstream")]
    pub conversation_ids: String,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    /// Base URL of a running gateway.
    #[arg(long, env = "GATEWAY_URL", default_value = "http://127.0.0.1:3000")]
    pub gateway_url: String,

    /// Display name used for your messages.
    #[arg(long, default_value = "User")]
    pub name: String,
}
