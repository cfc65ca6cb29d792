use crate::cli::GatewayArgs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid listen address '{0}': {1}")]
    ListenAddr(String, std::net::AddrParseError),
    #[error("Invalid upstream URL '{0}': {1}")]
    UpstreamUrl(String, url::ParseError),
    #[error("Unsupported upstream protocol '{0}' (expected http or https)")]
    Protocol(String),
    #[error("Unknown conversation id policy '{0}' (expected upstream or gateway)")]
    IdPolicy(String),
    #[error("Both --tls-cert-path and --tls-key-path must be provided to enable TLS")]
    IncompleteTls,
}

/// Which side allocates the id handed out by `create_conversation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Upstream allocates; the gateway fills one in only when upstream omits it.
    #[default]
    Upstream,
    /// The gateway always generates the id and sends it upstream.
    Gateway,
}

impl FromStr for IdPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upstream" => Ok(IdPolicy::Upstream),
            "gateway" => Ok(IdPolicy::Gateway),
            other => Err(ConfigError::IdPolicy(other.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub timeout: Option<Duration>,
}

impl UpstreamConfig {
    pub fn new(protocol: &str, host: &str, port: u16) -> Self {
        Self {
            protocol: protocol.to_string(),
            host: host.to_string(),
            port,
            timeout: None,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// Full upstream URL for `path`, carrying the inbound query string verbatim.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> Result<Url, ConfigError> {
        let raw = match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", self.base_url(), path, q),
            _ => format!("{}{}", self.base_url(), path),
        };
        Url::parse(&raw).map_err(|e| ConfigError::UpstreamUrl(raw, e))
    }
}

#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub cert_path: String,
    pub key_path: String,
}

/// Everything the gateway needs at startup. Built once and handed to the server.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub listen_addr: SocketAddr,
    pub upstream: UpstreamConfig,
    pub static_dir: PathBuf,
    pub id_policy: IdPolicy,
    pub tls: Option<TlsConfig>,
}

impl GatewayConfig {
    pub fn from_args(args: &GatewayArgs) -> Result<Self, ConfigError> {
        let listen_addr = args.listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ListenAddr(args.listen_addr.clone(), e))?;

        let protocol = args.upstream_protocol.trim().to_lowercase();
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::Protocol(args.upstream_protocol.clone()));
        }

        let mut upstream = UpstreamConfig::new(&protocol, &args.upstream_host, args.upstream_port);
        upstream.timeout = args.upstream_timeout_secs.map(Duration::from_secs);
        // Fail at startup rather than on the first proxied request.
        upstream.url_for("/", None)?;

        let tls = if args.enable_tls {
            match (&args.tls_cert_path, &args.tls_key_path) {
                (Some(cert_path), Some(key_path)) =>
                    Some(TlsConfig {
                        cert_path: cert_path.clone(),
                        key_path: key_path.clone(),
                    }),
                _ => {
                    return Err(ConfigError::IncompleteTls);
                }
            }
        } else {
            None
        };

        Ok(Self {
            listen_addr,
            upstream,
            static_dir: PathBuf::from(&args.static_dir),
            id_policy: args.conversation_ids.parse()?,
            tls,
        })
    }
}
