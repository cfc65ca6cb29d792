//! Process-boundary crash handling for the gateway.
//!
//! A panic outside request handling, an error escaping the serve loop, or
//! Ctrl-C asks the server to stop accepting connections. If it has not
//! drained within [`SHUTDOWN_GRACE`] the supervisor gives up on it and the
//! caller exits anyway.

use crate::server::logging::serving_request;
use log::{ error, info, warn };
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Panic or server error.
    Fault,
    /// Ctrl-C.
    Interrupt,
    /// The server returned on its own without error.
    Finished,
}

impl ShutdownReason {
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownReason::Fault => 1,
            ShutdownReason::Interrupt | ShutdownReason::Finished => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub reason: ShutdownReason,
    /// The server did not drain within the grace period.
    pub forced: bool,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        if self.forced { 1 } else { self.reason.exit_code() }
    }
}

#[derive(Clone)]
pub struct Supervisor {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
    rx: watch::Receiver<Option<ShutdownReason>>,
    grace: Duration,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_grace(SHUTDOWN_GRACE)
    }

    pub fn with_grace(grace: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        Self { tx: Arc::new(tx), rx, grace }
    }

    /// Routes panics to [`Supervisor::report_fault`], after the default hook
    /// has printed them. Panics inside a request handler are answered with a
    /// 500 by the router and leave the gateway running.
    pub fn install_panic_hook(&self) {
        let supervisor = self.clone();
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(
            Box::new(move |panic_info| {
                error!("Uncaught panic: {}", panic_info);
                default_hook(panic_info);
                supervisor.on_panic();
            })
        );
    }

    fn on_panic(&self) {
        if serving_request() {
            warn!("Panic was confined to a single request; gateway keeps running");
            return;
        }
        self.trigger(ShutdownReason::Fault);
    }

    pub fn report_fault(&self, what: &str) {
        error!("Unrecoverable fault: {}", what);
        self.trigger(ShutdownReason::Fault);
    }

    /// First reason wins; later triggers are ignored.
    fn trigger(&self, reason: ShutdownReason) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested. Hand this to the server.
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.rx.clone();
        async move {
            let _ = rx.wait_for(|reason| reason.is_some()).await;
        }
    }

    async fn requested(&self) -> ShutdownReason {
        let mut rx = self.rx.clone();
        tokio::select! {
            res = rx.wait_for(|reason| reason.is_some()) => {
                res.ok().and_then(|reason| *reason).unwrap_or(ShutdownReason::Fault)
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                self.trigger(ShutdownReason::Interrupt);
                self.reason().unwrap_or(ShutdownReason::Interrupt)
            }
        }
    }

    /// Runs `server` until it stops or shutdown is requested, then waits at
    /// most the grace period for it to drain.
    pub async fn supervise<F>(&self, server: F) -> Outcome
        where F: Future<Output = Result<(), Box<dyn Error + Send + Sync>>> + Send + 'static
    {
        let mut server = tokio::spawn(server);

        let reason = tokio::select! {
            joined = &mut server => {
                return match joined {
                    Ok(Ok(())) => Outcome { reason: ShutdownReason::Finished, forced: false },
                    Ok(Err(e)) => {
                        error!("Server error: {}", e);
                        Outcome { reason: ShutdownReason::Fault, forced: false }
                    }
                    Err(e) => {
                        error!("Server task failed: {}", e);
                        Outcome { reason: ShutdownReason::Fault, forced: false }
                    }
                };
            }
            reason = self.requested() => reason,
        };

        info!("Shutdown requested ({:?}); waiting up to {:?} for connections to close", reason, self.grace);
        match tokio::time::timeout(self.grace, server).await {
            Ok(Ok(Ok(()))) => {
                info!("Server closed due to {:?}", reason);
                Outcome { reason, forced: false }
            }
            Ok(Ok(Err(e))) => {
                error!("Server error during shutdown: {}", e);
                Outcome { reason, forced: false }
            }
            Ok(Err(e)) => {
                error!("Server task failed during shutdown: {}", e);
                Outcome { reason, forced: false }
            }
            Err(_) => {
                warn!("Forced server shutdown after {:?}", self.grace);
                Outcome { reason, forced: true }
            }
        }
    }
}
