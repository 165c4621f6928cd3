//! [`HttpEndpoint`] – request/response ingress served by axum.
//!
//! At most `workers` requests are inside the gateway at a time.  The gateway
//! call returns an owned [`Reply`] before the response is rendered, so no
//! lock is ever held across socket I/O.
//!
//! [`Reply`]: smartpot_types::Reply

use std::net::SocketAddr;
use std::sync::Arc;

use smartpot_gateway::Gateway;
use smartpot_types::{PotError, PotResult};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::router::{router, AppState, MAX_WORKERS};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WORKERS: usize = 2;

/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use smartpot_endpoint::HttpEndpoint;
/// use smartpot_gateway::Gateway;
///
/// #[tokio::main]
/// async fn main() {
///     let (_stop, shutdown) = tokio::sync::watch::channel(false);
///     HttpEndpoint::new(Arc::new(Gateway::default()))
///         .with_port(9090)
///         .run(shutdown)
///         .await
///         .expect("endpoint failed");
/// }
/// ```
pub struct HttpEndpoint {
    gateway: Arc<Gateway>,
    addr: SocketAddr,
    workers: usize,
}

impl HttpEndpoint {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.addr.set_port(port);
        self
    }

    /// Cap on concurrently handled requests, clamped to `1..=MAX_WORKERS`.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, MAX_WORKERS);
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// # Errors
    ///
    /// [`PotError::Transport`] when the listener cannot bind.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> PotResult<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| PotError::Transport(format!("bind error on {}: {e}", self.addr)))?;
        info!(addr = %self.addr, "http endpoint listening");
        self.serve(listener, shutdown).await
    }

    /// Serve requests from an already-bound listener until shutdown, then
    /// let in-flight requests finish.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: watch::Receiver<bool>,
    ) -> PotResult<()> {
        let app = router(AppState::new(Arc::clone(&self.gateway), self.workers));
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await
            .map_err(|e| PotError::Transport(format!("http server error: {e}")))?;
        info!("http endpoint stopped");
        Ok(())
    }
}

/// Resolves once shutdown is requested or the sender is gone.
async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
