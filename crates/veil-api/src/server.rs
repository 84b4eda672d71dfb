//! API server implementation

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use veil_auth::{AuthLayer, PrincipalResolver};

use crate::error::{Error, Result};
use crate::routes::{AppState, routes};

/// Build the full application: routes behind the auth layer.
pub fn app<R: PrincipalResolver>(state: AppState, auth: AuthLayer<R>) -> Router {
    routes(state).layer(auth)
}

/// Veil API server
pub struct Server {
    addr: SocketAddr,
    router: Router,
}

impl Server {
    /// Create a server for `router` on `addr`.
    pub fn new(addr: SocketAddr, router: Router) -> Self {
        Self { addr, router }
    }

    /// Create a server from its parts.
    ///
    /// # Errors
    ///
    /// Refuses an auth configuration that cannot authenticate anyone.
    pub fn from_parts<R: PrincipalResolver>(
        addr: SocketAddr,
        state: AppState,
        resolver: Arc<R>,
        auth: veil_auth::AuthConfig,
    ) -> Result<Self> {
        auth.validate()?;
        Ok(Self::new(addr, app(state, AuthLayer::new(resolver, auth))))
    }

    /// The configured address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the address can't be bound or the
    /// server fails.
    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(Error::Server)?;
        log::info!("Listening on {}", self.addr);
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(Error::Server)?;
        log::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
    }
}
