//! Web server for Tollgate.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::auth::{KeyStore, TokenService};
use crate::config::Config;
use crate::{Database, Result, TollgateError};

use super::handlers::AppState;
use super::router::create_router;

/// Web server for the API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a server from configuration and an open, migrated database.
    ///
    /// Key files are read on first use; [`run`](Self::run) loads them before
    /// binding so a missing or weak key stops startup.
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| TollgateError::Config(format!("invalid server address: {e}")))?;

        let keys = Arc::new(KeyStore::from_files(
            &config.keys.private_key_path,
            &config.keys.public_key_path,
        ));
        let tokens = Arc::new(TokenService::new(keys, config.token.access_token_ttl()));

        Ok(Self::with_state(
            addr,
            AppState::new(db, config, tokens),
            config.server.cors_origins.clone(),
        ))
    }

    /// Create a server around prepared state.
    pub fn with_state(addr: SocketAddr, app_state: AppState, cors_origins: Vec<String>) -> Self {
        Self {
            addr,
            app_state: Arc::new(app_state),
            cors_origins,
        }
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        self.app_state.tokens.keys().ensure_loaded()?;

        let router = create_router(self.app_state, &self.cors_origins);

        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await?;
        Ok(())
    }
}
