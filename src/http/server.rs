//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the mount-prefix routes and the fallback
//! - Wire up middleware (tracing, request ID)
//! - Answer CORS preflight before anything else
//! - Hand everything else to the passthrough dispatcher
//! - Serve over plain TCP or TLS with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::cors::preflight_response;
use crate::http::forward::PassthroughDispatcher;
use crate::http::request::{request_id_layer, ForwardRequest};
use crate::http::response::not_found;
use crate::lifecycle::shutdown;
use crate::net::tls::load_tls_config;

/// How long in-flight requests get to finish after shutdown on the TLS path.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: PassthroughDispatcher,
    pub mount_path: Arc<str>,
}

/// HTTP server for the passthrough proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let state = AppState {
            dispatcher: PassthroughDispatcher::new(&config),
            mount_path: Arc::from(config.upstream.mount_path.as_str()),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mount = config.upstream.mount_path.as_str();
        Router::new()
            .route(mount, any(proxy_handler))
            .route(&format!("{mount}/"), any(proxy_handler))
            .route(&format!("{mount}/{{*path}}"), any(proxy_handler))
            .fallback(fallback_handler)
            .with_state(state)
            .layer(request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Uses TLS when `listener.tls` is configured.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        match self.config.listener.tls.clone() {
            None => {
                tracing::info!(address = %addr, mount = %self.config.upstream.mount_path, "HTTP server starting");
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(shutdown::wait(shutdown_rx))
                    .await?;
            }
            Some(tls) => {
                tracing::info!(address = %addr, mount = %self.config.upstream.mount_path, "HTTPS server starting");
                let rustls = load_tls_config(tls.cert_path.as_ref(), tls.key_path.as_ref()).await?;

                let handle = axum_server::Handle::new();
                let drain = handle.clone();
                tokio::spawn(async move {
                    shutdown::wait(shutdown_rx).await;
                    drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
                });

                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Handler for everything under the mount prefix.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight_response();
    }

    let forward = ForwardRequest::from_request(request, &state.mount_path);
    state.dispatcher.handle(forward).await
}

/// Preflight for any path; 404 for anything else outside the mount prefix.
async fn fallback_handler(request: Request<Body>) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight_response();
    }
    not_found(request.uri().path())
}
