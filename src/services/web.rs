//! Axum-based HTTP server for the config portal (desktop).
//!
//! Serves the same endpoints as the device:
//! - GET `/api/wifi` - Scanned networks
//! - GET `/api/mdns` - Discovered SmartEVSE hosts
//! - POST `/` - Save station credentials
//! - GET `/*` - Packaged web UI

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;
use crate::traits::HttpResponse;

use super::portal::PortalHandler;

// ============================================================================
// Response Conversion
// ============================================================================

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        if let Some(value) = self
            .last_modified
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            headers.insert(header::LAST_MODIFIED, value);
        }
        if self.cors {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }

        (status, headers, self.body).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Dispatches every request to the shared portal handler.
async fn dispatch(
    State(handler): State<PortalHandler>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> HttpResponse {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    if method == Method::POST {
        handler.handle_post(target, &body)
    } else {
        handler.handle_get(target)
    }
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to answer CORS preflights on the JSON APIs
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            cors_permissive: true,
        }
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router(handler: PortalHandler, config: &WebServerConfig) -> Router {
    let mut api = Router::new()
        .route("/api/wifi", get(dispatch))
        .route("/api/mdns", get(dispatch));

    if config.cors_permissive {
        api = api.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers(Any),
        );
    }

    Router::new()
        .merge(api)
        .route("/", get(dispatch).post(dispatch))
        .fallback(dispatch)
        .with_state(handler)
}

/// Start the web server
///
/// This function blocks until the server is shut down.
pub async fn run_server(
    handler: PortalHandler,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    let router = build_router(handler, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log::info!("[Portal] Listening on http://{}", config.addr);

    axum::serve(listener, router).await
}
