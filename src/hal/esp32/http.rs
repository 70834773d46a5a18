//! Config portal HTTP server for ESP32.
//!
//! Every GET and POST is forwarded to the platform-agnostic
//! [`PortalHandler`](crate::services::PortalHandler), so the device serves the
//! same API and web UI as the desktop build.
//!
//! # Example
//!
//! ```ignore
//! use evse_display::hal::esp32::Esp32PortalServer;
//! use evse_display::services::{PortalHandler, PortalMailbox};
//! use std::sync::Arc;
//!
//! let mailbox = Arc::new(PortalMailbox::new());
//! let server = Esp32PortalServer::new(&config.web, PortalHandler::new(mailbox.clone()))?;
//! ```

use crate::config::WebConfig;
use crate::services::PortalHandler;
use crate::traits::HttpResponse;
use esp_idf_hal::io::Write;
use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;

/// Largest request body accepted (credential JSON).
const MAX_BODY: usize = 1024;

/// HTTP server wrapper.
///
/// The server runs in a background task managed by esp-idf.
/// Dropping this struct stops the server.
pub struct Esp32PortalServer {
    _server: EspHttpServer<'static>,
}

impl Esp32PortalServer {
    /// Start the server on the configured port.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP server fails to start.
    pub fn new(config: &WebConfig, handler: PortalHandler) -> anyhow::Result<Self> {
        let server_config = Configuration {
            http_port: config.port,
            uri_match_wildcard: true,
            ..Default::default()
        };

        let mut server = EspHttpServer::new(&server_config)?;

        let get_handler = handler.clone();
        server.fn_handler("/*", Method::Get, move |req| {
            let resp = get_handler.handle_get(req.uri());
            send(req, &resp)
        })?;

        let post_handler = handler;
        server.fn_handler("/*", Method::Post, move |mut req| {
            let mut body = Vec::new();
            let mut buf = [0u8; 256];
            loop {
                let n = req.read(&mut buf)?;
                if n == 0 || body.len() + n > MAX_BODY {
                    break;
                }
                body.extend_from_slice(&buf[..n]);
            }
            let uri = req.uri().to_string();
            let resp = post_handler.handle_post(&uri, &body);
            send(req, &resp)
        })?;

        log::info!("[Portal] Server started on port {}", config.port);

        Ok(Self { _server: server })
    }
}

fn send(req: Request<&mut EspHttpConnection<'_>>, resp: &HttpResponse) -> Result<(), EspIOError> {
    let mut headers = vec![("Content-Type", resp.content_type)];
    if let Some(modified) = resp.last_modified.as_deref() {
        headers.push(("Last-Modified", modified));
    }
    if resp.cors {
        headers.push(("Access-Control-Allow-Origin", "*"));
    }

    let mut out = req.into_response(resp.status, None, &headers)?;
    out.write_all(&resp.body)?;
    Ok(())
}
