//! HTTP client for the SmartEVSE REST API.

use crate::traits::{HttpMethod, PeerClient, PeerResponse};
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;
use std::time::Duration;

/// Responses larger than this are truncated (a full LCD bitmap is ~1.1 KB).
const MAX_BODY: usize = 8 * 1024;

/// Keep-alive HTTP client.
///
/// The connection is reused while requests succeed and share a timeout;
/// after any failure it is dropped so the next request opens a new one.
#[derive(Default)]
pub struct Esp32PeerClient {
    session: Option<(u32, EspHttpConnection)>,
}

impl Esp32PeerClient {
    /// Creates a client with no open connection.
    pub fn new() -> Self {
        Self::default()
    }

    fn connection(&mut self, timeout_ms: u32) -> Result<&mut EspHttpConnection, EspIOError> {
        let conn = match self.session.take() {
            Some((t, conn)) if t == timeout_ms => conn,
            _ => EspHttpConnection::new(&Configuration {
                timeout: Some(Duration::from_millis(u64::from(timeout_ms))),
                ..Default::default()
            })?,
        };
        Ok(&mut self.session.insert((timeout_ms, conn)).1)
    }

    fn exchange(
        &mut self,
        method: HttpMethod,
        url: &str,
        timeout_ms: u32,
    ) -> Result<PeerResponse, EspIOError> {
        let conn = self.connection(timeout_ms)?;
        let method = match method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Post => Method::Post,
        };

        let headers: &[(&str, &str)] = match method {
            Method::Post => &[("Content-Length", "0")],
            _ => &[],
        };
        conn.initiate_request(method, url, headers)?;
        conn.initiate_response()?;
        let status = conn.status();

        let mut body = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = conn.read(&mut buf)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
            if body.len() >= MAX_BODY {
                body.truncate(MAX_BODY);
                break;
            }
        }

        Ok(PeerResponse::new(status, body))
    }
}

impl PeerClient for Esp32PeerClient {
    type Error = EspIOError;

    fn request(
        &mut self,
        method: HttpMethod,
        url: &str,
        timeout_ms: u32,
    ) -> Result<PeerResponse, Self::Error> {
        let result = self.exchange(method, url, timeout_ms);
        if let Err(e) = &result {
            log::debug!("[Peer] {:?} {} failed: {:?}", method, url, e);
            self.session = None;
        }
        result
    }
}
