//! Config portal request handling shared by the ESP32 and desktop servers.
//!
//! This module provides platform-agnostic request handling; the ESP-IDF
//! server and the axum router both call [`PortalHandler`] and translate the
//! returned [`HttpResponse`] to their native response type.
//!
//! # Endpoints
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET | `/api/wifi` | `[{"ssid","rssi","open"}]`, CORS `*` |
//! | GET | `/api/mdns` | `[{"host"}]`, CORS `*` |
//! | GET | anything else | Packaged asset (`/` is `/index.html`) or 404 |
//! | POST | `/` | `{"ssid","password"}` saved, 201 `OK`; 400 `Error` |
//!
//! A GET whose query contains `reboot=true` schedules a restart. A POST is
//! rejected when the SSID is empty or longer than [`MAX_SSID_LEN`], or the
//! password is longer than [`MAX_PASSWORD_LEN`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::assets;
use super::mailbox::{Credentials, PortalMailbox};
use crate::traits::HttpResponse;

/// Longest SSID the radio accepts, in bytes.
pub const MAX_SSID_LEN: usize = 32;
/// Longest WPA passphrase the radio accepts, in bytes.
pub const MAX_PASSWORD_LEN: usize = 64;

#[derive(Debug, Deserialize)]
struct CredentialsRequest {
    #[serde(default)]
    ssid: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Serialize)]
struct HostEntry<'a> {
    host: &'a str,
}

/// Shared portal handler for both ESP32 and desktop servers.
#[derive(Clone, Debug)]
pub struct PortalHandler {
    mailbox: Arc<PortalMailbox>,
}

impl PortalHandler {
    /// Creates a handler backed by `mailbox`.
    pub fn new(mailbox: Arc<PortalMailbox>) -> Self {
        Self { mailbox }
    }

    /// The mailbox this handler writes to.
    pub fn mailbox(&self) -> &Arc<PortalMailbox> {
        &self.mailbox
    }

    /// Handles a GET for `uri` (path plus optional query).
    pub fn handle_get(&self, uri: &str) -> HttpResponse {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };

        match path {
            "/api/wifi" => self.wifi_json(),
            "/api/mdns" => self.mdns_json(),
            _ => {
                if query.is_some_and(|q| q.split('&').any(|kv| kv == "reboot=true")) {
                    log::info!("[Portal] Reboot requested");
                    self.mailbox.request_reboot();
                }
                serve_asset(path)
            }
        }
    }

    /// Handles a POST of `body` to `uri`.
    pub fn handle_post(&self, uri: &str, body: &[u8]) -> HttpResponse {
        if uri.split('?').next() != Some("/") {
            return HttpResponse::not_found();
        }

        let request: CredentialsRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("[Portal] Invalid credentials body: {}", e);
                return HttpResponse::bad_request();
            }
        };

        let ssid = request.ssid.unwrap_or_default();
        if ssid.is_empty() {
            log::warn!("[Portal] Credentials without SSID");
            return HttpResponse::bad_request();
        }
        let password = request.password.unwrap_or_default();
        if ssid.len() > MAX_SSID_LEN || password.len() > MAX_PASSWORD_LEN {
            log::warn!("[Portal] Credentials too long for the radio");
            return HttpResponse::bad_request();
        }

        log::info!("[Portal] Credentials received for '{}'", ssid);
        self.mailbox.submit_credentials(Credentials { ssid, password });
        HttpResponse::text(201, "OK")
    }

    fn wifi_json(&self) -> HttpResponse {
        let networks = self.mailbox.networks();
        json_response(&networks)
    }

    fn mdns_json(&self) -> HttpResponse {
        let peers = self.mailbox.peers();
        let hosts: Vec<HostEntry<'_>> = peers
            .iter()
            .map(|p| HostEntry {
                host: &p.advertised_name,
            })
            .collect();
        json_response(&hosts)
    }
}

fn json_response<T: Serialize + ?Sized>(value: &T) -> HttpResponse {
    match serde_json::to_string(value) {
        Ok(json) => HttpResponse::ok_json(&json),
        Err(e) => {
            log::warn!("[Portal] Could not serialize response: {}", e);
            HttpResponse::text(500, "Error")
        }
    }
}

fn serve_asset(path: &str) -> HttpResponse {
    let path = if path == "/" { "/index.html" } else { path };
    match assets::lookup(path) {
        Some(asset) => {
            let resp = HttpResponse::new(200, asset.content_type, asset.data.into_owned());
            match asset.modified {
                Some(secs) => resp.with_last_modified(assets::http_date(secs)),
                None => resp,
            }
        }
        None => HttpResponse::not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::PeerHost;
    use crate::scanner::WifiNetwork;
    use crate::traits::ServiceRecord;

    fn handler() -> PortalHandler {
        PortalHandler::new(Arc::new(PortalMailbox::new()))
    }

    #[test]
    fn wifi_api_serves_snapshot() {
        let h = handler();
        h.mailbox()
            .publish_networks(vec![WifiNetwork::new("Home", -48, false)]);

        let resp = h.handle_get("/api/wifi");
        assert_eq!(resp.status, 200);
        assert!(resp.cors);
        assert_eq!(
            resp.body_str(),
            Some(r#"[{"ssid":"Home","rssi":-48,"open":false}]"#)
        );
        assert!(h.mailbox().take_requests().scan);
    }

    #[test]
    fn mdns_api_lists_host_names() {
        let h = handler();
        h.mailbox().publish_peers(vec![PeerHost::from_record(
            ServiceRecord::new("SmartEVSE-42", None, 80),
            "SmartEVSE",
        )]);

        let resp = h.handle_get("/api/mdns");
        assert_eq!(resp.body_str(), Some(r#"[{"host":"SmartEVSE-42"}]"#));
    }

    #[test]
    fn root_serves_index() {
        let resp = handler().handle_get("/");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "text/html");
        assert!(resp.last_modified.is_some());
    }

    #[test]
    fn reboot_query_schedules_restart_and_serves_page() {
        let h = handler();
        let resp = h.handle_get("/success.html?reboot=true");
        assert_eq!(resp.status, 200);
        assert!(h.mailbox().take_requests().reboot);

        h.handle_get("/index.html?reboot=false");
        assert!(!h.mailbox().take_requests().reboot);
    }

    #[test]
    fn missing_asset_is_404() {
        let resp = handler().handle_get("/nope.png");
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body_str(), Some("Not found 404"));
    }

    #[test]
    fn post_credentials() {
        let h = handler();
        let resp = h.handle_post("/", br#"{"ssid":"Home","password":"secret"}"#);
        assert_eq!(resp.status, 201);
        assert_eq!(resp.body_str(), Some("OK"));

        let creds = h.mailbox().take_requests().credentials.unwrap();
        assert_eq!(creds.ssid, "Home");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn post_null_password_is_empty() {
        let h = handler();
        let resp = h.handle_post("/", br#"{"ssid":"Open","password":null}"#);
        assert_eq!(resp.status, 201);
        assert_eq!(h.mailbox().take_requests().credentials.unwrap().password, "");
    }

    #[test]
    fn post_rejects_bad_input() {
        let h = handler();
        assert_eq!(h.handle_post("/", br#"{"ssid":""}"#).status, 400);
        assert_eq!(h.handle_post("/", br#"{"password":"x"}"#).status, 400);
        assert_eq!(h.handle_post("/", b"ssid=Home").status, 400);
        assert!(h.mailbox().take_requests().credentials.is_none());
    }

    #[test]
    fn post_rejects_oversized_credentials() {
        let h = handler();
        let long_ssid = format!(r#"{{"ssid":"{}","password":"x"}}"#, "s".repeat(33));
        assert_eq!(h.handle_post("/", long_ssid.as_bytes()).status, 400);
        let long_pass = format!(r#"{{"ssid":"Home","password":"{}"}}"#, "p".repeat(65));
        assert_eq!(h.handle_post("/", long_pass.as_bytes()).status, 400);
        assert!(h.mailbox().take_requests().credentials.is_none());

        let at_limit = format!(
            r#"{{"ssid":"{}","password":"{}"}}"#,
            "s".repeat(MAX_SSID_LEN),
            "p".repeat(MAX_PASSWORD_LEN)
        );
        assert_eq!(h.handle_post("/", at_limit.as_bytes()).status, 201);
    }
}
