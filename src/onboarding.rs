//! Access-point onboarding screen and Wi-Fi join code.
//!
//! While the display hosts its fallback access point it shows the network
//! credentials, the portal address and a QR code that phones can scan to
//! join the network directly.

use qrcode::{Color, EcLevel, QrCode};

use crate::config::AccessPointConfig;

/// Builds a `WIFI:` join payload understood by phone camera apps.
///
/// Backslash, semicolon, comma, colon and double quote are escaped with a
/// backslash in the SSID and password.
///
/// ```rust
/// use evse_display::onboarding::wifi_join_payload;
///
/// assert_eq!(
///     wifi_join_payload("SmartEVSE_Display", "12345678", false),
///     "WIFI:T:WPA;S:SmartEVSE_Display;P:12345678;;"
/// );
/// ```
pub fn wifi_join_payload(ssid: &str, password: &str, hidden: bool) -> String {
    let mut payload = String::from("WIFI:T:WPA;");
    payload.push_str("S:");
    push_escaped(&mut payload, ssid);
    payload.push(';');
    payload.push_str("P:");
    push_escaped(&mut payload, password);
    payload.push(';');
    if hidden {
        payload.push_str("H:true;");
    }
    payload.push(';');
    payload
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// A square QR module matrix, row-major, `true` for dark modules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    modules: Vec<bool>,
}

impl QrMatrix {
    /// Encodes `data` with low error correction.
    pub fn encode(data: &str) -> Result<Self, qrcode::types::QrError> {
        let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)?;
        let width = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Ok(Self { width, modules })
    }

    /// Modules per side.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns true if the module at (`x`, `y`) is dark.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }
}

/// Everything the onboarding screen shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnboardingScreen {
    /// Access point name to join.
    pub ap_ssid: String,
    /// Access point passphrase.
    pub ap_password: String,
    /// Address to open in the browser.
    pub portal_url: String,
    /// Join code, absent if encoding failed.
    pub join_code: Option<QrMatrix>,
}

impl OnboardingScreen {
    /// Builds the screen for the configured access point.
    pub fn for_access_point(ap: &AccessPointConfig) -> Self {
        let payload = wifi_join_payload(ap.ssid.as_str(), ap.password.as_str(), false);
        let join_code = match QrMatrix::encode(&payload) {
            Ok(matrix) => Some(matrix),
            Err(e) => {
                log::warn!("[WiFi] Could not encode join code: {:?}", e);
                None
            }
        };
        Self {
            ap_ssid: ap.ssid.to_string(),
            ap_password: ap.password.to_string(),
            portal_url: ap.portal_url().to_string(),
            join_code,
        }
    }

    /// Instruction lines, top to bottom.
    pub fn lines(&self) -> [String; 6] {
        [
            "Access Point Active".to_string(),
            "1. Connect to WiFi".to_string(),
            format!("   SSID: {}", self.ap_ssid),
            format!("   Pass: {}", self.ap_password),
            "2. Open in browser".to_string(),
            format!("   {}", self.portal_url.trim_start_matches("http://")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_flag() {
        assert_eq!(
            wifi_join_payload("Net", "pw", true),
            "WIFI:T:WPA;S:Net;P:pw;H:true;;"
        );
    }

    #[test]
    fn special_characters_escaped() {
        assert_eq!(
            wifi_join_payload("a;b", "c:d\"e\\f,g", false),
            "WIFI:T:WPA;S:a\\;b;P:c\\:d\\\"e\\\\f\\,g;;"
        );
    }

    #[test]
    fn matrix_is_square_and_has_finder_corner() {
        let matrix = QrMatrix::encode("WIFI:T:WPA;S:SmartEVSE_Display;P:12345678;;").unwrap();
        assert!(matrix.width() >= 21);
        // Top-left finder pattern starts with a dark module
        assert!(matrix.is_dark(0, 0));
        assert!(!matrix.is_dark(matrix.width(), 0));
    }

    #[test]
    fn onboarding_screen_for_default_ap() {
        let screen = OnboardingScreen::for_access_point(&AccessPointConfig::default());
        assert_eq!(screen.ap_ssid, "SmartEVSE_Display");
        assert_eq!(screen.portal_url, "http://192.168.4.1");
        assert!(screen.join_code.is_some());
        assert_eq!(screen.lines()[5], "   192.168.4.1");
    }
}
