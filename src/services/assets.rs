//! Web config UI assets packaged into the binary.
//!
//! Files under `www/` are embedded at build time with `rust-embed`; the
//! content type is derived from the file extension.

use std::borrow::Cow;

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "www/"]
struct WebAssets;

/// An embedded file ready to serve.
#[derive(Clone, Debug)]
pub struct Asset {
    /// File contents.
    pub data: Cow<'static, [u8]>,
    /// MIME type for the `Content-Type` header.
    pub content_type: &'static str,
    /// Modification time, seconds since the Unix epoch, if recorded.
    pub modified: Option<u64>,
}

/// Looks up an asset by URL path (`/index.html`, `/script.js`, ...).
pub fn lookup(path: &str) -> Option<Asset> {
    let name = path.trim_start_matches('/');
    let file = WebAssets::get(name)?;
    Some(Asset {
        data: file.data,
        content_type: content_type_for(name),
        modified: file.metadata.last_modified(),
    })
}

/// MIME type by extension; unknown extensions are served as HTML.
pub fn content_type_for(path: &str) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("text/html")
}

const WEEKDAYS: [&str; 7] = ["Thu", "Fri", "Sat", "Sun", "Mon", "Tue", "Wed"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Formats Unix seconds as an RFC 7231 date (`Thu, 01 Jan 1970 00:00:00 GMT`).
pub fn http_date(secs: u64) -> String {
    let days = secs / 86_400;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days as i64);
    format!(
        "{}, {:02} {} {} {:02}:{:02}:{:02} GMT",
        WEEKDAYS[(days % 7) as usize],
        day,
        MONTHS[(month - 1) as usize],
        year,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// Days since 1970-01-01 to (year, month, day) in the proleptic Gregorian calendar.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch() {
        assert_eq!(http_date(0), "Thu, 01 Jan 1970 00:00:00 GMT");
    }

    #[test]
    fn known_dates() {
        assert_eq!(http_date(784_111_777), "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(http_date(951_782_400), "Tue, 29 Feb 2000 00:00:00 GMT");
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("index.html"), "text/html");
        assert_eq!(content_type_for("style.css"), "text/css");
        assert!(content_type_for("script.js").ends_with("javascript"));
        assert_eq!(content_type_for("README"), "text/html");
    }

    #[test]
    fn packaged_files_present() {
        for name in ["/index.html", "/script.js", "/style.css", "/success.html"] {
            let asset = lookup(name).unwrap();
            assert!(!asset.data.is_empty(), "{} is empty", name);
        }
        assert!(lookup("/missing.txt").is_none());
    }
}
