//! Persistent key/value storage.
//!
//! The display persists only three strings: the station credentials and the
//! selected SmartEVSE host. On the device these live in NVS under the
//! [`NAMESPACE`] namespace.

use core::fmt::Debug;

/// Storage namespace for all persisted keys.
pub const NAMESPACE: &str = "se-display";

/// Key for the station SSID.
pub const KEY_SSID: &str = "ssid";

/// Key for the station password.
pub const KEY_PASSWORD: &str = "password";

/// Key for the selected SmartEVSE host.
pub const KEY_PEER_HOST: &str = "smartevse_host";

/// String key/value store.
pub trait KeyValueStore {
    /// Error type for storage operations.
    type Error: Debug;

    /// Reads a value, returning `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Writes a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Reads a value, treating missing keys and read errors as empty.
    fn get_or_empty(&self, key: &str) -> String {
        self.get(key).ok().flatten().unwrap_or_default()
    }
}
