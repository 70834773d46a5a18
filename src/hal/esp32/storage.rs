//! Persistent settings in the default NVS partition.

use crate::traits::{KeyValueStore, NAMESPACE};
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::EspError;

/// Key-value store backed by an NVS namespace.
pub struct Esp32Store {
    nvs: EspNvs<NvsDefault>,
}

impl Esp32Store {
    /// Open (or create) the settings namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the partition cannot be opened.
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, EspError> {
        Ok(Self {
            nvs: EspNvs::new(partition, NAMESPACE, true)?,
        })
    }
}

impl KeyValueStore for Esp32Store {
    type Error = EspError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let len = match self.nvs.str_len(key)? {
            Some(len) => len,
            None => return Ok(None),
        };
        let mut buf = vec![0u8; len + 1];
        Ok(self.nvs.get_str(key, &mut buf)?.map(str::to_string))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.nvs.set_str(key, value)
    }
}
