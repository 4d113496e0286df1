//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the whole [`SystemConfig`] is stored as one
//! postcard blob under `vanwater::syscfg`.
//!
//! - **`target_os = "espidf"`**: default NVS partition via `EspNvs`.
//! - **`not(target_os = "espidf")`**: in-memory blob for host runs and
//!   tests.
//!
//! Values are validated before they are written; a stored blob that no
//! longer deserializes is reported as [`ConfigError::Corrupted`] and never
//! replaced silently.

use std::sync::Mutex;

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;
use crate::error::Error;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

#[cfg(target_os = "espidf")]
const CONFIG_NAMESPACE: &str = "vanwater";
#[cfg(target_os = "espidf")]
const CONFIG_KEY: &str = "syscfg";

/// Upper bound of the serialized config.
const MAX_BLOB_SIZE: usize = 256;

pub struct NvsConfigStore {
    #[cfg(target_os = "espidf")]
    nvs: Mutex<EspNvs<NvsDefault>>,
    #[cfg(not(target_os = "espidf"))]
    blob: Mutex<Option<Vec<u8>>>,
}

impl NvsConfigStore {
    /// Open the config namespace on the default partition.
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, ConfigError> {
        let nvs = EspNvs::new(partition, CONFIG_NAMESPACE, true).map_err(|e| {
            warn!("NVS: open {} failed: {}", CONFIG_NAMESPACE, e);
            ConfigError::IoError
        })?;
        info!("NVS: namespace {} open", CONFIG_NAMESPACE);
        Ok(Self {
            nvs: Mutex::new(nvs),
        })
    }

    /// Simulation backend, initially empty.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NVS: simulation backend");
        Ok(Self {
            blob: Mutex::new(None),
        })
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let nvs = self.nvs.lock().map_err(|_| ConfigError::IoError)?;
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match nvs.get_blob(CONFIG_KEY, &mut buf) {
            Ok(found) => Ok(found.map(<[u8]>::to_vec)),
            Err(e) => {
                warn!("NVS: read {} failed: {}", CONFIG_KEY, e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        let mut nvs = self.nvs.lock().map_err(|_| ConfigError::IoError)?;
        nvs.set_blob(CONFIG_KEY, bytes).map_err(|e| {
            warn!("NVS: write {} failed: {}", CONFIG_KEY, e);
            ConfigError::IoError
        })?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let blob = self.blob.lock().map_err(|_| ConfigError::IoError)?;
        Ok(blob.clone())
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        let mut blob = self.blob.lock().map_err(|_| ConfigError::IoError)?;
        *blob = Some(bytes.to_vec());
        Ok(())
    }

    /// Replace the stored blob with raw bytes (corruption tests).
    #[cfg(all(test, not(target_os = "espidf")))]
    fn poke(&self, bytes: &[u8]) {
        *self.blob.lock().unwrap() = Some(bytes.to_vec());
    }
}

impl ConfigPort for NvsConfigStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(bytes) = self.read_blob()? else {
            info!("NVS: no stored config, using defaults");
            return Ok(SystemConfig::default());
        };
        let config: SystemConfig =
            postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        info!("NVS: loaded config ({} bytes)", bytes.len());
        Ok(config)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate().map_err(|e| match e {
            Error::Config(msg) => ConfigError::ValidationFailed(msg),
            _ => ConfigError::ValidationFailed("invalid config"),
        })?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::IoError);
        }
        self.write_blob(&bytes)?;
        info!("NVS: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
