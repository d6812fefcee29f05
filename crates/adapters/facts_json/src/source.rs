//! JSON implementation of [`FactSource`].

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use relaylogic_app::ports::FactSource;
use relaylogic_domain::device::{Device, DeviceRegistry};
use relaylogic_domain::error::RelayLogicError;
use relaylogic_domain::rule::RuleSet;

use crate::error::FactsError;

/// Reads the device registry and the rule set from two JSON files.
#[derive(Debug, Clone)]
pub struct JsonFactSource {
    devices_path: PathBuf,
    rules_path: PathBuf,
}

impl JsonFactSource {
    pub fn new(devices_path: impl Into<PathBuf>, rules_path: impl Into<PathBuf>) -> Self {
        Self {
            devices_path: devices_path.into(),
            rules_path: rules_path.into(),
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FactsError> {
    let raw = tokio::fs::read(path).await.map_err(|source| FactsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| FactsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl FactSource for JsonFactSource {
    fn load_devices(&self) -> impl Future<Output = Result<DeviceRegistry, RelayLogicError>> + Send {
        async move {
            let devices: Vec<Device> = read_json(&self.devices_path).await?;
            tracing::debug!(path = %self.devices_path.display(), count = devices.len(), "devices read");
            Ok(DeviceRegistry::from_devices(devices)?)
        }
    }

    fn load_rules(&self) -> impl Future<Output = Result<RuleSet, RelayLogicError>> + Send {
        async move {
            let rules: RuleSet = read_json(&self.rules_path).await?;
            tracing::debug!(path = %self.rules_path.display(), count = rules.len(), "rules read");
            Ok(rules)
        }
    }
}
