//! Device: a relay or dimmer controller and its input/output topology.
//!
//! Devices are loaded once into a [`DeviceRegistry`] and never change
//! afterwards. Every compilation reads the same immutable registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hardware family of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Switched outputs only (`Switch.Set`).
    Relay,
    /// Dimmable outputs (`Light.Set` / `Light.SetAll`).
    Dimmer,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relay => f.write_str("relay"),
            Self::Dimmer => f.write_str("dimmer"),
        }
    }
}

/// One physical input or output terminal of a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub index: u8,
    /// Circuit label from the electrical plan, e.g. `"PIR hall"`.
    #[serde(default)]
    pub circuit: String,
    /// Where the circuit lives, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Port {
    #[must_use]
    pub fn new(index: u8, circuit: impl Into<String>) -> Self {
        Self {
            index,
            circuit: circuit.into(),
            location: None,
        }
    }

    /// Whether the circuit label marks a motion sensor (contains `PIR`,
    /// case-insensitive).
    #[must_use]
    pub fn is_pir(&self) -> bool {
        self.circuit.to_ascii_uppercase().contains("PIR")
    }
}

/// A relay or dimmer controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    /// Host or IP address the controller answers RPC calls on.
    #[serde(alias = "ip")]
    pub address: String,
    #[serde(alias = "type")]
    pub kind: DeviceKind,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyField`] when `name` or `address` is empty,
    /// and [`ConfigError::InvalidDeviceName`] when the name would not stay
    /// inside the program output directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "name" });
        }
        if self.name.contains(['/', '\\']) || matches!(self.name.as_str(), "." | "..") {
            return Err(ConfigError::InvalidDeviceName {
                device: self.name.clone(),
            });
        }
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "address" });
        }
        Ok(())
    }

    /// Whether input `index` is wired to a motion sensor.
    #[must_use]
    pub fn is_pir_input(&self, index: u8) -> bool {
        self.inputs
            .iter()
            .find(|input| input.index == index)
            .is_some_and(Port::is_pir)
    }

    /// Output indices in declaration order.
    #[must_use]
    pub fn output_indices(&self) -> Vec<u8> {
        self.outputs.iter().map(|output| output.index).collect()
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    name: Option<String>,
    address: Option<String>,
    kind: Option<DeviceKind>,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn input(mut self, index: u8, circuit: impl Into<String>) -> Self {
        self.inputs.push(Port::new(index, circuit));
        self
    }

    #[must_use]
    pub fn output(mut self, index: u8, circuit: impl Into<String>) -> Self {
        self.outputs.push(Port::new(index, circuit));
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyField`] if the name or address is missing.
    pub fn build(self) -> Result<Device, ConfigError> {
        let device = Device {
            name: self.name.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            kind: self.kind.unwrap_or(DeviceKind::Relay),
            inputs: self.inputs,
            outputs: self.outputs,
        };
        device.validate()?;
        Ok(device)
    }
}

/// Immutable name → device lookup.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<String, Device>,
}

impl DeviceRegistry {
    /// Build a registry, validating every device.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateDevice`] when two devices share a
    /// name, or the first validation error of an invalid device.
    pub fn from_devices(devices: impl IntoIterator<Item = Device>) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for device in devices {
            device.validate()?;
            if map.contains_key(&device.name) {
                return Err(ConfigError::DuplicateDevice {
                    device: device.name,
                });
            }
            map.insert(device.name.clone(), device);
        }
        Ok(Self { devices: map })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    /// Look up a device or fail with [`ConfigError::UnknownDevice`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDevice`] when `name` is not registered.
    pub fn require(&self, name: &str) -> Result<&Device, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownDevice {
            device: name.to_string(),
        })
    }

    /// Devices ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
