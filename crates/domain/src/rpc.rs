//! RPC wire contract between controllers.
//!
//! Direct calls are `GET http://<address>/rpc/<Method>?id=..&on=..&brightness=..`;
//! batched calls are a single `POST http://<address>/rpc` whose body is a JSON
//! array of [`RpcFrame`]s.
//!
//! [`ResolvedCall`] is the compile-time form of a call: its on-flag and
//! brightness may still depend on the controller's clock. [`ResolvedCall::materialize`]
//! turns it into concrete [`RpcParams`] at fire time.

use serde::{Deserialize, Serialize};

use crate::settings::BrightnessPresets;

/// Controller RPC method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    #[serde(rename = "Light.Set")]
    LightSet,
    #[serde(rename = "Light.SetAll")]
    LightSetAll,
    #[serde(rename = "Switch.Set")]
    SwitchSet,
}

impl RpcMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LightSet => "Light.Set",
            Self::LightSetAll => "Light.SetAll",
            Self::SwitchSet => "Switch.Set",
        }
    }
}

impl std::fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `on` parameter of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnFlag {
    Fixed(bool),
    /// `true` only inside the night window at fire time.
    NightOnly,
}

/// The `brightness` parameter of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrightnessExpr {
    /// Known at compile time (literals and folded presets).
    Literal(u8),
    /// Mid preset at night, high preset by day.
    Adaptive,
    /// Low preset; paired with [`OnFlag::NightOnly`].
    NightOnlyLow,
}

/// A call whose target and method are fixed but whose parameters may still
/// need the clock.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedCall {
    /// Target device name.
    pub device: String,
    pub address: String,
    pub method: RpcMethod,
    /// Output index; `None` for `Light.SetAll`.
    pub output: Option<u8>,
    pub on: OnFlag,
    pub brightness: Option<BrightnessExpr>,
}

impl ResolvedCall {
    /// Resolve runtime placeholders against the night flag.
    #[must_use]
    pub fn materialize(&self, night: bool, presets: &BrightnessPresets) -> RpcParams {
        let on = match self.on {
            OnFlag::Fixed(on) => on,
            OnFlag::NightOnly => night,
        };
        let brightness = self.brightness.map(|expr| match expr {
            BrightnessExpr::Literal(level) => level,
            BrightnessExpr::Adaptive if night => presets.mid,
            BrightnessExpr::Adaptive => presets.high,
            BrightnessExpr::NightOnlyLow => presets.low,
        });
        RpcParams {
            id: self.output,
            on,
            brightness,
        }
    }

    /// Whether any parameter depends on the clock.
    #[must_use]
    pub fn is_clock_dependent(&self) -> bool {
        matches!(self.on, OnFlag::NightOnly)
            || matches!(
                self.brightness,
                Some(BrightnessExpr::Adaptive | BrightnessExpr::NightOnlyLow)
            )
    }
}

/// Concrete call parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u8>,
    pub on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

impl RpcParams {
    /// Query-string pairs in wire order (`id`, `on`, `brightness`).
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(id) = self.id {
            pairs.push(("id", id.to_string()));
        }
        pairs.push(("on", self.on.to_string()));
        if let Some(brightness) = self.brightness {
            pairs.push(("brightness", brightness.to_string()));
        }
        pairs
    }
}

/// One call inside a batched request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFrame {
    /// 1-based position within the batch.
    pub id: u32,
    pub method: RpcMethod,
    pub params: RpcParams,
}

/// A request ready to leave the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCall {
    Direct {
        address: String,
        method: RpcMethod,
        params: RpcParams,
    },
    Batch {
        address: String,
        frames: Vec<RpcFrame>,
    },
}

impl OutboundCall {
    #[must_use]
    pub fn address(&self) -> &str {
        match self {
            Self::Direct { address, .. } | Self::Batch { address, .. } => address,
        }
    }

    /// Request URL without query string.
    #[must_use]
    pub fn url(&self) -> String {
        match self {
            Self::Direct {
                address, method, ..
            } => format!("http://{address}/rpc/{method}"),
            Self::Batch { address, .. } => format!("http://{address}/rpc"),
        }
    }
}

impl std::fmt::Display for OutboundCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct {
                address, method, ..
            } => write!(f, "{method}@{address}"),
            Self::Batch { address, frames } => write!(f, "batch({})@{address}", frames.len()),
        }
    }
}
