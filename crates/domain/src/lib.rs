//! # relaylogic-domain
//!
//! Pure domain model for the relaylogic rule compiler.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, compile settings
//! - Define **Devices** (relay/dimmer controllers with their input/output topology)
//! - Define **Rules** (source input → trigger cases → actions)
//! - Define **Brightness** (the closed set of brightness specifications)
//! - Define the **RPC wire contract** (methods, parameters, batch frames)
//! - Define **Input events** (what a controller reports)
//! - Define **Compiled programs** (one per device)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod settings;

pub mod brightness;
pub mod device;
pub mod event;
pub mod program;
pub mod rpc;
pub mod rule;
