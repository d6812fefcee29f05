//! # relaylogic-app
//!
//! Application layer: the rule compiler, the controller runtime, and
//! **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `FactSource`: load the device registry and rule set
//!   - `ProgramSink`: store compiled programs
//!   - `RpcTransport`: deliver outbound calls to peers
//!   - `Clock`: local hour for night-window decisions
//! - Compile rules into one program per device (`compiler`)
//! - Execute compiled programs on a single-threaded event loop (`runtime`)
//! - Orchestrate load → compile → store, and dry runs of one device, as
//!   use-cases (`services`)
//!
//! ## Dependency rule
//! Depends on `relaylogic-domain` only (plus `tokio` for the runtime loop).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod compiler;
pub mod ports;
pub mod runtime;
pub mod services;
