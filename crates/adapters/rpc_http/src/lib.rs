//! # relaylogic-adapter-rpc-http
//!
//! HTTP transport for controller RPC calls using [reqwest](https://docs.rs/reqwest).
//!
//! ## Responsibilities
//! - Implement the `RpcTransport` port defined in `relaylogic-app::ports`
//! - Send direct calls as `GET /rpc/<Method>?id=..&on=..&brightness=..`
//! - Send batched calls as one `POST /rpc` with a JSON frame array
//! - Map HTTP failures onto `CallError` (timeout, network, status)
//!
//! ## Dependency rule
//! Depends on `relaylogic-app` (for port traits) and `relaylogic-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod transport;

pub use error::TransportError;
pub use transport::HttpRpcTransport;
