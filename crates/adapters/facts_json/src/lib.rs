//! # relaylogic-adapter-facts-json
//!
//! Filesystem adapter for the compiler's input facts and output programs.
//!
//! ## Responsibilities
//! - Implement `FactSource` over a `devices.json` and a `rules.json` file
//! - Implement `ProgramSink` writing `<dir>/<device>.js`
//! - Map IO and JSON failures into the domain error
//!
//! ## Dependency rule
//! Depends on `relaylogic-app` (for port traits) and `relaylogic-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod sink;
pub mod source;

pub use sink::DirectoryProgramSink;
pub use source::JsonFactSource;
