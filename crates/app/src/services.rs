//! Application services (use-cases).

pub mod compile_service;
pub mod dry_run_service;
