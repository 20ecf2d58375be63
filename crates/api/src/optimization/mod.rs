//! Optimization relay service.
//!
//! The [`OptimizationRelay`] ties the core stages together into a single
//! entry point used by the HTTP handler.

pub mod orchestrator;

pub use orchestrator::OptimizationRelay;
