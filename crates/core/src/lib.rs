//! Domain logic for the Recombyne sequence-optimization relay.
//!
//! Everything here is free of HTTP concerns: request validation, job
//! workspaces, the external engine bridge, and result interpretation. The
//! `api` crate wires these stages together behind an HTTP endpoint.

pub mod error;
pub mod optimization;
pub mod threshold_validation;
