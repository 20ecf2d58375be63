//! Request handlers.
//!
//! Handlers extract the request, delegate to the relay held in
//! [`AppState`](crate::state::AppState), and map failures via
//! [`AppError`](crate::error::AppError).

pub mod optimization;
