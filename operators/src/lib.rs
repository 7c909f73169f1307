//! HTTP collaborator implementations for cms-bench
//!
//! This crate provides transport-level implementations of the core
//! collaborator traits:
//!
//! - `RestOperator` — create/update/delete against a JSON content API
//! - `HttpContentCheck` — convergence checks against the live site
//!
//! The engine in `cms-bench-core` depends on the traits only; anything that
//! talks HTTP lives here.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod check;
mod rest;

pub use check::{HttpCheckConfig, HttpContentCheck};
pub use rest::{RestOperator, RestOperatorConfig};
