//! HTTP surface of the simulation job pipeline.
//!
//! Queue administration for privileged callers plus the Completion Gateway,
//! exposed as a library so the binary and the integration tests build the
//! same router.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
