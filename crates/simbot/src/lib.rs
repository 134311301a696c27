//! Client library for the external simulation service.
//!
//! The service has no API: simulations are requested by driving its web UI
//! in a real browser ([`driver`]), and the numeric outcome is read from a
//! JSON report derived from the finished-report URL ([`extractor`]).

pub mod browser;
pub mod driver;
pub mod extractor;
pub mod locator;
pub mod report;

/// Public base URL of the simulation service.
pub const DEFAULT_BASE_URL: &str = "https://www.raidbots.com";
