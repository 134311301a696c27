//! Library half of the worker binary, split out so configuration parsing is
//! testable.

pub mod config;
