//! Shared building blocks for the simulation pipeline.
//!
//! Keeps zero internal dependencies so every other crate can use it.

pub mod access;
pub mod error;
pub mod origin;
pub mod roles;
pub mod types;
