//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the DTOs used to create or query it.

pub mod roster;
pub mod sim_job;
pub mod status;
