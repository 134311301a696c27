//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept a pool (or, for writes that must share a transaction, any
//! Postgres executor) as the first argument.

pub mod roster_repo;
pub mod sim_job_repo;

pub use roster_repo::RosterRepo;
pub use sim_job_repo::SimJobRepo;
