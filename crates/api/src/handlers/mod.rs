pub mod gateway;
pub mod sim_jobs;
