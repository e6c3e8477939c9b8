pub mod collector_service;
pub mod job_scheduler_service;
pub mod loader_service;
pub mod snapshot_parser;
