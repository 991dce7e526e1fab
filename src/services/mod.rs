pub mod backfill_service;
pub mod catalog_service;
pub mod identity_service;
pub mod pacer;
pub mod quiz_generator;
pub mod scheduler;
