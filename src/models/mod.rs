pub mod batch;
pub mod book;
pub mod identity;
pub mod stats;
