pub mod batch_dto;
pub mod stats_dto;
