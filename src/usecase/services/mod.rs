pub mod grid_service;
pub mod request_builder;
pub mod result_cache;
