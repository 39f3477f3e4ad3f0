pub mod meta_repository;
pub mod repository;
