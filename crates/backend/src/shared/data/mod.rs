pub mod catalog_store;
pub mod db;
pub mod db_catalog_store;
#[cfg(test)]
pub mod memory_store;
