pub mod a001_store_product;
pub mod a002_store_variation;
