pub mod aggregate;

pub use aggregate::{ProductAttribute, ProductType, StoreProduct, StoreProductId};
