pub mod aggregate;

pub use aggregate::{StoreVariation, StoreVariationId};
