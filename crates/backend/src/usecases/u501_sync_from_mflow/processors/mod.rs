pub mod product;
pub mod variation;

pub use product::{process_product, CreatedProduct, ItemOutcome};
pub use variation::VariationSummary;
