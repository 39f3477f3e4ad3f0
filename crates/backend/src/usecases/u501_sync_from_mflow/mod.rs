pub mod executor;
pub mod mflow_api_client;
pub mod processors;
pub mod sku_resolver;

pub use executor::{SyncError, SyncExecutor};
pub use mflow_api_client::MflowApiClient;
