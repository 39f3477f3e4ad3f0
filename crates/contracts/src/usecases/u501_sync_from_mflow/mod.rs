pub mod report;

pub use report::{ItemError, SyncReport, SyncStatus};
