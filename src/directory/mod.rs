//! Agency and Contact Directory
//!
//! Record types and the providers that supply them. Providers are the only
//! place records are loaded; everything downstream treats them as read-only.

pub mod provider;
pub mod records;

pub use provider::{
    Dataset, DatasetError, DatasetProvider, FileDatasetProvider, StaticDatasetProvider,
};
pub use records::{Agency, Contact};
