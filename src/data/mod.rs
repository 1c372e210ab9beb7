//! Data layer: grant models, the sources they are fetched from, and the store
//! that owns the loaded collection.

mod models;
mod source;
mod store;

pub use models::{GrantCollection, GrantRecord, GrantsResponse};
pub use source::{FileSource, GrantSource, HttpSource, StaticSource, DEFAULT_API_URL};
pub use store::{GrantStore, LoadOutcome, LoadReport, StoreState};
