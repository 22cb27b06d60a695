// Core database operations
mod core;
mod query;

#[cfg(test)]
mod tests;

pub use self::core::DbOperations;
pub use self::query::{CompanyGroup, InsuredProducts, ProductView, UNKNOWN_COMPANY};

use crate::ingestion::IngestionResult;
use crate::records::RequestBatch;

/// Persistence boundary used by the ingestion worker.
///
/// `save` stores the whole graph of a [`RequestBatch`] or nothing at all, and
/// replaces any batch previously saved under the same identifier.
pub trait RecordStore: Send + Sync {
    fn save(&self, batch: &RequestBatch) -> IngestionResult<()>;
}
