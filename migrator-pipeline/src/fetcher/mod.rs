//! Bulk retrieval of the source records of a model mapping.
use std::sync::Arc;

use migrator_shared::types::{Domain, ModelMapping, Record};
use object_rpc::{ObjectStore, RpcError};
use tracing::{debug, instrument};

/// Fetches every record of a source model in one call, projected on the
/// mapped source fields.
pub struct RecordFetcher {
    source: Arc<dyn ObjectStore>,
}

impl RecordFetcher {
    pub fn new(source: Arc<dyn ObjectStore>) -> Self {
        Self { source }
    }

    /// Returns all records of `mapping.source_model` in ascending id order.
    ///
    /// No pagination: the whole model is read at once.
    #[instrument(skip_all, fields(model = %mapping.source_model))]
    pub async fn fetch(&self, mapping: &ModelMapping) -> Result<Vec<Record>, RpcError> {
        let fields = mapping.source_projection();
        let records = self
            .source
            .search_read(&mapping.source_model, &Domain::all(), &fields)
            .await?;
        debug!(count = records.len(), fields = fields.len(), "fetched source records");
        Ok(records)
    }
}
