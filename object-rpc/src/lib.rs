//! Client for remote object stores speaking the Odoo object RPC protocol.
//!
//! This crate provides:
//! - [`ObjectStore`] trait abstracting search/read/create/write over named models
//! - [`OdooClient`] production client speaking JSON-RPC over HTTP
//! - [`MockObjectStore`] in-memory store for tests
//! - [`StoreSource`] for choosing between the two
//!
//! ## Usage with StoreSource
//!
//! ```ignore
//! use object_rpc::StoreSource;
//!
//! let store = StoreSource::live(params, Duration::from_secs(120)).into_store()?;
//! store.authenticate().await?;
//! let partners = store.search_read("res.partner", &Domain::all(), &fields).await?;
//! ```

mod client;
pub mod encoding;
mod error;
mod mock;

pub use client::OdooClient;
pub use error::{Result, RpcError};
pub use mock::{CallCounts, MockObjectStore};

use std::time::Duration;

use async_trait::async_trait;
use migrator_shared::types::{ConnectionParams, Domain, FieldMeta, ModelInfo, Record, RecordId};

/// Operations the migrator needs from a remote store.
///
/// Every call except `authenticate` requires a prior successful
/// `authenticate` on the same instance.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Logs in and returns the user id.
    async fn authenticate(&self) -> Result<i64>;

    /// Lists the store's models, sorted by technical name.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Returns type and relation metadata for every field of `model`.
    async fn list_fields(&self, model: &str) -> Result<Vec<FieldMeta>>;

    /// Returns the ids matching `domain`, in ascending id order.
    async fn search(&self, model: &str, domain: &Domain) -> Result<Vec<RecordId>>;

    /// Reads `fields` of the records with the given ids.
    ///
    /// Ids that do not exist are silently left out of the result.
    async fn read(&self, model: &str, ids: &[RecordId], fields: &[String]) -> Result<Vec<Record>>;

    /// Creates a record and returns its id.
    async fn create(&self, model: &str, values: &Record) -> Result<RecordId>;

    async fn write(&self, model: &str, ids: &[RecordId], values: &Record) -> Result<bool>;

    /// Search and read in one round trip, in ascending id order.
    async fn search_read(&self, model: &str, domain: &Domain, fields: &[String]) -> Result<Vec<Record>>;
}

/// Which object store implementation to use.
pub enum StoreSource {
    Mock(MockObjectStore),
    Live {
        params: ConnectionParams,
        timeout: Duration,
    },
}

impl StoreSource {
    pub fn mock(store: MockObjectStore) -> Self {
        Self::Mock(store)
    }

    pub fn live(params: ConnectionParams, timeout: Duration) -> Self {
        Self::Live { params, timeout }
    }

    /// Builds the store behind a trait object.
    pub fn into_store(self) -> Result<Box<dyn ObjectStore>> {
        match self {
            Self::Mock(store) => Ok(Box::new(store)),
            Self::Live { params, timeout } => Ok(Box::new(OdooClient::new(params, timeout)?)),
        }
    }
}
