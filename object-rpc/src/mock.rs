//! In-memory object store for tests and local development.
//!
//! `MockObjectStore` keeps records per model ordered by ascending id, counts
//! every call it receives, and can be told to fail authentication, specific
//! reads or creations, or to drop its connection altogether.
//!
//! # Example
//!
//! ```ignore
//! use object_rpc::{MockObjectStore, ObjectStore};
//!
//! let store = MockObjectStore::new()
//!     .with_record("res.country", Record::new().with("id", 10).with("code", "FR"));
//!
//! let ids = store.search("res.country", &Domain::eq("code", "FR")).await?;
//! assert_eq!(ids, vec![10]);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use migrator_shared::types::{Domain, FieldMeta, ID_FIELD, ModelInfo, Record, RecordId};

use crate::error::{Result, RpcError};
use crate::ObjectStore;

/// Number of calls received per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub authenticate: usize,
    pub list_models: usize,
    pub list_fields: usize,
    pub search: usize,
    pub read: usize,
    pub create: usize,
    pub write: usize,
    pub search_read: usize,
}

impl CallCounts {
    /// Calls that change the store.
    pub fn mutations(&self) -> usize {
        self.create + self.write
    }

    pub fn total(&self) -> usize {
        self.authenticate
            + self.list_models
            + self.list_fields
            + self.search
            + self.read
            + self.create
            + self.write
            + self.search_read
    }
}

struct CreateFailure {
    model: String,
    matching: Option<Domain>,
    message: String,
}

#[derive(Default)]
struct MockState {
    models: HashMap<String, BTreeMap<RecordId, Record>>,
    model_names: HashMap<String, String>,
    fields: HashMap<String, Vec<FieldMeta>>,
    calls: CallCounts,
    fail_authentication: bool,
    disconnected: bool,
    read_failures: HashMap<String, String>,
    read_projections: Vec<Vec<String>>,
    create_failures: Vec<CreateFailure>,
}

/// Mock object store holding records in memory.
pub struct MockObjectStore {
    state: Mutex<MockState>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Adds a record, builder style. The record must carry an `id`.
    pub fn with_record(self, model: &str, record: Record) -> Self {
        self.insert(model, record);
        self
    }

    /// Registers field metadata for a model, builder style.
    pub fn with_fields(self, model: &str, fields: Vec<FieldMeta>) -> Self {
        self.state.lock().unwrap().fields.insert(model.to_string(), fields);
        self.register_model(model, model);
        self
    }

    /// Makes every `authenticate` call fail.
    pub fn failing_authentication(self) -> Self {
        self.state.lock().unwrap().fail_authentication = true;
        self
    }

    /// Makes every later call fail with a connection error, as if the
    /// endpoint had gone away.
    pub fn disconnect(&self) {
        self.state.lock().unwrap().disconnected = true;
    }

    /// Makes every `read` on `model` fail with a remote fault.
    pub fn fail_reads(&self, model: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .read_failures
            .insert(model.to_string(), message.to_string());
    }

    /// Makes every `create` on `model` fail with `message`.
    pub fn fail_creates(&self, model: &str, message: &str) {
        self.state.lock().unwrap().create_failures.push(CreateFailure {
            model: model.to_string(),
            matching: None,
            message: message.to_string(),
        });
    }

    /// Makes `create` on `model` fail for values matching `domain`.
    pub fn fail_creates_matching(&self, model: &str, domain: Domain, message: &str) {
        self.state.lock().unwrap().create_failures.push(CreateFailure {
            model: model.to_string(),
            matching: Some(domain),
            message: message.to_string(),
        });
    }

    pub fn register_model(&self, model: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.model_names.insert(model.to_string(), name.to_string());
        state.models.entry(model.to_string()).or_default();
    }

    /// Stores a record under its `id`, replacing any previous one.
    pub fn insert(&self, model: &str, record: Record) {
        let id = record.id().expect("mock records need an id");
        let mut state = self.state.lock().unwrap();
        state
            .model_names
            .entry(model.to_string())
            .or_insert_with(|| model.to_string());
        state.models.entry(model.to_string()).or_default().insert(id, record);
    }

    /// All records of a model in ascending id order.
    pub fn records(&self, model: &str) -> Vec<Record> {
        self.state
            .lock()
            .unwrap()
            .models
            .get(model)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, model: &str, id: RecordId) -> Option<Record> {
        self.state
            .lock()
            .unwrap()
            .models
            .get(model)
            .and_then(|records| records.get(&id).cloned())
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }

    /// Field lists passed to `read`, oldest first.
    pub fn read_projections(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().read_projections.clone()
    }

    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls = CallCounts::default();
    }

    fn ensure_connected(state: &MockState) -> Result<()> {
        if state.disconnected {
            return Err(RpcError::connection("connection refused"));
        }
        Ok(())
    }

    fn matching(state: &MockState, model: &str, domain: &Domain) -> Vec<Record> {
        state
            .models
            .get(model)
            .map(|records| records.values().filter(|r| domain.matches(r)).cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn authenticate(&self) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        state.calls.authenticate += 1;
        Self::ensure_connected(&state)?;
        if state.fail_authentication {
            return Err(RpcError::authentication("invalid credentials"));
        }
        Ok(2)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_models += 1;
        Self::ensure_connected(&state)?;
        let mut models: Vec<ModelInfo> = state
            .model_names
            .iter()
            .map(|(model, name)| ModelInfo {
                model: model.clone(),
                name: name.clone(),
            })
            .collect();
        models.sort_by(|a, b| a.model.cmp(&b.model));
        Ok(models)
    }

    async fn list_fields(&self, model: &str) -> Result<Vec<FieldMeta>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_fields += 1;
        Self::ensure_connected(&state)?;
        state
            .fields
            .get(model)
            .cloned()
            .ok_or_else(|| RpcError::fault(2, format!("Object {model} doesn't exist")))
    }

    async fn search(&self, model: &str, domain: &Domain) -> Result<Vec<RecordId>> {
        let mut state = self.state.lock().unwrap();
        state.calls.search += 1;
        Self::ensure_connected(&state)?;
        Ok(Self::matching(&state, model, domain)
            .iter()
            .filter_map(Record::id)
            .collect())
    }

    async fn read(&self, model: &str, ids: &[RecordId], fields: &[String]) -> Result<Vec<Record>> {
        let mut state = self.state.lock().unwrap();
        state.calls.read += 1;
        Self::ensure_connected(&state)?;
        state.read_projections.push(fields.to_vec());
        if let Some(message) = state.read_failures.get(model) {
            return Err(RpcError::fault(1, message.clone()));
        }
        let Some(records) = state.models.get(model) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id))
            .map(|r| r.project(fields))
            .collect())
    }

    async fn create(&self, model: &str, values: &Record) -> Result<RecordId> {
        let mut state = self.state.lock().unwrap();
        state.calls.create += 1;
        Self::ensure_connected(&state)?;

        let failure = state.create_failures.iter().find(|f| {
            f.model == model && f.matching.as_ref().is_none_or(|domain| domain.matches(values))
        });
        if let Some(failure) = failure {
            return Err(RpcError::fault(1, failure.message.clone()));
        }

        let records = state.models.entry(model.to_string()).or_default();
        let id = records.keys().next_back().map_or(1, |last| last + 1);
        let mut record = Record::new().with(ID_FIELD, id);
        for (name, value) in values.iter() {
            if name != ID_FIELD {
                record.insert(name, value.clone());
            }
        }
        records.insert(id, record);
        Ok(id)
    }

    async fn write(&self, model: &str, ids: &[RecordId], values: &Record) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.write += 1;
        Self::ensure_connected(&state)?;
        let Some(records) = state.models.get_mut(model) else {
            return Ok(false);
        };
        for id in ids {
            if let Some(record) = records.get_mut(id) {
                for (name, value) in values.iter() {
                    record.insert(name, value.clone());
                }
            }
        }
        Ok(true)
    }

    async fn search_read(&self, model: &str, domain: &Domain, fields: &[String]) -> Result<Vec<Record>> {
        let mut state = self.state.lock().unwrap();
        state.calls.search_read += 1;
        Self::ensure_connected(&state)?;
        Ok(Self::matching(&state, model, domain)
            .iter()
            .map(|r| if fields.is_empty() { r.clone() } else { r.project(fields) })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_shared::types::{FieldType, FieldValue};

    fn countries() -> MockObjectStore {
        MockObjectStore::new()
            .with_record("res.country", Record::new().with("id", 20).with("code", "FR"))
            .with_record("res.country", Record::new().with("id", 10).with("code", "FR"))
            .with_record("res.country", Record::new().with("id", 30).with("code", "DE"))
    }

    #[tokio::test]
    async fn test_search_returns_ascending_ids() {
        let store = countries();
        let ids = store.search("res.country", &Domain::eq("code", "FR")).await.unwrap();
        assert_eq!(ids, vec![10, 20]);
        assert_eq!(store.calls().search, 1);
    }

    #[tokio::test]
    async fn test_read_projects_and_skips_missing() {
        let store = countries();
        let records = store
            .read("res.country", &[30, 99, 10], &["code".to_string()])
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), Some(30));
        assert_eq!(records[1].get("code"), Some(&FieldValue::from("FR")));
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let store = countries();
        let id = store
            .create("res.country", &Record::new().with("code", "IT"))
            .await
            .unwrap();

        assert_eq!(id, 31);
        assert_eq!(store.get("res.country", 31).unwrap().get("code"), Some(&FieldValue::from("IT")));
        assert_eq!(store.calls().mutations(), 1);
    }

    #[tokio::test]
    async fn test_injected_create_failure() {
        let store = countries();
        store.fail_creates_matching("res.country", Domain::eq("code", "XX"), "boom");

        let err = store
            .create("res.country", &Record::new().with("code", "XX"))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Fault { .. }));
        assert!(store.create("res.country", &Record::new().with("code", "IT")).await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_authentication() {
        let store = MockObjectStore::new().failing_authentication();
        let err = store.authenticate().await.unwrap_err();
        assert!(err.is_connection());
        assert_eq!(store.calls().authenticate, 1);
    }

    #[tokio::test]
    async fn test_disconnected_store_fails_every_call() {
        let store = countries();
        store.disconnect();

        let err = store.read("res.country", &[10], &[]).await.unwrap_err();
        assert!(matches!(err, RpcError::Connection(_)));
        assert!(store.create("res.country", &Record::new().with("code", "IT")).await.is_err());
        assert_eq!(store.records("res.country").len(), 3);
    }

    #[tokio::test]
    async fn test_injected_read_fault() {
        let store = countries();
        store.fail_reads("res.country", "access denied");

        let err = store.read("res.country", &[10], &[]).await.unwrap_err();
        assert!(matches!(err, RpcError::Fault { .. }));
        assert!(!err.is_connection());
    }

    #[tokio::test]
    async fn test_catalog() {
        let store = MockObjectStore::new()
            .with_fields("res.partner", vec![FieldMeta::new("name", FieldType::Char, None)])
            .with_record("res.country", Record::new().with("id", 1));

        let models = store.list_models().await.unwrap();
        let names: Vec<&str> = models.iter().map(|m| m.model.as_str()).collect();
        assert_eq!(names, vec!["res.country", "res.partner"]);
        assert_eq!(store.list_fields("res.partner").await.unwrap().len(), 1);
        assert!(store.list_fields("res.users").await.is_err());
    }
}
