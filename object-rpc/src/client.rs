//! JSON-RPC client for Odoo-style object stores.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use migrator_shared::types::{ConnectionParams, Domain, FieldMeta, FieldType, ModelInfo, Record, RecordId};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::encoding::{encode_domain, encode_record};
use crate::error::{Result, RpcError};
use crate::ObjectStore;

/// Sort order sent with every search so that "first match" means lowest id.
const SEARCH_ORDER: &str = "id asc";

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcFault>,
}

#[derive(Debug, Deserialize)]
struct RpcFault {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<RpcFaultData>,
}

#[derive(Debug, Deserialize)]
struct RpcFaultData {
    #[serde(default)]
    message: Option<String>,
}

/// Production client talking to `{url}/jsonrpc`.
///
/// # Example
///
/// ```ignore
/// use object_rpc::{ObjectStore, OdooClient};
///
/// let client = OdooClient::new(params, Duration::from_secs(120))?;
/// client.authenticate().await?;
/// let ids = client.search("res.country", &Domain::eq("code", "FR")).await?;
/// ```
pub struct OdooClient {
    params: ConnectionParams,
    endpoint: String,
    client: ReqwestClient,
    uid: RwLock<Option<i64>>,
    request_id: AtomicU64,
}

impl OdooClient {
    pub fn new(params: ConnectionParams, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::connection(e.to_string()))?;
        let endpoint = format!("{}/jsonrpc", params.url.trim_end_matches('/'));
        Ok(Self {
            params,
            endpoint,
            client,
            uid: RwLock::new(None),
            request_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, service: &str, method: &str, args: Value) -> Result<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": { "service": service, "method": method, "args": args },
            "id": id,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let response: RpcResponse = response.json().await?;
        decode_response(response)
    }

    async fn execute_kw(&self, model: &str, method: &str, args: Value, kwargs: Value) -> Result<Value> {
        let uid = (*self.uid.read().await).ok_or(RpcError::NotAuthenticated)?;
        debug!(model, method, "execute_kw");
        self.call(
            "object",
            "execute_kw",
            json!([
                self.params.database,
                uid,
                self.params.password,
                model,
                method,
                args,
                kwargs
            ]),
        )
        .await
    }
}

fn decode_response(response: RpcResponse) -> Result<Value> {
    if let Some(fault) = response.error {
        let message = fault
            .data
            .and_then(|d| d.message)
            .filter(|m| !m.is_empty())
            .unwrap_or(fault.message);
        return Err(RpcError::fault(fault.code, message));
    }
    response
        .result
        .ok_or_else(|| RpcError::decode("response carries neither result nor error"))
}

fn decode_ids(value: &Value) -> Result<Vec<RecordId>> {
    value
        .as_array()
        .ok_or_else(|| RpcError::decode(format!("expected an id list, got {value}")))?
        .iter()
        .map(|v| v.as_i64().ok_or_else(|| RpcError::decode(format!("invalid id {v}"))))
        .collect()
}

fn decode_records(value: &Value) -> Result<Vec<Record>> {
    let rows = value
        .as_array()
        .ok_or_else(|| RpcError::decode(format!("expected a record list, got {value}")))?;
    Ok(rows.iter().map(Record::from_json).collect())
}

/// `create` returns the new id, or a one-element list when called in batch form.
fn decode_created_id(value: &Value) -> Result<RecordId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Array(items) if items.len() == 1 => items[0].as_i64(),
        _ => None,
    }
    .ok_or_else(|| RpcError::decode(format!("unexpected create result {value}")))
}

fn decode_fields(value: &Value) -> Result<Vec<FieldMeta>> {
    let object = value
        .as_object()
        .ok_or_else(|| RpcError::decode(format!("expected field metadata, got {value}")))?;
    Ok(object
        .iter()
        .map(|(name, attrs)| {
            let field_type = attrs.get("type").and_then(Value::as_str).unwrap_or_default();
            let relation = attrs.get("relation").and_then(Value::as_str);
            FieldMeta::new(name.as_str(), FieldType::from(field_type), relation)
        })
        .collect())
}

#[async_trait]
impl ObjectStore for OdooClient {
    #[instrument(skip(self), fields(url = %self.params.url, db = %self.params.database))]
    async fn authenticate(&self) -> Result<i64> {
        let result = self
            .call(
                "common",
                "authenticate",
                json!([
                    self.params.database,
                    self.params.username,
                    self.params.password,
                    {}
                ]),
            )
            .await
            .map_err(|e| match e {
                RpcError::Fault { message, .. } => RpcError::authentication(message),
                other => other,
            })?;

        let uid = result.as_i64().filter(|uid| *uid > 0).ok_or_else(|| {
            RpcError::authentication(format!(
                "invalid credentials for user '{}' on database '{}'",
                self.params.username, self.params.database
            ))
        })?;
        *self.uid.write().await = Some(uid);
        Ok(uid)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let rows = self
            .search_read("ir.model", &Domain::all(), &["model".to_string(), "name".to_string()])
            .await?;
        let mut models: Vec<ModelInfo> = rows
            .iter()
            .filter_map(|row| {
                let model = row.get("model")?.to_json();
                let name = row.get("name").map(|n| n.to_json()).unwrap_or(Value::Null);
                Some(ModelInfo {
                    model: model.as_str()?.to_string(),
                    name: name.as_str().unwrap_or_default().to_string(),
                })
            })
            .collect();
        models.sort_by(|a, b| a.model.cmp(&b.model));
        Ok(models)
    }

    async fn list_fields(&self, model: &str) -> Result<Vec<FieldMeta>> {
        let result = self
            .execute_kw(model, "fields_get", json!([]), json!({ "attributes": ["type", "relation"] }))
            .await?;
        decode_fields(&result)
    }

    async fn search(&self, model: &str, domain: &Domain) -> Result<Vec<RecordId>> {
        let result = self
            .execute_kw(model, "search", json!([encode_domain(domain)]), json!({ "order": SEARCH_ORDER }))
            .await?;
        decode_ids(&result)
    }

    async fn read(&self, model: &str, ids: &[RecordId], fields: &[String]) -> Result<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = self
            .execute_kw(model, "read", json!([ids]), json!({ "fields": fields }))
            .await?;
        decode_records(&result)
    }

    async fn create(&self, model: &str, values: &Record) -> Result<RecordId> {
        let result = self
            .execute_kw(model, "create", json!([encode_record(values)]), json!({}))
            .await?;
        decode_created_id(&result)
    }

    async fn write(&self, model: &str, ids: &[RecordId], values: &Record) -> Result<bool> {
        let result = self
            .execute_kw(model, "write", json!([ids, encode_record(values)]), json!({}))
            .await?;
        Ok(result.as_bool().unwrap_or(false))
    }

    async fn search_read(&self, model: &str, domain: &Domain, fields: &[String]) -> Result<Vec<Record>> {
        let result = self
            .execute_kw(
                model,
                "search_read",
                json!([encode_domain(domain)]),
                json!({ "fields": fields, "order": SEARCH_ORDER }),
            )
            .await?;
        decode_records(&result)
    }
}
