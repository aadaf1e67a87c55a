//! The adapter facade the host framework drives: registration hooks plus
//! create/find/update/destroy.
//!
//! Every CRUD call resolves its collection, builds one request per store
//! round trip, and returns exactly one `Result`.
//!
//! # Fan-out
//! `update` with a non-identifier filter and every `destroy` first look the
//! matching documents up, then issue one request per match. Those follow-up
//! requests run concurrently and are not atomic; the caller gets a
//! [`FanOut`] listing every success and every failure.

use std::sync::Arc;

use futures::future;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::criteria::{Criteria, ID_FIELD};
use crate::error::AdapterError;
use crate::normalize::normalize_response;
use crate::registry::{CollectionDescriptor, CollectionEntry, CollectionRegistry};
use crate::request::{Normalized, Operation, Record};
use crate::schema::FieldDefinitions;
use crate::translate::build_request;
use crate::transport::DocumentTransport;

/// A per-record failure inside a fan-out.
#[derive(Debug)]
pub struct FanOutFailure {
    /// Identifier of the matched document, if it had one.
    pub id: Option<String>,
    pub error: AdapterError,
}

/// Aggregated outcome of an update/destroy that may touch several records.
#[derive(Debug, Default)]
pub struct FanOut {
    pub records: Vec<Record>,
    pub failures: Vec<FanOutFailure>,
}

impl FanOut {
    fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            failures: Vec::new(),
        }
    }

    /// `true` when no per-record request failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The records, or the first failure if any request failed.
    pub fn into_result(self) -> Result<Vec<Record>, AdapterError> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.records),
        }
    }
}

/// Document-store adapter over a [`DocumentTransport`].
pub struct Adapter {
    registry: CollectionRegistry,
    transport: Arc<dyn DocumentTransport>,
}

impl Adapter {
    /// Create an adapter with an empty registry and the built-in defaults.
    pub fn new(transport: Arc<dyn DocumentTransport>) -> Self {
        Self::with_registry(CollectionRegistry::new(), transport)
    }

    pub fn with_registry(registry: CollectionRegistry, transport: Arc<dyn DocumentTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    // ─── Lifecycle hooks ─────────────────────────────────────────────────────

    /// Register a model's collection. Never fails.
    pub fn register_collection(&self, descriptor: CollectionDescriptor) -> Result<(), AdapterError> {
        self.registry.register(descriptor);
        Ok(())
    }

    /// The store is schemaless, so unregistering keeps nothing to clean up.
    pub fn unregister(&self, _collection: &str) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Release held connections.
    pub async fn teardown(&self) -> Result<(), AdapterError> {
        self.transport.close().await
    }

    pub fn define(&self, _collection: &str, _definition: &FieldDefinitions) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Always an empty attribute map: the store has no schema to report.
    pub fn describe(&self, _collection: &str) -> Result<FieldDefinitions, AdapterError> {
        Ok(FieldDefinitions::new())
    }

    pub fn drop(&self, _collection: &str) -> Result<(), AdapterError> {
        Ok(())
    }

    // ─── CRUD ────────────────────────────────────────────────────────────────

    /// Create one document from `payload`.
    pub async fn create(&self, collection: &str, payload: Map<String, Value>) -> Result<Normalized, AdapterError> {
        let entry = self.registry.get(collection)?;
        self.execute(&entry, Operation::Create, None, Some(payload)).await
    }

    /// Find documents matching `criteria`; no criteria reads the default view.
    pub async fn find(&self, collection: &str, criteria: Option<Criteria>) -> Result<Vec<Record>, AdapterError> {
        let entry = self.registry.get(collection)?;
        self.execute(&entry, Operation::Find, criteria, None)
            .await
            .map(Normalized::into_records)
    }

    /// Update documents matching `criteria` with `payload`.
    ///
    /// An identifier (or no filter at all) sends one request; any other filter
    /// fans out over the documents `find` returns for it.
    pub async fn update(
        &self,
        collection: &str,
        criteria: Option<Criteria>,
        payload: Map<String, Value>,
    ) -> Result<FanOut, AdapterError> {
        let entry = self.registry.get(collection)?;
        let criteria = criteria.unwrap_or_default();

        if criteria.has_id() || criteria.is_unfiltered() {
            let out = self
                .execute(&entry, Operation::Update, Some(criteria), Some(payload))
                .await?;
            return Ok(FanOut::from_records(out.into_records()));
        }

        let matches = self
            .execute(&entry, Operation::Find, Some(criteria), None)
            .await?
            .into_records();
        tracing::debug!(collection, matches = matches.len(), "fanning out update");

        let requests = matches.into_iter().map(|doc| {
            let entry = entry.clone();
            let mut payload = payload.clone();
            async move {
                let id = doc_id(&doc);
                let Some(target) = id.clone() else {
                    return (id, Err(missing_id(&entry)));
                };
                if let Some(rev) = doc_rev(&doc) {
                    payload.entry("_rev").or_insert(Value::String(rev));
                }
                let out = self
                    .execute(&entry, Operation::Update, Some(Criteria::by_id(target)), Some(payload))
                    .await;
                (id, out)
            }
        });
        Ok(collect_fan_out(future::join_all(requests).await))
    }

    /// Delete every document matching `criteria`.
    ///
    /// Matches are looked up first so each delete can carry the document's
    /// current revision token as `?rev=`.
    ///
    /// With no criteria (or an empty `where`) the lookup reads the default
    /// view, so every document in the collection is deleted.
    pub async fn destroy(&self, collection: &str, criteria: Option<Criteria>) -> Result<FanOut, AdapterError> {
        let entry = self.registry.get(collection)?;
        let matches = self
            .execute(&entry, Operation::Find, criteria, None)
            .await?
            .into_records();
        if matches.is_empty() {
            tracing::debug!(collection, "nothing to destroy");
            return Ok(FanOut::default());
        }

        let requests = matches.into_iter().map(|doc| {
            let entry = entry.clone();
            async move {
                let id = doc_id(&doc);
                let Some(target) = id.clone() else {
                    return (id, Err(missing_id(&entry)));
                };
                let mut clause = Map::new();
                clause.insert(ID_FIELD.into(), Value::String(target));
                if let Some(rev) = doc_rev(&doc) {
                    clause.insert("rev".into(), Value::String(rev));
                }
                let out = self
                    .execute(&entry, Operation::Destroy, Some(Criteria::matching(clause)), None)
                    .await;
                (id, out)
            }
        });
        Ok(collect_fan_out(future::join_all(requests).await))
    }

    /// Streaming is not supported: the sink is closed without any records.
    pub async fn stream(
        &self,
        collection: &str,
        _criteria: Option<Criteria>,
        sink: mpsc::Sender<Record>,
    ) -> Result<(), AdapterError> {
        self.registry.get(collection)?;
        drop(sink);
        Ok(())
    }

    /// Build, send and normalize a single request.
    pub async fn execute(
        &self,
        entry: &CollectionEntry,
        op: Operation,
        criteria: Option<Criteria>,
        payload: Option<Map<String, Value>>,
    ) -> Result<Normalized, AdapterError> {
        let req = build_request(entry, op, criteria, payload)?;
        tracing::debug!(
            collection = %entry.name,
            operation = %op,
            method = %req.verb,
            target = %req.target(),
            "sending request"
        );

        let resp = match self.transport.send(req).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(collection = %entry.name, operation = %op, error = %e, "request failed");
                return Err(e);
            }
        };
        tracing::debug!(collection = %entry.name, status = resp.status, "response received");

        normalize_response(entry, op, resp)
    }
}

/// `_id`, else `id`.
fn doc_id(doc: &Record) -> Option<String> {
    string_field(doc, "_id").or_else(|| string_field(doc, "id"))
}

/// `_rev`, else `rev`, else the same under a view row's `value`.
fn doc_rev(doc: &Record) -> Option<String> {
    let own = |v: &Value| string_field(v, "_rev").or_else(|| string_field(v, "rev"));
    own(doc).or_else(|| doc.get("value").and_then(own))
}

fn string_field(doc: &Record, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn missing_id(entry: &CollectionEntry) -> AdapterError {
    AdapterError::Other(format!("matched {} document has no identifier", entry.name))
}

fn collect_fan_out(outcomes: Vec<(Option<String>, Result<Normalized, AdapterError>)>) -> FanOut {
    let mut fan_out = FanOut::default();
    for (id, outcome) in outcomes {
        match outcome {
            Ok(out) => fan_out.records.extend(out.into_records()),
            Err(error) => {
                tracing::warn!(id = ?id, error = %error, "fan-out request failed");
                fan_out.failures.push(FanOutFailure { id, error });
            }
        }
    }
    fan_out
}
