//! Request construction: path, query string, body and headers for one CRUD
//! call against one collection.
//!
//! Path priority:
//! ```text
//! where.id present      → {root}/{id}
//! find, no criteria     → {root}/_design/{ddocPrefix}_{resource}/_view/{resource}_all[/{action}]
//! anything else         → {root}
//! ```
//! where `{root}` is `{pathname}/{database}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};
use url::Url;

use crate::config::{CollectionConfig, Credentials};
use crate::criteria::Criteria;
use crate::error::AdapterError;
use crate::registry::CollectionEntry;
use crate::request::{Operation, OutboundRequest};

/// Payload field carrying the document's collection identity.
pub const TYPE_FIELD: &str = "type";

/// Build the outbound request for `op`.
///
/// `criteria` is consumed: the identifier moves into the path and the
/// remaining `where` fields into either the query string or the body,
/// depending on whether the mapped verb carries a body.
pub fn build_request(
    entry: &CollectionEntry,
    op: Operation,
    criteria: Option<Criteria>,
    payload: Option<Map<String, Value>>,
) -> Result<OutboundRequest, AdapterError> {
    let cfg = &entry.config;
    let verb = cfg.methods.verb_for(op)?;

    let mut criteria = criteria.unwrap_or_default();
    let id = criteria.take_id();

    let mut url = Url::parse(&cfg.origin())?;
    if id.is_none() && op == Operation::Find && criteria.is_unfiltered() {
        url.set_path(&view_path(cfg));
    } else {
        url.set_path(&resource_root(cfg));
    }
    if let Some(id) = &id {
        url.path_segments_mut()
            .map_err(|_| AdapterError::InvalidUrl(format!("{} cannot take a path", cfg.origin())))?
            .pop_if_empty()
            .push(id);
    }

    let mut query = cfg.query.clone();
    let mut body: Option<Map<String, Value>> = None;
    let clause = criteria.where_clause.take().unwrap_or_default();
    if verb.carries_body() {
        if !clause.is_empty() {
            body = Some(clause);
        }
    } else {
        query.extend(clause);
        if let Some(limit) = criteria.limit {
            query.insert("limit".into(), limit.into());
        }
        if let Some(skip) = criteria.skip {
            query.insert("skip".into(), skip.into());
        }
    }

    if let Some(mut payload) = payload {
        if op.writes_document() && !payload.contains_key(TYPE_FIELD) {
            payload.insert(TYPE_FIELD.into(), Value::String(cfg.resource.clone()));
        }
        body = Some(match body {
            Some(mut merged) => {
                merged.extend(payload);
                merged
            }
            None => payload,
        });
    }

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &query {
            pairs.append_pair(key, &query_value(value));
        }
    }

    let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
    if let Some(creds) = &cfg.credentials {
        headers.push(("Authorization".into(), basic_auth(creds)));
    }
    headers.extend(cfg.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

    let body = body
        .map(|b| serde_json::to_string(&b))
        .transpose()
        .map_err(|e| AdapterError::Other(format!("cannot serialize request body: {e}")))?;
    if let Some(text) = &body {
        headers.push(("Content-Type".into(), "application/json".into()));
        headers.push(("Content-Length".into(), text.len().to_string()));
    }

    Ok(OutboundRequest {
        verb,
        url,
        headers,
        body,
    })
}

/// `{pathname}/{database}`, always with a leading slash.
pub fn resource_root(cfg: &CollectionConfig) -> String {
    let mut path = String::new();
    let prefix = cfg.pathname.trim_matches('/');
    if !prefix.is_empty() {
        path.push('/');
        path.push_str(prefix);
    }
    let database = cfg.database.trim_matches('/');
    if !database.is_empty() {
        path.push('/');
        path.push_str(database);
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}

/// Path of the "all records of this resource" view.
pub fn view_path(cfg: &CollectionConfig) -> String {
    let root = resource_root(cfg);
    let root = root.trim_end_matches('/');
    let resource = &cfg.resource;
    let mut path = format!(
        "{root}/_design/{}_{resource}/_view/{resource}_all",
        cfg.ddoc_prefix
    );
    if let Some(action) = &cfg.action {
        path.push('/');
        path.push_str(action.trim_matches('/'));
    }
    path
}

/// `Basic base64(user:password)`.
pub fn basic_auth(creds: &Credentials) -> String {
    let token = STANDARD.encode(format!("{}:{}", creds.user, creds.password));
    format!("Basic {token}")
}

/// Strings go out verbatim; everything else as its JSON text.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
