//! Response normalization: raw store responses into model-shaped records.

use serde_json::Value;

use crate::config::ClientErrorPolicy;
use crate::error::AdapterError;
use crate::registry::CollectionEntry;
use crate::request::{Normalized, Operation, RawResponse, Record};
use crate::schema::coerce_dates;

/// Keys under which list responses wrap their results, in lookup order.
pub const SEQUENCE_KEYS: [&str; 3] = ["rows", "objects", "results"];

/// Turn a raw response for `op` into the shape the host expects.
///
/// `find` always yields [`Normalized::Records`]; other operations yield a
/// [`Normalized::Record`], except that a swallowed 4xx yields an empty
/// sequence for every operation.
pub fn normalize_response(
    entry: &CollectionEntry,
    op: Operation,
    resp: RawResponse,
) -> Result<Normalized, AdapterError> {
    if resp.is_client_error() {
        return match entry.config.client_errors {
            ClientErrorPolicy::EmptyResult => {
                tracing::warn!(
                    collection = %entry.name,
                    operation = %op,
                    status = resp.status,
                    "client error from store, returning empty result"
                );
                Ok(Normalized::Records(Vec::new()))
            }
            ClientErrorPolicy::Error => Err(AdapterError::ClientError {
                status: resp.status,
                body: resp.body,
            }),
        };
    }

    let value: Value = serde_json::from_str(&resp.body)?;
    match op {
        Operation::Find => Ok(Normalized::Records(format_records(entry, into_sequence(value)))),
        _ => Ok(Normalized::Record(format_record(entry, value))),
    }
}

/// Unwrap `rows`/`objects`/`results` if present, then make sure the result
/// is a sequence.
pub fn into_sequence(value: Value) -> Vec<Value> {
    let inner = match value {
        Value::Object(mut obj) => {
            let key = SEQUENCE_KEYS
                .iter()
                .find(|k| obj.get(**k).is_some_and(|v| !v.is_null()));
            match key {
                Some(k) => obj.remove(*k).unwrap_or(Value::Null),
                None => Value::Object(obj),
            }
        }
        other => other,
    };
    match inner {
        Value::Array(items) => items,
        single => vec![single],
    }
}

/// Transformer stages and date coercion for one record.
pub fn format_record(entry: &CollectionEntry, record: Record) -> Record {
    let transformer = &entry.config.transformer;
    let mut record = transformer.before_record(record);
    coerce_dates(&mut record, &entry.definition);
    transformer.after_record(record)
}

/// Transformer stages and date coercion for a result sequence.
pub fn format_records(entry: &CollectionEntry, records: Vec<Record>) -> Vec<Record> {
    let transformer = &entry.config.transformer;
    let mut records = transformer.before_records(records);
    for record in &mut records {
        coerce_dates(record, &entry.definition);
    }
    transformer.after_records(records)
}
