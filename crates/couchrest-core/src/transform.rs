//! Record transformer: optional user stages around response normalization.

use serde_json::Value;

/// Pre/post stages applied while a response is normalized.
///
/// Every stage defaults to the identity, so implementors only override what
/// they need. Single-record stages run for create/update/destroy responses;
/// sequence stages run for `find`.
pub trait RecordTransformer: Send + Sync {
    /// Before date coercion of a single record.
    fn before_record(&self, record: Value) -> Value {
        record
    }

    /// After date coercion of a single record.
    fn after_record(&self, record: Value) -> Value {
        record
    }

    /// Before date coercion of a result sequence.
    fn before_records(&self, records: Vec<Value>) -> Vec<Value> {
        records
    }

    /// After date coercion of a result sequence.
    fn after_records(&self, records: Vec<Value>) -> Vec<Value> {
        records
    }
}

/// Transformer with no stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransformer;

impl RecordTransformer for IdentityTransformer {}
