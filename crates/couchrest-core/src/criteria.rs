//! Criteria supplied with find/update/destroy calls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding a record's singular identifier in a `where` clause.
pub const ID_FIELD: &str = "id";

/// A `where`-style filter plus paging options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
}

impl Criteria {
    /// Criteria matching a single identifier.
    pub fn by_id(id: impl Into<String>) -> Self {
        let mut clause = Map::new();
        clause.insert(ID_FIELD.into(), Value::String(id.into()));
        Self::matching(clause)
    }

    /// Criteria with the given `where` clause.
    pub fn matching(clause: Map<String, Value>) -> Self {
        Self {
            where_clause: Some(clause),
            ..Default::default()
        }
    }

    /// `true` when there is no `where` clause or it is empty.
    pub fn is_unfiltered(&self) -> bool {
        self.where_clause.as_ref().map_or(true, Map::is_empty)
    }

    /// `true` when the `where` clause names a usable identifier.
    pub fn has_id(&self) -> bool {
        self.where_clause
            .as_ref()
            .and_then(|c| c.get(ID_FIELD))
            .is_some_and(is_identifier)
    }

    /// Remove the identifier from the `where` clause, returning it as a path
    /// segment. Null identifiers count as absent; an empty string is left in
    /// the clause as an ordinary filter field.
    pub fn take_id(&mut self) -> Option<String> {
        let clause = self.where_clause.as_mut()?;
        let current = clause.get(ID_FIELD)?;
        if current.is_null() {
            clause.remove(ID_FIELD);
            return None;
        }
        if !is_identifier(current) {
            return None;
        }
        match clause.remove(ID_FIELD)? {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

fn is_identifier(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
