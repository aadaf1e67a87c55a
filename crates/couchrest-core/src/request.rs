//! Wire types exchanged with a [`DocumentTransport`](crate::DocumentTransport)
//! and the normalized results handed back to the host.

use serde_json::Value;
use url::Url;

use crate::config::HttpVerb;

/// A record as returned by the store (a JSON document, usually an object).
pub type Record = Value;

/// Logical CRUD operation requested by the host framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Find,
    Update,
    Destroy,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Find => "find",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }

    /// Operations whose payload gets the resource name as a `type` field.
    pub fn writes_document(&self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built HTTP request, ready for a transport to send.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub verb: HttpVerb,
    /// Absolute URI including the query string.
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body.
    pub body: Option<String>,
}

impl OutboundRequest {
    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Relative request target: the URI with scheme, host and port stripped.
    pub fn target(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{q}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }

    /// Decoded query parameters in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Value of the first query parameter named `name`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body parsed back into JSON.
    pub fn body_json(&self) -> Option<Value> {
        self.body.as_deref().and_then(|b| serde_json::from_str(b).ok())
    }
}

/// Status and raw body text of a store response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// The shape a response was normalized into.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Create/update/destroy against a single document.
    Record(Record),
    /// `find` results, or the empty sequence a swallowed 4xx produces.
    Records(Vec<Record>),
}

impl Normalized {
    /// Flatten into a sequence; a single record becomes a one-element vec.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Record(r) => vec![r],
            Self::Records(rs) => rs,
        }
    }

    /// The single record, or the first element of a sequence.
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Record(r) => Some(r),
            Self::Records(rs) => rs.into_iter().next(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Records(rs) if rs.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(url: &str) -> OutboundRequest {
        OutboundRequest {
            verb: HttpVerb::Get,
            url: Url::parse(url).unwrap(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Some(r#"{"a":1}"#.into()),
        }
    }

    #[test]
    fn target_strips_origin() {
        let req = request("http://localhost:5984/sails/42?rev=1-abc");
        assert_eq!(req.target(), "/sails/42?rev=1-abc");
        assert_eq!(req.path(), "/sails/42");
        assert_eq!(req.query_param("rev").as_deref(), Some("1-abc"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request("http://localhost:5984/");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body_json(), Some(json!({ "a": 1 })));
    }

    #[test]
    fn normalized_flattening() {
        assert_eq!(Normalized::Record(json!(1)).into_records(), vec![json!(1)]);
        assert!(Normalized::Records(vec![]).is_empty());
        assert_eq!(Normalized::Records(vec![json!(2), json!(3)]).into_record(), Some(json!(2)));
    }
}
