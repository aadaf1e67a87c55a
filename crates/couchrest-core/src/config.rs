//! Per-collection configuration: user-supplied options, adapter defaults, and
//! the resolved [`CollectionConfig`] the translator works from.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AdapterError;
use crate::request::Operation;
use crate::transform::{IdentityTransformer, RecordTransformer};

/// HTTP methods the translator knows how to place criteria for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
        }
    }

    /// Criteria for these verbs travel in the JSON body; everything else
    /// puts them in the query string.
    pub fn carries_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl FromStr for HttpVerb {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            _ => Err(AdapterError::UnsupportedMethod { method: s.to_string() }),
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved CRUD → HTTP method mapping.
///
/// Methods are kept as the configured text and only parsed when a request is
/// built, so a bad mapping surfaces on first use instead of at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMap {
    pub create: String,
    pub find: String,
    pub update: String,
    pub destroy: String,
}

impl Default for MethodMap {
    fn default() -> Self {
        Self {
            create: "POST".into(),
            find: "GET".into(),
            update: "PUT".into(),
            destroy: "DELETE".into(),
        }
    }
}

impl MethodMap {
    /// The configured method text for `op`.
    pub fn method_for(&self, op: Operation) -> &str {
        match op {
            Operation::Create => &self.create,
            Operation::Find => &self.find,
            Operation::Update => &self.update,
            Operation::Destroy => &self.destroy,
        }
    }

    /// Parse the method configured for `op`.
    pub fn verb_for(&self, op: Operation) -> Result<HttpVerb, AdapterError> {
        self.method_for(op).parse()
    }

    fn overlay(&self, overrides: &MethodOverrides) -> Self {
        Self {
            create: overrides.create.clone().unwrap_or_else(|| self.create.clone()),
            find: overrides.find.clone().unwrap_or_else(|| self.find.clone()),
            update: overrides.update.clone().unwrap_or_else(|| self.update.clone()),
            destroy: overrides.destroy.clone().unwrap_or_else(|| self.destroy.clone()),
        }
    }
}

/// Per-verb overrides; unset verbs keep the default mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodOverrides {
    pub create: Option<String>,
    pub find: Option<String>,
    pub update: Option<String>,
    pub destroy: Option<String>,
}

/// What a 4xx response turns into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientErrorPolicy {
    /// Success with an empty result sequence, so missing-record lookups do
    /// not abort the caller.
    #[default]
    EmptyResult,
    /// Surface the status as [`AdapterError::ClientError`].
    Error,
}

/// Basic-auth credential pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    /// Both halves must be non-empty, otherwise no credentials are used.
    pub fn from_parts(user: Option<String>, password: Option<String>) -> Option<Self> {
        match (user, password) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some(Self { user, password })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Options a model supplies for its collection. Every field is optional and
/// falls back to the adapter's [`CollectionDefaults`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionOptions {
    pub protocol: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub pathname: Option<String>,
    pub ddoc_prefix: Option<String>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub query: Option<Map<String, Value>>,
    pub methods: Option<MethodOverrides>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    pub client_errors: Option<ClientErrorPolicy>,
}

/// Adapter-wide defaults merged under every collection's options.
#[derive(Debug, Clone)]
pub struct CollectionDefaults {
    pub protocol: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
    pub pathname: String,
    pub ddoc_prefix: String,
    pub query: Map<String, Value>,
    pub methods: MethodMap,
    pub user: Option<String>,
    pub password: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub client_errors: ClientErrorPolicy,
}

impl Default for CollectionDefaults {
    fn default() -> Self {
        Self {
            protocol: "http".into(),
            hostname: "localhost".into(),
            port: 5984,
            database: "sails".into(),
            pathname: String::new(),
            ddoc_prefix: "sails".into(),
            query: Map::new(),
            methods: MethodMap::default(),
            user: None,
            password: None,
            headers: BTreeMap::new(),
            client_errors: ClientErrorPolicy::default(),
        }
    }
}

impl CollectionDefaults {
    /// Merge `options` over these defaults for the collection `identity`.
    ///
    /// The resource name falls back to the identity.
    pub fn resolve(
        &self,
        identity: &str,
        options: CollectionOptions,
        transformer: Option<Arc<dyn RecordTransformer>>,
    ) -> CollectionConfig {
        let methods = match &options.methods {
            Some(overrides) => self.methods.overlay(overrides),
            None => self.methods.clone(),
        };
        let resource = options
            .resource
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| identity.to_string());
        let credentials = Credentials::from_parts(
            options.user.or_else(|| self.user.clone()),
            options.password.or_else(|| self.password.clone()),
        );

        CollectionConfig {
            protocol: options.protocol.unwrap_or_else(|| self.protocol.clone()),
            hostname: options.hostname.unwrap_or_else(|| self.hostname.clone()),
            port: options.port.unwrap_or(self.port),
            database: options.database.unwrap_or_else(|| self.database.clone()),
            pathname: options.pathname.unwrap_or_else(|| self.pathname.clone()),
            ddoc_prefix: options.ddoc_prefix.unwrap_or_else(|| self.ddoc_prefix.clone()),
            resource,
            action: options.action.filter(|a| !a.is_empty()),
            query: options.query.unwrap_or_else(|| self.query.clone()),
            methods,
            credentials,
            headers: options.headers.unwrap_or_else(|| self.headers.clone()),
            client_errors: options.client_errors.unwrap_or(self.client_errors),
            transformer: transformer.unwrap_or_else(|| Arc::new(IdentityTransformer)),
        }
    }
}

/// Fully resolved, immutable configuration of one collection.
#[derive(Clone)]
pub struct CollectionConfig {
    pub protocol: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
    pub pathname: String,
    pub ddoc_prefix: String,
    pub resource: String,
    pub action: Option<String>,
    pub query: Map<String, Value>,
    pub methods: MethodMap,
    pub credentials: Option<Credentials>,
    pub headers: BTreeMap<String, String>,
    pub client_errors: ClientErrorPolicy,
    pub transformer: Arc<dyn RecordTransformer>,
}

impl CollectionConfig {
    /// `protocol://hostname:port`, no trailing slash.
    pub fn origin(&self) -> String {
        let scheme = self.protocol.trim_end_matches("//").trim_end_matches(':');
        format!("{scheme}://{}:{}", self.hostname, self.port)
    }
}

impl fmt::Debug for CollectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("origin", &self.origin())
            .field("database", &self.database)
            .field("pathname", &self.pathname)
            .field("ddoc_prefix", &self.ddoc_prefix)
            .field("resource", &self.resource)
            .field("action", &self.action)
            .field("methods", &self.methods)
            .field("credentials", &self.credentials)
            .field("client_errors", &self.client_errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_a_name_is_given() {
        let cfg = CollectionDefaults::default().resolve("users", CollectionOptions::default(), None);
        assert_eq!(cfg.resource, "users");
        assert_eq!(cfg.origin(), "http://localhost:5984");
        assert_eq!(cfg.methods.verb_for(Operation::Create).unwrap(), HttpVerb::Post);
        assert_eq!(cfg.methods.verb_for(Operation::Find).unwrap(), HttpVerb::Get);
        assert_eq!(cfg.methods.verb_for(Operation::Update).unwrap(), HttpVerb::Put);
        assert_eq!(cfg.methods.verb_for(Operation::Destroy).unwrap(), HttpVerb::Delete);
        assert!(cfg.credentials.is_none());
        assert!(cfg.query.is_empty());
    }

    #[test]
    fn single_method_override_keeps_the_rest() {
        let options = CollectionOptions {
            methods: Some(MethodOverrides {
                update: Some("patch".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = CollectionDefaults::default().resolve("users", options, None);
        assert_eq!(cfg.methods.verb_for(Operation::Update).unwrap(), HttpVerb::Patch);
        assert_eq!(cfg.methods.create, "POST");
    }

    #[test]
    fn explicit_resource_wins_over_identity() {
        let options = CollectionOptions {
            resource: Some("people".into()),
            ..Default::default()
        };
        let cfg = CollectionDefaults::default().resolve("users", options, None);
        assert_eq!(cfg.resource, "people");
    }

    #[test]
    fn credentials_need_both_halves() {
        assert!(Credentials::from_parts(Some("admin".into()), None).is_none());
        assert!(Credentials::from_parts(Some("admin".into()), Some(String::new())).is_none());
        assert!(Credentials::from_parts(Some("admin".into()), Some("pw".into())).is_some());
    }

    #[test]
    fn unknown_verb_is_rejected() {
        let err = "TRACE".parse::<HttpVerb>().unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedMethod { method } if method == "TRACE"));
        assert_eq!("delete".parse::<HttpVerb>().unwrap(), HttpVerb::Delete);
    }

    #[test]
    fn options_deserialize_from_camel_case() {
        let options: CollectionOptions = serde_json::from_value(serde_json::json!({
            "hostname": "couch.internal",
            "port": 6984,
            "protocol": "https",
            "ddocPrefix": "app",
            "clientErrors": "error",
            "methods": { "find": "post" }
        }))
        .unwrap();
        let cfg = CollectionDefaults::default().resolve("users", options, None);
        assert_eq!(cfg.origin(), "https://couch.internal:6984");
        assert_eq!(cfg.ddoc_prefix, "app");
        assert_eq!(cfg.client_errors, ClientErrorPolicy::Error);
        assert_eq!(cfg.methods.verb_for(Operation::Find).unwrap(), HttpVerb::Post);
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::from_parts(Some("admin".into()), Some("hunter2".into())).unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
