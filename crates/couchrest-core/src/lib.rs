//! couchrest-core: collection registry and request translation for a
//! CouchDB-style document store.
//!
//! # Overview
//!
//! couchrest lets an ORM-style host framework drive a document store over
//! HTTP. The core crate defines:
//!
//! - [`Adapter`]: the CRUD facade (create/find/update/destroy + lifecycle hooks)
//! - [`CollectionRegistry`]: name → resolved [`CollectionConfig`] + field definitions
//! - [`translate`]: path / query / body / header construction
//! - [`normalize`]: response reshaping, date coercion, [`RecordTransformer`] stages
//! - [`DocumentTransport`]: the async seam an HTTP client implements
//! - [`AdapterError`]: structured error type

pub mod adapter;
pub mod config;
pub mod criteria;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod request;
pub mod schema;
pub mod transform;
pub mod translate;
pub mod transport;

pub use adapter::{Adapter, FanOut, FanOutFailure};
pub use config::{
    ClientErrorPolicy, CollectionConfig, CollectionDefaults, CollectionOptions, Credentials,
    HttpVerb, MethodMap, MethodOverrides,
};
pub use criteria::Criteria;
pub use error::AdapterError;
pub use registry::{CollectionDescriptor, CollectionEntry, CollectionRegistry};
pub use request::{Normalized, Operation, OutboundRequest, RawResponse, Record};
pub use schema::{FieldDefinition, FieldDefinitions};
pub use transform::{IdentityTransformer, RecordTransformer};
pub use transport::DocumentTransport;
