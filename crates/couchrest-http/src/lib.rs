//! couchrest-http: `reqwest` implementation of couchrest's
//! [`DocumentTransport`](couchrest_core::DocumentTransport).
//!
//! # Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use couchrest_core::{Adapter, CollectionDescriptor};
//! use couchrest_http::HttpTransport;
//!
//! # async fn run() -> Result<(), couchrest_core::AdapterError> {
//! let adapter = Adapter::new(Arc::new(HttpTransport::with_defaults()?));
//! adapter.register_collection(CollectionDescriptor::new("users"))?;
//! let users = adapter.find("users", None).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{HttpClientConfig, HttpTransport};
