//! Collection registry: maps collection names to their resolved
//! configuration and field definitions.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{CollectionConfig, CollectionDefaults, CollectionOptions};
use crate::error::AdapterError;
use crate::schema::FieldDefinitions;
use crate::transform::RecordTransformer;

/// What the host framework hands over when a model is registered.
#[derive(Clone, Default)]
pub struct CollectionDescriptor {
    /// Collection name; also the default resource name.
    pub identity: String,
    pub options: CollectionOptions,
    pub definition: FieldDefinitions,
    pub transformer: Option<Arc<dyn RecordTransformer>>,
}

impl CollectionDescriptor {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ..Default::default()
        }
    }

    pub fn with_options(mut self, options: CollectionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_definition(mut self, definition: FieldDefinitions) -> Self {
        self.definition = definition;
        self
    }

    pub fn with_transformer(mut self, transformer: Arc<dyn RecordTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }
}

/// A registered collection. Never mutated after registration.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    pub name: String,
    pub config: CollectionConfig,
    pub definition: FieldDefinitions,
}

/// In-memory registry, written at start-up and read on every call.
pub struct CollectionRegistry {
    defaults: CollectionDefaults,
    entries: RwLock<HashMap<String, Arc<CollectionEntry>>>,
}

impl CollectionRegistry {
    /// Create an empty registry using the built-in defaults.
    pub fn new() -> Self {
        Self::with_defaults(CollectionDefaults::default())
    }

    /// Create an empty registry merging options over `defaults`.
    pub fn with_defaults(defaults: CollectionDefaults) -> Self {
        Self {
            defaults,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn defaults(&self) -> &CollectionDefaults {
        &self.defaults
    }

    /// Resolve and store a collection. Re-registering a name replaces it.
    pub fn register(&self, descriptor: CollectionDescriptor) -> Arc<CollectionEntry> {
        let CollectionDescriptor {
            identity,
            options,
            definition,
            transformer,
        } = descriptor;
        let config = self.defaults.resolve(&identity, options, transformer);
        tracing::debug!(
            collection = %identity,
            resource = %config.resource,
            origin = %config.origin(),
            "registered collection"
        );
        let entry = Arc::new(CollectionEntry {
            name: identity.clone(),
            config,
            definition,
        });
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity, entry.clone());
        entry
    }

    /// Look up a registered collection.
    pub fn get(&self, name: &str) -> Result<Arc<CollectionEntry>, AdapterError> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::NotRegistered {
                collection: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Number of registered collections.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CollectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
