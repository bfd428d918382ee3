use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::definition::SerializerDefinition;
use crate::error::RegistryError;
use crate::inflection;

static GLOBAL_REGISTRY: Lazy<SerializerRegistry> = Lazy::new(SerializerRegistry::new);

/// Top-level serializer definitions keyed by normalized type key.
///
/// Registration happens at setup; resolution only reads, so clones can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct SerializerRegistry {
  definitions: Arc<DashMap<String, Arc<SerializerDefinition>>>,
}

impl SerializerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Process-wide registry.
  pub fn global() -> &'static SerializerRegistry {
    &GLOBAL_REGISTRY
  }

  pub fn register(&self, definition: SerializerDefinition) -> Result<Arc<SerializerDefinition>, RegistryError> {
    let definition = Arc::new(definition);
    self.register_shared(definition.clone())?;
    Ok(definition)
  }

  pub fn register_shared(&self, definition: Arc<SerializerDefinition>) -> Result<(), RegistryError> {
    tracing::debug!(
      "Registering serializer definition: type_tag = {}, type_key = {}",
      definition.type_tag(),
      definition.type_key()
    );
    match self.definitions.entry(definition.type_key().to_string()) {
      Entry::Occupied(_) => {
        tracing::warn!("serializer definition rejected: type_tag = {}", definition.type_tag());
        Err(RegistryError::DuplicateDefinition(definition.type_tag().to_string()))
      }
      Entry::Vacant(entry) => {
        entry.insert(definition);
        Ok(())
      }
    }
  }

  pub fn find(&self, type_tag: &str) -> Option<Arc<SerializerDefinition>> {
    let found = self
      .definitions
      .get(&inflection::type_key(type_tag))
      .map(|entry| entry.value().clone());
    tracing::debug!("find: type_tag = {}, found = {}", type_tag, found.is_some());
    found
  }

  pub fn contains(&self, type_tag: &str) -> bool {
    self.definitions.contains_key(&inflection::type_key(type_tag))
  }

  pub fn len(&self) -> usize {
    self.definitions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.definitions.is_empty()
  }
}

static_assertions::assert_impl_all!(SerializerRegistry: Send, Sync);
