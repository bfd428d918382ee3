use std::sync::Arc;

use serde_json::Value;

use crate::collection::CollectionOverride;
use crate::config_option::AssembleOption;
use crate::definition::SerializerDefinition;
use crate::resource::Resource;
use crate::scope::{ScopeHandle, ScopeOverride};
use crate::shape::Shape;

pub const DEFAULT_META_KEY: &str = "meta";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RootKey {
  /// Singular type key for one resource, pluralized for a homogeneous collection.
  #[default]
  Inferred,
  Named(String),
  Disabled,
}

/// Per-call options of [`crate::DocumentAssembler::assemble`].
#[derive(Debug, Clone)]
pub struct AssembleConfig {
  root_key: RootKey,
  shape: Shape,
  scope_override: Option<ScopeOverride>,
  definition: Option<Arc<SerializerDefinition>>,
  meta: Option<Value>,
  meta_key: String,
  collection_override: Option<CollectionOverride>,
}

impl Default for AssembleConfig {
  fn default() -> Self {
    Self {
      root_key: RootKey::Inferred,
      shape: Shape::Embedded,
      scope_override: None,
      definition: None,
      meta: None,
      meta_key: DEFAULT_META_KEY.to_string(),
      collection_override: None,
    }
  }
}

impl AssembleConfig {
  pub fn from(options: impl IntoIterator<Item = AssembleOption>) -> AssembleConfig {
    let mut config = AssembleConfig::default();
    for option in options {
      option.apply(&mut config);
    }
    config
  }

  pub fn get_root_key(&self) -> &RootKey {
    &self.root_key
  }

  pub fn set_root_key(&mut self, root_key: RootKey) {
    self.root_key = root_key;
  }

  pub fn get_shape(&self) -> Shape {
    self.shape
  }

  pub fn set_shape(&mut self, shape: Shape) {
    self.shape = shape;
  }

  pub fn get_scope_override(&self) -> Option<&ScopeOverride> {
    self.scope_override.as_ref()
  }

  pub fn set_scope_override(&mut self, scope_override: ScopeOverride) {
    self.scope_override = Some(scope_override);
  }

  /// Scope for one top-level resource: the override when configured, else `scope`.
  pub fn scope_for(&self, resource: &dyn Resource, scope: &ScopeHandle) -> ScopeHandle {
    match &self.scope_override {
      Some(scope_override) => scope_override.run(resource),
      None => scope.clone(),
    }
  }

  pub fn get_definition(&self) -> Option<&Arc<SerializerDefinition>> {
    self.definition.as_ref()
  }

  pub fn set_definition(&mut self, definition: Arc<SerializerDefinition>) {
    self.definition = Some(definition);
  }

  pub fn get_meta(&self) -> Option<&Value> {
    self.meta.as_ref()
  }

  pub fn set_meta(&mut self, meta: Value) {
    self.meta = Some(meta);
  }

  pub fn get_meta_key(&self) -> &str {
    &self.meta_key
  }

  pub fn set_meta_key(&mut self, meta_key: String) {
    self.meta_key = meta_key;
  }

  pub fn get_collection_override(&self) -> Option<&CollectionOverride> {
    self.collection_override.as_ref()
  }

  pub fn set_collection_override(&mut self, collection_override: CollectionOverride) {
    self.collection_override = Some(collection_override);
  }
}
