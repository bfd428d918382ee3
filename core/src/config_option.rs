use std::sync::Arc;

use serde_json::Value;

use crate::collection::CollectionOverride;
use crate::config::{AssembleConfig, RootKey};
use crate::definition::SerializerDefinition;
use crate::scope::ScopeOverride;
use crate::shape::Shape;

#[derive(Debug, Clone)]
pub enum AssembleOption {
  SetRootKey(RootKey),
  SetShape(Shape),
  SetScopeOverride(ScopeOverride),
  SetDefinition(Arc<SerializerDefinition>),
  SetMeta(Value),
  SetMetaKey(String),
  SetCollectionOverride(CollectionOverride),
}

impl AssembleOption {
  pub fn apply(&self, config: &mut AssembleConfig) {
    match self {
      AssembleOption::SetRootKey(root_key) => {
        config.set_root_key(root_key.clone());
      }
      AssembleOption::SetShape(shape) => {
        config.set_shape(*shape);
      }
      AssembleOption::SetScopeOverride(scope_override) => {
        config.set_scope_override(scope_override.clone());
      }
      AssembleOption::SetDefinition(definition) => {
        config.set_definition(definition.clone());
      }
      AssembleOption::SetMeta(meta) => {
        config.set_meta(meta.clone());
      }
      AssembleOption::SetMetaKey(meta_key) => {
        config.set_meta_key(meta_key.clone());
      }
      AssembleOption::SetCollectionOverride(collection_override) => {
        config.set_collection_override(collection_override.clone());
      }
    }
  }

  pub fn with_root_key(root_key: &str) -> AssembleOption {
    AssembleOption::SetRootKey(RootKey::Named(root_key.to_string()))
  }

  pub fn without_root() -> AssembleOption {
    AssembleOption::SetRootKey(RootKey::Disabled)
  }

  pub fn with_shape(shape: Shape) -> AssembleOption {
    AssembleOption::SetShape(shape)
  }

  pub fn with_scope_override(scope_override: ScopeOverride) -> AssembleOption {
    AssembleOption::SetScopeOverride(scope_override)
  }

  pub fn with_definition(definition: Arc<SerializerDefinition>) -> AssembleOption {
    AssembleOption::SetDefinition(definition)
  }

  pub fn with_meta(meta: Value) -> AssembleOption {
    AssembleOption::SetMeta(meta)
  }

  pub fn with_meta_key(meta_key: &str) -> AssembleOption {
    AssembleOption::SetMetaKey(meta_key.to_string())
  }

  pub fn with_collection_override(collection_override: CollectionOverride) -> AssembleOption {
    AssembleOption::SetCollectionOverride(collection_override)
  }
}
