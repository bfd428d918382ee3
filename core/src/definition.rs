use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::association::{AssociationAccessor, AssociationOptions, AssociationRegistry, AssociationSpec, Cardinality};
use crate::attribute::{resolve_attributes, AttributeMethod, AttributeOverride, AttributeSet};
use crate::error::{AccessorError, RegistryError, SerializeError};
use crate::inflection;
use crate::resource::{AssociationValue, Resource};
use crate::scope::{ScopeDerivation, ScopeHandle};


/// Immutable rendering rules for one resource type.
///
/// Built once at setup through [`SerializerDefinition::builder`] and shared behind `Arc`.
#[derive(Debug)]
pub struct SerializerDefinition {
  type_tag: String,
  type_key: String,
  attributes: AttributeSet,
  attribute_override: Option<AttributeOverride>,
  associations: AssociationRegistry,
  nested: HashMap<String, Arc<SerializerDefinition>>,
  scope_derivation: Option<ScopeDerivation>,
}

impl SerializerDefinition {
  pub fn builder(type_tag: &str) -> SerializerDefinitionBuilder {
    SerializerDefinitionBuilder::new(type_tag)
  }

  pub fn type_tag(&self) -> &str {
    &self.type_tag
  }

  /// Normalized lookup key, `BlogPost` -> `blog_post`.
  pub fn type_key(&self) -> &str {
    &self.type_key
  }

  pub fn collection_key(&self) -> String {
    inflection::pluralize(&self.type_key)
  }

  pub fn attribute_names(&self) -> &[String] {
    self.attributes.names()
  }

  pub fn associations(&self) -> &[AssociationSpec] {
    self.associations.list()
  }

  pub fn association(&self, name: &str) -> Option<&AssociationSpec> {
    self.associations.get(name)
  }

  /// Nested definition scoped to this one, matched by normalized type key.
  pub fn nested_definition(&self, type_tag: &str) -> Option<&Arc<SerializerDefinition>> {
    self.nested.get(&inflection::type_key(type_tag))
  }

  pub fn resolve_attributes(
    &self,
    resource: &dyn Resource,
    scope: &ScopeHandle,
  ) -> Result<Map<String, Value>, SerializeError> {
    resolve_attributes(resource, scope, &self.attributes, self.attribute_override.as_ref())
  }

  /// Scope seen by the subtree this definition renders for `resource`.
  pub fn derive_scope(&self, resource: &dyn Resource, scope: &ScopeHandle) -> ScopeHandle {
    match &self.scope_derivation {
      Some(derivation) => derivation.run(resource, scope),
      None => scope.clone(),
    }
  }
}

#[derive(Debug)]
pub struct SerializerDefinitionBuilder {
  type_tag: String,
  attributes: AttributeSet,
  attribute_override: Option<AttributeOverride>,
  associations: Vec<(String, Cardinality, AssociationOptions)>,
  accessors: Vec<(String, AssociationAccessor)>,
  nested: Vec<SerializerDefinition>,
  scope_derivation: Option<ScopeDerivation>,
}

impl SerializerDefinitionBuilder {
  pub fn new(type_tag: &str) -> Self {
    Self {
      type_tag: type_tag.to_string(),
      attributes: AttributeSet::new(),
      attribute_override: None,
      associations: Vec::new(),
      accessors: Vec::new(),
      nested: Vec::new(),
      scope_derivation: None,
    }
  }

  pub fn attribute(mut self, name: &str) -> Self {
    self.attributes.declare(name);
    self
  }

  pub fn attributes<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>, {
    for name in names {
      self.attributes.declare(name.as_ref());
    }
    self
  }

  /// Declares `name` with a computed value instead of a resource read.
  pub fn attribute_with(
    mut self,
    name: &str,
    f: impl Fn(&dyn Resource, &ScopeHandle) -> Result<Value, AccessorError> + Send + Sync + 'static,
  ) -> Self {
    self.attributes.declare_with(name, AttributeMethod::new(f));
    self
  }

  pub fn attributes_override(
    mut self,
    f: impl Fn(Map<String, Value>, &dyn Resource, &ScopeHandle) -> Result<Map<String, Value>, AccessorError>
      + Send
      + Sync
      + 'static,
  ) -> Self {
    self.attribute_override = Some(AttributeOverride::new(f));
    self
  }

  pub fn has_one(mut self, name: &str, options: AssociationOptions) -> Self {
    self.associations.push((name.to_string(), Cardinality::One, options));
    self
  }

  pub fn has_many(mut self, name: &str, options: AssociationOptions) -> Self {
    self.associations.push((name.to_string(), Cardinality::Many, options));
    self
  }

  /// Data source for the association called `name`, overriding the resource's own accessor.
  pub fn accessor(
    mut self,
    name: &str,
    f: impl Fn(&dyn Resource, &ScopeHandle) -> Result<AssociationValue, AccessorError> + Send + Sync + 'static,
  ) -> Self {
    self.accessors.push((name.to_string(), AssociationAccessor::new(f)));
    self
  }

  /// Scopes `definition` to this one; it wins over the global registry for this subtree.
  pub fn nested(mut self, definition: SerializerDefinition) -> Self {
    self.nested.push(definition);
    self
  }

  pub fn scope_with(mut self, f: impl Fn(&dyn Resource, &ScopeHandle) -> ScopeHandle + Send + Sync + 'static) -> Self {
    self.scope_derivation = Some(ScopeDerivation::new(f));
    self
  }

  pub fn build(self) -> Result<SerializerDefinition, RegistryError> {
    let mut associations = AssociationRegistry::new();
    for (name, cardinality, options) in self.associations {
      associations.declare(&self.type_tag, &name, cardinality, options)?;
    }
    for (name, accessor) in self.accessors {
      match associations.get_mut(&name) {
        Some(spec) => spec.set_accessor_override(accessor),
        None => tracing::debug!(
          "accessor without association ignored: definition = {}, association = {}",
          self.type_tag,
          name
        ),
      }
    }
    let mut nested = HashMap::with_capacity(self.nested.len());
    for definition in self.nested {
      let key = definition.type_key.clone();
      if nested.contains_key(&key) {
        return Err(RegistryError::DuplicateDefinition(format!(
          "{}::{}",
          self.type_tag, definition.type_tag
        )));
      }
      nested.insert(key, Arc::new(definition));
    }
    Ok(SerializerDefinition {
      type_key: inflection::type_key(&self.type_tag),
      type_tag: self.type_tag,
      attributes: self.attributes,
      attribute_override: self.attribute_override,
      associations,
      nested,
      scope_derivation: self.scope_derivation,
    })
  }
}

static_assertions::assert_impl_all!(SerializerDefinition: Send, Sync);
