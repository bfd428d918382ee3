use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::definition::SerializerDefinition;
use crate::error::{AccessorError, SerializeError};
use crate::inflection;
use crate::instance::{render, ResolutionContext};
use crate::lookup::{DefinitionChain, ResolvedSerializer};
use crate::resource::ResourceHandle;
use crate::scope::{ScopeHandle, ScopeOverride};


/// One rendered collection element with the key it groups under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerializedElement {
  type_tag: String,
  collection_key: String,
  value: Value,
}

impl SerializedElement {
  pub fn new(type_tag: &str, collection_key: &str, value: Value) -> Self {
    Self {
      type_tag: type_tag.to_string(),
      collection_key: collection_key.to_string(),
      value,
    }
  }

  pub fn type_tag(&self) -> &str {
    &self.type_tag
  }

  pub fn collection_key(&self) -> &str {
    &self.collection_key
  }

  pub fn value(&self) -> &Value {
    &self.value
  }

  pub fn into_value(self) -> Value {
    self.value
  }
}

/// Replaces the default collection output, given the rendered elements in order.
#[derive(Clone)]
pub struct CollectionOverride(
  Arc<dyn Fn(Vec<SerializedElement>) -> Result<Value, AccessorError> + Send + Sync + 'static>,
);

impl CollectionOverride {
  pub fn new(f: impl Fn(Vec<SerializedElement>) -> Result<Value, AccessorError> + Send + Sync + 'static) -> Self {
    CollectionOverride(Arc::new(f))
  }

  pub fn run(&self, elements: Vec<SerializedElement>) -> Result<Value, AccessorError> {
    (self.0)(elements)
  }
}

impl Debug for CollectionOverride {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "CollectionOverride")
  }
}

impl PartialEq for CollectionOverride {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

#[derive(Debug, Clone)]
pub struct CollectionSerializer<'a> {
  resources: &'a [ResourceHandle],
  definition: Option<Arc<SerializerDefinition>>,
  scope_override: Option<&'a ScopeOverride>,
  collection_override: Option<&'a CollectionOverride>,
}

impl<'a> CollectionSerializer<'a> {
  pub fn new(resources: &'a [ResourceHandle]) -> Self {
    Self {
      resources,
      definition: None,
      scope_override: None,
      collection_override: None,
    }
  }

  /// Renders every element with `definition` instead of looking one up per type.
  pub fn with_definition(mut self, definition: Arc<SerializerDefinition>) -> Self {
    self.definition = Some(definition);
    self
  }

  pub fn with_scope_override(mut self, scope_override: &'a ScopeOverride) -> Self {
    self.scope_override = Some(scope_override);
    self
  }

  pub fn with_override(mut self, collection_override: &'a CollectionOverride) -> Self {
    self.collection_override = Some(collection_override);
    self
  }

  pub fn len(&self) -> usize {
    self.resources.len()
  }

  pub fn is_empty(&self) -> bool {
    self.resources.is_empty()
  }

  pub fn is_heterogeneous(&self) -> bool {
    if self.definition.is_some() {
      return false;
    }
    let mut keys = self.resources.iter().map(|resource| inflection::type_key(resource.type_tag()));
    match keys.next() {
      Some(first) => keys.any(|key| key != first),
      None => false,
    }
  }

  /// Pluralized root for a homogeneous collection; `None` when empty or heterogeneous.
  ///
  /// With an explicit definition an empty collection is named after the definition.
  pub fn root_key(&self) -> Option<String> {
    if self.is_heterogeneous() {
      return None;
    }
    match self.resources.first() {
      Some(resource) => Some(inflection::collection_key(resource.type_tag())),
      None => self.definition.as_ref().map(|definition| definition.collection_key()),
    }
  }

  pub fn serialize_elements(
    &self,
    scope: &ScopeHandle,
    context: &mut ResolutionContext<'_>,
  ) -> Result<Vec<SerializedElement>, SerializeError> {
    let chain = DefinitionChain::new();
    let mut elements = Vec::with_capacity(self.resources.len());
    for resource in self.resources {
      let scope = match self.scope_override {
        Some(scope_override) => scope_override.run(resource.as_ref()),
        None => scope.clone(),
      };
      let resolved = match &self.definition {
        Some(definition) => ResolvedSerializer::Definition(definition.clone()),
        None => context.lookup().resolve_type(resource.type_tag(), &chain),
      };
      let collection_key = inflection::collection_key(resource.type_tag());
      let value = render(resource.as_ref(), &resolved, &scope, &chain, context)?;
      elements.push(SerializedElement::new(resource.type_tag(), &collection_key, value));
    }
    Ok(elements)
  }

  /// Flat array when homogeneous, `collection_key -> array` map when heterogeneous.
  pub fn serialize(&self, scope: &ScopeHandle, context: &mut ResolutionContext<'_>) -> Result<Value, SerializeError> {
    let elements = self.serialize_elements(scope, context)?;
    if let Some(collection_override) = self.collection_override {
      return Ok(collection_override.run(elements)?);
    }
    if self.is_heterogeneous() {
      return Ok(Value::Object(group_by_collection_key(elements)));
    }
    Ok(Value::Array(elements.into_iter().map(SerializedElement::into_value).collect()))
  }
}

/// Groups elements in first-appearance order of their collection key.
pub fn group_by_collection_key(elements: Vec<SerializedElement>) -> Map<String, Value> {
  let mut groups: Vec<(String, Vec<Value>)> = Vec::new();
  for element in elements {
    match groups.iter_mut().find(|(key, _)| *key == element.collection_key) {
      Some((_, values)) => values.push(element.value),
      None => groups.push((element.collection_key, vec![element.value])),
    }
  }
  groups
    .into_iter()
    .map(|(key, values)| (key, Value::Array(values)))
    .collect()
}
