use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{AccessorError, SerializeError};
use crate::resource::Resource;
use crate::scope::ScopeHandle;

/// Computed attribute supplied by a definition instead of a resource read.
#[derive(Clone)]
pub struct AttributeMethod(
  Arc<dyn Fn(&dyn Resource, &ScopeHandle) -> Result<Value, AccessorError> + Send + Sync + 'static>,
);

impl AttributeMethod {
  pub fn new(f: impl Fn(&dyn Resource, &ScopeHandle) -> Result<Value, AccessorError> + Send + Sync + 'static) -> Self {
    AttributeMethod(Arc::new(f))
  }

  pub fn run(&self, resource: &dyn Resource, scope: &ScopeHandle) -> Result<Value, AccessorError> {
    (self.0)(resource, scope)
  }
}

impl Debug for AttributeMethod {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "AttributeMethod")
  }
}

impl PartialEq for AttributeMethod {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

/// Receives the declared-only mapping and returns the mapping to emit.
///
/// The base is handed over by value; whatever the override returns replaces it entirely.
#[derive(Clone)]
pub struct AttributeOverride(
  Arc<
    dyn Fn(Map<String, Value>, &dyn Resource, &ScopeHandle) -> Result<Map<String, Value>, AccessorError>
      + Send
      + Sync
      + 'static,
  >,
);

impl AttributeOverride {
  pub fn new(
    f: impl Fn(Map<String, Value>, &dyn Resource, &ScopeHandle) -> Result<Map<String, Value>, AccessorError>
      + Send
      + Sync
      + 'static,
  ) -> Self {
    AttributeOverride(Arc::new(f))
  }

  pub fn run(
    &self,
    base: Map<String, Value>,
    resource: &dyn Resource,
    scope: &ScopeHandle,
  ) -> Result<Map<String, Value>, AccessorError> {
    (self.0)(base, resource, scope)
  }
}

impl Debug for AttributeOverride {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "AttributeOverride")
  }
}

impl PartialEq for AttributeOverride {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

/// Declared attribute names in declaration order, with optional computed readers.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
  names: Vec<String>,
  methods: HashMap<String, AttributeMethod>,
}

impl AttributeSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Re-declaring a name keeps its first position.
  pub fn declare(&mut self, name: &str) {
    if !self.names.iter().any(|declared| declared == name) {
      self.names.push(name.to_string());
    }
  }

  pub fn declare_with(&mut self, name: &str, method: AttributeMethod) {
    self.declare(name);
    self.methods.insert(name.to_string(), method);
  }

  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn contains(&self, name: &str) -> bool {
    self.names.iter().any(|declared| declared == name)
  }

  fn read(&self, name: &str, resource: &dyn Resource, scope: &ScopeHandle) -> Result<Value, SerializeError> {
    if let Some(method) = self.methods.get(name) {
      return Ok(method.run(resource, scope)?);
    }
    resource
      .read_attribute(name)?
      .ok_or_else(|| SerializeError::missing_attribute(resource.type_tag(), name))
  }
}

/// Reads every declared attribute in order, then applies `override_fn` if present.
pub fn resolve_attributes(
  resource: &dyn Resource,
  scope: &ScopeHandle,
  attributes: &AttributeSet,
  override_fn: Option<&AttributeOverride>,
) -> Result<Map<String, Value>, SerializeError> {
  let mut base = Map::with_capacity(attributes.names.len());
  for name in &attributes.names {
    let value = attributes.read(name, resource, scope)?;
    base.insert(name.clone(), value);
  }
  match override_fn {
    Some(override_fn) => Ok(override_fn.run(base, resource, scope)?),
    None => Ok(base),
  }
}
