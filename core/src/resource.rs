use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::association::Cardinality;
use crate::error::SerializeError;


/// Read-only capability set the engine needs from a domain object.
///
/// `#[derive(Resource)]` implements it from typed struct fields, [`DynamicResource`] from a
/// named-field map.
pub trait Resource: Send + Sync {
  /// Type name used for serializer lookup and root naming, e.g. `Post`.
  fn type_tag(&self) -> &str;

  /// Reads a named property, `Ok(None)` when the resource has no such property.
  fn read_attribute(&self, name: &str) -> Result<Option<Value>, SerializeError>;

  /// Reads a named association, `None` when the resource has no such association.
  fn association(&self, _name: &str) -> Option<AssociationValue> {
    None
  }

  /// Raw default mapping used when no serializer definition applies.
  fn as_json(&self) -> Result<Value, SerializeError>;

  fn identifier(&self) -> Result<Option<Value>, SerializeError> {
    self.read_attribute("id")
  }

  fn as_any(&self) -> &(dyn Any + Send + Sync);
}

impl<'a> dyn Resource + 'a {
  pub fn downcast_ref<T: Resource + 'static>(&self) -> Option<&T> {
    self.as_any().downcast_ref::<T>()
  }
}

impl<'a> Debug for dyn Resource + 'a {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "Resource({})", self.type_tag())
  }
}

pub type ResourceHandle = Arc<dyn Resource>;

pub fn resource_handle<T: Resource + Clone + 'static>(resource: &T) -> ResourceHandle {
  Arc::new(resource.clone())
}

/// Value produced by an association accessor.
#[derive(Clone)]
pub enum AssociationValue {
  One(Option<ResourceHandle>),
  Many(Vec<ResourceHandle>),
}

impl AssociationValue {
  pub fn one(resource: impl Resource + 'static) -> Self {
    AssociationValue::One(Some(Arc::new(resource)))
  }

  pub fn none() -> Self {
    AssociationValue::One(None)
  }

  pub fn many<I, R>(resources: I) -> Self
  where
    I: IntoIterator<Item = R>,
    R: Resource + 'static, {
    AssociationValue::Many(
      resources
        .into_iter()
        .map(|resource| Arc::new(resource) as ResourceHandle)
        .collect(),
    )
  }

  pub fn from_handles(handles: Vec<ResourceHandle>) -> Self {
    AssociationValue::Many(handles)
  }

  pub fn cardinality(&self) -> Cardinality {
    match self {
      AssociationValue::One(_) => Cardinality::One,
      AssociationValue::Many(_) => Cardinality::Many,
    }
  }

  pub fn members(&self) -> Vec<ResourceHandle> {
    match self {
      AssociationValue::One(member) => member.iter().cloned().collect(),
      AssociationValue::Many(members) => members.clone(),
    }
  }

  pub fn len(&self) -> usize {
    match self {
      AssociationValue::One(member) => usize::from(member.is_some()),
      AssociationValue::Many(members) => members.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Debug for AssociationValue {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      AssociationValue::One(member) => f
        .debug_tuple("One")
        .field(&member.as_ref().map(|resource| resource.type_tag()))
        .finish(),
      AssociationValue::Many(members) => f
        .debug_tuple("Many")
        .field(&members.iter().map(|resource| resource.type_tag()).collect::<Vec<_>>())
        .finish(),
    }
  }
}

/// Resource backed by a named-field map rather than typed fields.
#[derive(Debug, Clone, Default)]
pub struct DynamicResource {
  type_tag: String,
  attributes: Map<String, Value>,
  associations: HashMap<String, AssociationValue>,
}

impl DynamicResource {
  pub fn new(type_tag: &str) -> Self {
    Self {
      type_tag: type_tag.to_string(),
      ..Default::default()
    }
  }

  pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
    self.attributes.insert(name.to_string(), value.into());
    self
  }

  /// Merges every entry of a JSON object; other values are ignored.
  pub fn with_attributes(mut self, attributes: Value) -> Self {
    if let Value::Object(map) = attributes {
      self.attributes.extend(map);
    }
    self
  }

  pub fn with_association(mut self, name: &str, value: AssociationValue) -> Self {
    self.associations.insert(name.to_string(), value);
    self
  }

  pub fn with_has_one(self, name: &str, resource: Option<ResourceHandle>) -> Self {
    self.with_association(name, AssociationValue::One(resource))
  }

  pub fn with_has_many(self, name: &str, resources: Vec<ResourceHandle>) -> Self {
    self.with_association(name, AssociationValue::Many(resources))
  }

  pub fn attributes(&self) -> &Map<String, Value> {
    &self.attributes
  }
}

impl Resource for DynamicResource {
  fn type_tag(&self) -> &str {
    &self.type_tag
  }

  fn read_attribute(&self, name: &str) -> Result<Option<Value>, SerializeError> {
    Ok(self.attributes.get(name).cloned())
  }

  fn association(&self, name: &str) -> Option<AssociationValue> {
    self.associations.get(name).cloned()
  }

  fn as_json(&self) -> Result<Value, SerializeError> {
    Ok(Value::Object(self.attributes.clone()))
  }

  fn as_any(&self) -> &(dyn Any + Send + Sync) {
    self
  }
}

static_assertions::assert_impl_all!(DynamicResource: Send, Sync);
static_assertions::assert_impl_all!(AssociationValue: Send, Sync);
