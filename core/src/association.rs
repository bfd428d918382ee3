use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::definition::SerializerDefinition;
use crate::error::{AccessorError, RegistryError, SerializeError};
use crate::inflection;
use crate::resource::{AssociationValue, Resource};
use crate::scope::ScopeHandle;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Cardinality {
  One,
  Many,
}

/// Replacement data source for an association, e.g. comments filtered by the viewer.
#[derive(Clone)]
pub struct AssociationAccessor(
  Arc<dyn Fn(&dyn Resource, &ScopeHandle) -> Result<AssociationValue, AccessorError> + Send + Sync + 'static>,
);

impl AssociationAccessor {
  pub fn new(
    f: impl Fn(&dyn Resource, &ScopeHandle) -> Result<AssociationValue, AccessorError> + Send + Sync + 'static,
  ) -> Self {
    AssociationAccessor(Arc::new(f))
  }

  pub fn run(&self, resource: &dyn Resource, scope: &ScopeHandle) -> Result<AssociationValue, AccessorError> {
    (self.0)(resource, scope)
  }
}

impl Debug for AssociationAccessor {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "AssociationAccessor")
  }
}

impl PartialEq for AssociationAccessor {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

#[derive(Clone)]
pub struct IncludePredicate(Arc<dyn Fn(&dyn Resource, &ScopeHandle) -> bool + Send + Sync + 'static>);

impl IncludePredicate {
  pub fn new(f: impl Fn(&dyn Resource, &ScopeHandle) -> bool + Send + Sync + 'static) -> Self {
    IncludePredicate(Arc::new(f))
  }

  pub fn run(&self, resource: &dyn Resource, scope: &ScopeHandle) -> bool {
    (self.0)(resource, scope)
  }
}

impl Debug for IncludePredicate {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "IncludePredicate")
  }
}

impl PartialEq for IncludePredicate {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

/// Declaration-time options of `has_one` / `has_many`.
#[derive(Debug, Clone, Default)]
pub struct AssociationOptions {
  key: Option<String>,
  serializer: Option<Arc<SerializerDefinition>>,
  accessor: Option<AssociationAccessor>,
  element_type: Option<String>,
  include_when: Option<IncludePredicate>,
}

impl AssociationOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Renames the output field; the accessor name is unchanged.
  pub fn key(mut self, key: &str) -> Self {
    self.key = Some(key.to_string());
    self
  }

  /// Pins the definition used for every member, bypassing lookup.
  pub fn serializer(mut self, definition: Arc<SerializerDefinition>) -> Self {
    self.serializer = Some(definition);
    self
  }

  pub fn accessor(
    mut self,
    f: impl Fn(&dyn Resource, &ScopeHandle) -> Result<AssociationValue, AccessorError> + Send + Sync + 'static,
  ) -> Self {
    self.accessor = Some(AssociationAccessor::new(f));
    self
  }

  /// Lookup key used when the value yields no member to sample.
  pub fn element_type(mut self, type_tag: &str) -> Self {
    self.element_type = Some(type_tag.to_string());
    self
  }

  pub fn include_when(mut self, f: impl Fn(&dyn Resource, &ScopeHandle) -> bool + Send + Sync + 'static) -> Self {
    self.include_when = Some(IncludePredicate::new(f));
    self
  }
}

#[derive(Debug, Clone)]
pub struct AssociationSpec {
  name: String,
  cardinality: Cardinality,
  output_key: String,
  explicit_serializer: Option<Arc<SerializerDefinition>>,
  accessor_override: Option<AssociationAccessor>,
  element_type: Option<String>,
  include_when: Option<IncludePredicate>,
}

impl AssociationSpec {
  pub fn new(name: &str, cardinality: Cardinality, options: AssociationOptions) -> Self {
    Self {
      name: name.to_string(),
      cardinality,
      output_key: options.key.unwrap_or_else(|| name.to_string()),
      explicit_serializer: options.serializer,
      accessor_override: options.accessor,
      element_type: options.element_type,
      include_when: options.include_when,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn cardinality(&self) -> Cardinality {
    self.cardinality
  }

  pub fn output_key(&self) -> &str {
    &self.output_key
  }

  /// Output key in the referenced and side-loaded shapes: `comment_ids`, `author_id`.
  pub fn referenced_key(&self) -> String {
    match self.cardinality {
      Cardinality::One => format!("{}_id", self.output_key),
      Cardinality::Many => format!("{}_ids", inflection::singularize(&self.output_key)),
    }
  }

  pub fn explicit_serializer(&self) -> Option<&Arc<SerializerDefinition>> {
    self.explicit_serializer.as_ref()
  }

  pub fn accessor_override(&self) -> Option<&AssociationAccessor> {
    self.accessor_override.as_ref()
  }

  pub fn element_type(&self) -> Option<&str> {
    self.element_type.as_deref()
  }

  pub(crate) fn set_accessor_override(&mut self, accessor: AssociationAccessor) {
    self.accessor_override = Some(accessor);
  }

  pub fn is_included(&self, resource: &dyn Resource, scope: &ScopeHandle) -> bool {
    self
      .include_when
      .as_ref()
      .map(|predicate| predicate.run(resource, scope))
      .unwrap_or(true)
  }

  /// Reads the association value, preferring the accessor override, coerced to the declared cardinality.
  pub fn fetch(&self, resource: &dyn Resource, scope: &ScopeHandle) -> Result<AssociationValue, SerializeError> {
    let value = match &self.accessor_override {
      Some(accessor) => accessor.run(resource, scope)?,
      None => resource
        .association(&self.name)
        .ok_or_else(|| SerializeError::missing_attribute(resource.type_tag(), &self.name))?,
    };
    match (self.cardinality, value) {
      (Cardinality::Many, AssociationValue::One(member)) => Ok(AssociationValue::Many(member.into_iter().collect())),
      (Cardinality::One, AssociationValue::Many(_)) => Err(SerializeError::InvalidConfig(format!(
        "association `{}` of `{}` is declared has_one but yielded a collection",
        self.name,
        resource.type_tag()
      ))),
      (_, value) => Ok(value),
    }
  }
}

/// Ordered association declarations of one definition.
#[derive(Debug, Clone, Default)]
pub struct AssociationRegistry {
  specs: Vec<AssociationSpec>,
}

impl AssociationRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn declare(
    &mut self,
    definition: &str,
    name: &str,
    cardinality: Cardinality,
    options: AssociationOptions,
  ) -> Result<(), RegistryError> {
    let spec = AssociationSpec::new(name, cardinality, options);
    if self.specs.iter().any(|declared| declared.output_key == spec.output_key) {
      tracing::warn!(
        "association key rejected: definition = {}, key = {}",
        definition,
        spec.output_key
      );
      return Err(RegistryError::DuplicateAssociationKey {
        definition: definition.to_string(),
        key: spec.output_key,
      });
    }
    self.specs.push(spec);
    Ok(())
  }

  pub fn list(&self) -> &[AssociationSpec] {
    &self.specs
  }

  pub fn get(&self, name: &str) -> Option<&AssociationSpec> {
    self.specs.iter().find(|spec| spec.name == name)
  }

  pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut AssociationSpec> {
    self.specs.iter_mut().find(|spec| spec.name == name)
  }

  pub fn len(&self) -> usize {
    self.specs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.specs.is_empty()
  }
}

/// Ordered associations declared on `definition`.
pub fn list_associations(definition: &SerializerDefinition) -> &[AssociationSpec] {
  definition.associations()
}

static_assertions::assert_impl_all!(AssociationSpec: Send, Sync);
