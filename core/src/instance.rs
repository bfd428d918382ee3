use std::sync::Arc;

use serde_json::Value;

use crate::association::AssociationSpec;
use crate::definition::SerializerDefinition;
use crate::error::SerializeError;
use crate::inflection;
use crate::lookup::{DefinitionChain, ResolvedSerializer, SerializerLookup};
use crate::registry::SerializerRegistry;
use crate::resource::{AssociationValue, Resource, ResourceHandle};
use crate::scope::ScopeHandle;
use crate::shape::Shape;
use crate::sideload::SideloadCollector;

#[cfg(test)]
mod tests;

/// Deepest chain of enclosing definitions a resolution pass renders below.
pub const MAX_NESTING_DEPTH: usize = 32;

/// State of one top-level resolution pass.
#[derive(Debug)]
pub struct ResolutionContext<'a> {
  lookup: SerializerLookup<'a>,
  shape: Shape,
  sideloads: SideloadCollector,
}

impl<'a> ResolutionContext<'a> {
  pub fn new(registry: &'a SerializerRegistry, shape: Shape) -> Self {
    Self {
      lookup: SerializerLookup::new(registry),
      shape,
      sideloads: SideloadCollector::new(),
    }
  }

  pub fn shape(&self) -> Shape {
    self.shape
  }

  pub fn lookup(&self) -> &SerializerLookup<'a> {
    &self.lookup
  }

  pub fn sideloads(&self) -> &SideloadCollector {
    &self.sideloads
  }

  pub fn into_sideloads(self) -> SideloadCollector {
    self.sideloads
  }

  /// Marks a top-level resource as already rendered so side-loading only references it.
  pub fn reserve_primary(&mut self, resource: &dyn Resource) -> Result<(), SerializeError> {
    if let Some(identifier) = resource.identifier()? {
      self
        .sideloads
        .reserve(&inflection::collection_key(resource.type_tag()), &identifier);
    }
    Ok(())
  }
}

/// A resource bound to a definition and the scope its subtree sees.
#[derive(Debug)]
pub struct SerializerInstance<'a> {
  definition: Arc<SerializerDefinition>,
  resource: &'a dyn Resource,
  scope: ScopeHandle,
}

impl<'a> SerializerInstance<'a> {
  /// Binds `resource`; the definition's scope derivation is applied here.
  pub fn new(definition: Arc<SerializerDefinition>, resource: &'a dyn Resource, scope: &ScopeHandle) -> Self {
    let scope = definition.derive_scope(resource, scope);
    Self {
      definition,
      resource,
      scope,
    }
  }

  pub fn definition(&self) -> &Arc<SerializerDefinition> {
    &self.definition
  }

  pub fn scope(&self) -> &ScopeHandle {
    &self.scope
  }

  /// Renders the resource; `chain` holds the definitions enclosing this one.
  pub fn serialize(&self, chain: &DefinitionChain, context: &mut ResolutionContext<'_>) -> Result<Value, SerializeError> {
    if chain.depth() >= MAX_NESTING_DEPTH {
      tracing::warn!(
        "serialize: nesting limit reached, definition = {}, depth = {}",
        self.definition.type_tag(),
        chain.depth()
      );
      return Err(SerializeError::NestingTooDeep {
        type_tag: self.definition.type_tag().to_string(),
        limit: MAX_NESTING_DEPTH,
      });
    }
    let mut output = self.definition.resolve_attributes(self.resource, &self.scope)?;
    let chain = chain.extended(self.definition.clone());
    for association in self.definition.associations() {
      if !association.is_included(self.resource, &self.scope) {
        tracing::debug!(
          "serialize: association skipped, definition = {}, association = {}",
          self.definition.type_tag(),
          association.name()
        );
        continue;
      }
      let value = association.fetch(self.resource, &self.scope)?;
      let members = self.resolve_members(association, &value, &chain, context.lookup())?;
      match context.shape() {
        Shape::Embedded => {
          let embedded = self.embed(&value, &members, &chain, context)?;
          output.insert(association.output_key().to_string(), embedded);
        }
        Shape::Referenced => {
          output.insert(association.referenced_key(), reference(&value, &members)?);
        }
        Shape::SideLoaded => {
          for (member, resolved) in &members {
            self.sideload(member, resolved, &chain, context)?;
          }
          output.insert(association.referenced_key(), reference(&value, &members)?);
        }
      }
    }
    Ok(Value::Object(output))
  }

  fn resolve_members(
    &self,
    association: &AssociationSpec,
    value: &AssociationValue,
    chain: &DefinitionChain,
    lookup: &SerializerLookup<'_>,
  ) -> Result<Vec<(ResourceHandle, ResolvedSerializer)>, SerializeError> {
    let members = value.members();
    if members.is_empty() {
      if let AssociationValue::Many(_) = value {
        lookup.resolve(association, None, chain)?;
      }
      return Ok(Vec::new());
    }
    members
      .into_iter()
      .map(|member| {
        let resolved = lookup.resolve(association, Some(member.as_ref()), chain)?;
        Ok::<_, SerializeError>((member, resolved))
      })
      .collect()
  }

  fn embed(
    &self,
    value: &AssociationValue,
    members: &[(ResourceHandle, ResolvedSerializer)],
    chain: &DefinitionChain,
    context: &mut ResolutionContext<'_>,
  ) -> Result<Value, SerializeError> {
    let mut rendered = Vec::with_capacity(members.len());
    for (member, resolved) in members {
      rendered.push(render(member.as_ref(), resolved, &self.scope, chain, context)?);
    }
    Ok(match value {
      AssociationValue::One(_) => rendered.pop().unwrap_or(Value::Null),
      AssociationValue::Many(_) => Value::Array(rendered),
    })
  }

  fn sideload(
    &self,
    member: &ResourceHandle,
    resolved: &ResolvedSerializer,
    chain: &DefinitionChain,
    context: &mut ResolutionContext<'_>,
  ) -> Result<(), SerializeError> {
    let identifier = identifier_of(member.as_ref())?;
    let collection_key = inflection::collection_key(member.type_tag());
    if !context.sideloads.reserve(&collection_key, &identifier) {
      tracing::debug!(
        "sideload: already collected, collection = {}, id = {}",
        collection_key,
        identifier
      );
      return Ok(());
    }
    let rendered = render(member.as_ref(), resolved, &self.scope, chain, context)?;
    context.sideloads.push(&collection_key, rendered);
    Ok(())
  }
}

/// Renders one member with its resolved serializer.
pub(crate) fn render(
  resource: &dyn Resource,
  resolved: &ResolvedSerializer,
  scope: &ScopeHandle,
  chain: &DefinitionChain,
  context: &mut ResolutionContext<'_>,
) -> Result<Value, SerializeError> {
  match resolved {
    ResolvedSerializer::Definition(definition) => {
      SerializerInstance::new(definition.clone(), resource, scope).serialize(chain, context)
    }
    ResolvedSerializer::RawFallback => resource.as_json(),
  }
}

pub(crate) fn identifier_of(resource: &dyn Resource) -> Result<Value, SerializeError> {
  resource
    .identifier()?
    .ok_or_else(|| SerializeError::missing_attribute(resource.type_tag(), "id"))
}

fn reference(value: &AssociationValue, members: &[(ResourceHandle, ResolvedSerializer)]) -> Result<Value, SerializeError> {
  let mut identifiers = Vec::with_capacity(members.len());
  for (member, _) in members {
    identifiers.push(identifier_of(member.as_ref())?);
  }
  Ok(match value {
    AssociationValue::One(_) => identifiers.pop().unwrap_or(Value::Null),
    AssociationValue::Many(_) => Value::Array(identifiers),
  })
}
