use std::sync::Arc;

use crate::association::AssociationSpec;
use crate::definition::SerializerDefinition;
use crate::error::SerializeError;
use crate::registry::SerializerRegistry;
use crate::resource::Resource;


/// Definitions enclosing the current nesting depth, outermost first.
///
/// Rebuilt for every call and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct DefinitionChain {
  definitions: Vec<Arc<SerializerDefinition>>,
}

impl DefinitionChain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn extended(&self, definition: Arc<SerializerDefinition>) -> Self {
    let mut definitions = Vec::with_capacity(self.definitions.len() + 1);
    definitions.extend(self.definitions.iter().cloned());
    definitions.push(definition);
    Self { definitions }
  }

  pub fn depth(&self) -> usize {
    self.definitions.len()
  }

  pub fn innermost(&self) -> Option<&Arc<SerializerDefinition>> {
    self.definitions.last()
  }

  pub fn innermost_first(&self) -> impl Iterator<Item = &Arc<SerializerDefinition>> {
    self.definitions.iter().rev()
  }
}

#[derive(Debug, Clone)]
pub enum ResolvedSerializer {
  Definition(Arc<SerializerDefinition>),
  /// Render with the resource's own `as_json`.
  RawFallback,
}

impl ResolvedSerializer {
  pub fn definition(&self) -> Option<&Arc<SerializerDefinition>> {
    match self {
      ResolvedSerializer::Definition(definition) => Some(definition),
      ResolvedSerializer::RawFallback => None,
    }
  }

  pub fn is_raw_fallback(&self) -> bool {
    matches!(self, ResolvedSerializer::RawFallback)
  }
}

#[derive(Debug, Clone, Copy)]
pub struct SerializerLookup<'a> {
  registry: &'a SerializerRegistry,
}

impl<'a> SerializerLookup<'a> {
  pub fn new(registry: &'a SerializerRegistry) -> Self {
    Self { registry }
  }

  /// Resolves the definition for one association member.
  ///
  /// The member's type tag is the lookup key; without a member the association's declared
  /// element type is used, and without either the association cannot be resolved.
  pub fn resolve(
    &self,
    association: &AssociationSpec,
    target_sample: Option<&dyn Resource>,
    chain: &DefinitionChain,
  ) -> Result<ResolvedSerializer, SerializeError> {
    if let Some(definition) = association.explicit_serializer() {
      tracing::debug!(
        "resolve: association = {}, source = explicit, definition = {}",
        association.name(),
        definition.type_tag()
      );
      return Ok(ResolvedSerializer::Definition(definition.clone()));
    }
    let type_tag = match target_sample {
      Some(sample) => sample.type_tag(),
      None => association.element_type().ok_or_else(|| {
        let definition = chain
          .innermost()
          .map(|definition| definition.type_tag().to_string())
          .unwrap_or_default();
        SerializeError::unresolvable_association(&definition, association.name())
      })?,
    };
    Ok(self.resolve_type(type_tag, chain))
  }

  /// Nested definitions innermost-first, then the registry, then the raw fallback.
  pub fn resolve_type(&self, type_tag: &str, chain: &DefinitionChain) -> ResolvedSerializer {
    for enclosing in chain.innermost_first() {
      if let Some(nested) = enclosing.nested_definition(type_tag) {
        tracing::debug!(
          "resolve_type: type_tag = {}, source = nested, enclosing = {}",
          type_tag,
          enclosing.type_tag()
        );
        return ResolvedSerializer::Definition(nested.clone());
      }
    }
    if let Some(definition) = self.registry.find(type_tag) {
      tracing::debug!("resolve_type: type_tag = {}, source = global", type_tag);
      return ResolvedSerializer::Definition(definition);
    }
    tracing::debug!("resolve_type: type_tag = {}, source = raw", type_tag);
    ResolvedSerializer::RawFallback
  }
}
