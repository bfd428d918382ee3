use serde_json::{Map, Value};

use crate::collection::CollectionSerializer;
use crate::config::{AssembleConfig, RootKey};
use crate::error::SerializeError;
use crate::inflection;
use crate::instance::{render, ResolutionContext};
use crate::lookup::{DefinitionChain, ResolvedSerializer};
use crate::registry::SerializerRegistry;
use crate::resource::{Resource, ResourceHandle};
use crate::scope::{ScopeHandle, ScopeProvider};
use crate::shape::Shape;

#[cfg(test)]
mod tests;

/// What a top-level call renders: one resource or an ordered collection.
#[derive(Debug, Clone)]
pub enum Subject {
  One(ResourceHandle),
  Many(Vec<ResourceHandle>),
}

impl Subject {
  pub fn one(resource: impl Resource + 'static) -> Self {
    Subject::One(std::sync::Arc::new(resource))
  }

  pub fn many<I, R>(resources: I) -> Self
  where
    I: IntoIterator<Item = R>,
    R: Resource + 'static, {
    Subject::Many(
      resources
        .into_iter()
        .map(|resource| std::sync::Arc::new(resource) as ResourceHandle)
        .collect(),
    )
  }

  fn resources(&self) -> &[ResourceHandle] {
    match self {
      Subject::One(resource) => std::slice::from_ref(resource),
      Subject::Many(resources) => resources,
    }
  }
}

impl From<ResourceHandle> for Subject {
  fn from(resource: ResourceHandle) -> Self {
    Subject::One(resource)
  }
}

impl From<Vec<ResourceHandle>> for Subject {
  fn from(resources: Vec<ResourceHandle>) -> Self {
    Subject::Many(resources)
  }
}

struct Primary {
  root_key: Option<String>,
  value: Value,
  overridden: bool,
}

/// Top-level entry point: renders a subject and shapes the final document.
///
/// Every call builds its own resolution state, so one assembler can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
  registry: SerializerRegistry,
}

impl DocumentAssembler {
  pub fn new(registry: SerializerRegistry) -> Self {
    Self { registry }
  }

  /// Assembler over [`SerializerRegistry::global`].
  pub fn global() -> Self {
    Self::new(SerializerRegistry::global().clone())
  }

  pub fn registry(&self) -> &SerializerRegistry {
    &self.registry
  }

  pub fn assemble(
    &self,
    subject: impl Into<Subject>,
    scope: &ScopeHandle,
    config: &AssembleConfig,
  ) -> Result<Value, SerializeError> {
    let subject = subject.into();
    let shape = config.get_shape();
    if shape == Shape::SideLoaded && *config.get_root_key() == RootKey::Disabled {
      return Err(SerializeError::InvalidConfig(
        "side-loaded documents need a root key".to_string(),
      ));
    }
    tracing::debug!(
      "assemble: shape = {}, resources = {}",
      shape,
      subject.resources().len()
    );

    let mut context = ResolutionContext::new(&self.registry, shape);
    if shape == Shape::SideLoaded {
      for resource in subject.resources() {
        context.reserve_primary(resource.as_ref())?;
      }
    }
    let primary = match &subject {
      Subject::One(resource) => self.assemble_one(resource, scope, config, &mut context)?,
      Subject::Many(resources) => self.assemble_many(resources, scope, config, &mut context)?,
    };
    let sideloads = context.into_sideloads();

    let mut document = match config.get_root_key() {
      RootKey::Disabled => return Ok(primary.value),
      RootKey::Named(root_key) => wrap(root_key.clone(), primary.value),
      // A collection override shapes the whole body.
      RootKey::Inferred if primary.overridden => match primary.value {
        Value::Object(body) => body,
        value if sideloads.is_empty() => return Ok(value),
        _ => {
          return Err(SerializeError::InvalidConfig(
            "side-loaded collections need an object document".to_string(),
          ))
        }
      },
      RootKey::Inferred => match (primary.root_key, primary.value) {
        (Some(root_key), value) => wrap(root_key, value),
        (None, Value::Object(grouped)) => grouped,
        (None, _) => return Err(SerializeError::UnresolvableRoot),
      },
    };

    for (collection_key, loaded) in sideloads.into_map() {
      match (document.get_mut(&collection_key), loaded) {
        (None, loaded) => {
          document.insert(collection_key, loaded);
        }
        (Some(Value::Array(existing)), Value::Array(loaded)) => existing.extend(loaded),
        (Some(_), _) => {
          return Err(SerializeError::InvalidConfig(format!(
            "side-loaded collection `{}` collides with the document root",
            collection_key
          )))
        }
      }
    }

    if let Some(meta) = config.get_meta() {
      document.insert(config.get_meta_key().to_string(), meta.clone());
    }
    Ok(Value::Object(document))
  }

  /// Obtains the scope from `provider` once, then assembles.
  pub fn assemble_for_request<R, P>(
    &self,
    request: &R,
    provider: &P,
    subject: impl Into<Subject>,
    config: &AssembleConfig,
  ) -> Result<Value, SerializeError>
  where
    R: ?Sized,
    P: ScopeProvider<R> + ?Sized, {
    let scope = provider.provide_scope(request);
    self.assemble(subject, &scope, config)
  }

  fn assemble_one(
    &self,
    resource: &ResourceHandle,
    scope: &ScopeHandle,
    config: &AssembleConfig,
    context: &mut ResolutionContext<'_>,
  ) -> Result<Primary, SerializeError> {
    let chain = DefinitionChain::new();
    let scope = config.scope_for(resource.as_ref(), scope);
    let resolved = match config.get_definition() {
      Some(definition) => ResolvedSerializer::Definition(definition.clone()),
      None => context.lookup().resolve_type(resource.type_tag(), &chain),
    };
    let value = render(resource.as_ref(), &resolved, &scope, &chain, context)?;
    Ok(Primary {
      root_key: Some(inflection::type_key(resource.type_tag())),
      value,
      overridden: false,
    })
  }

  fn assemble_many(
    &self,
    resources: &[ResourceHandle],
    scope: &ScopeHandle,
    config: &AssembleConfig,
    context: &mut ResolutionContext<'_>,
  ) -> Result<Primary, SerializeError> {
    let mut collection = CollectionSerializer::new(resources);
    if let Some(definition) = config.get_definition() {
      collection = collection.with_definition(definition.clone());
    }
    if let Some(scope_override) = config.get_scope_override() {
      collection = collection.with_scope_override(scope_override);
    }
    if let Some(collection_override) = config.get_collection_override() {
      collection = collection.with_override(collection_override);
    }
    let value = collection.serialize(scope, context)?;
    Ok(Primary {
      root_key: collection.root_key(),
      value,
      overridden: config.get_collection_override().is_some(),
    })
  }
}

fn wrap(root_key: String, value: Value) -> Map<String, Value> {
  let mut document = Map::new();
  document.insert(root_key, value);
  document
}

static_assertions::assert_impl_all!(DocumentAssembler: Send, Sync);
