use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

use thiserror::Error;

/// Failure raised while resolving or assembling a document.
#[derive(Debug, Error)]
pub enum SerializeError {
  #[error("attribute `{attribute}` is not readable on `{type_tag}`")]
  MissingAttribute { type_tag: String, attribute: String },
  #[error("serializer for association `{association}` of `{definition}` cannot be resolved")]
  UnresolvableAssociation { definition: String, association: String },
  #[error("root key cannot be resolved for the collection")]
  UnresolvableRoot,
  #[error(transparent)]
  Accessor(#[from] AccessorError),
  #[error("encoding error: {0}")]
  Encoding(#[from] serde_json::Error),
  #[error("invalid config: {0}")]
  InvalidConfig(String),
  #[error("nesting under `{type_tag}` exceeds {limit} levels")]
  NestingTooDeep { type_tag: String, limit: usize },
}

impl SerializeError {
  pub fn missing_attribute(type_tag: &str, attribute: &str) -> Self {
    SerializeError::MissingAttribute {
      type_tag: type_tag.to_string(),
      attribute: attribute.to_string(),
    }
  }

  pub fn unresolvable_association(definition: &str, association: &str) -> Self {
    SerializeError::UnresolvableAssociation {
      definition: definition.to_string(),
      association: association.to_string(),
    }
  }

  pub fn accessor_error(&self) -> Option<&AccessorError> {
    match self {
      SerializeError::Accessor(error) => Some(error),
      _ => None,
    }
  }
}

/// Errors raised while building or registering serializer definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  #[error("association key `{key}` is declared twice on `{definition}`")]
  DuplicateAssociationKey { definition: String, key: String },
  #[error("serializer definition for `{0}` is already registered")]
  DuplicateDefinition(String),
}

/// Error produced by user-supplied accessor, attribute or predicate logic.
///
/// The engine never inspects it; `Display` and `source()` forward to the wrapped error.
pub struct AccessorError {
  inner: Box<dyn Error + Send + Sync + 'static>,
}

impl AccessorError {
  pub fn new<E>(error: E) -> Self
  where
    E: Into<Box<dyn Error + Send + Sync + 'static>>, {
    Self { inner: error.into() }
  }

  pub fn msg(message: impl Into<String>) -> Self {
    Self {
      inner: message.into().into(),
    }
  }

  pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
    self.inner.downcast_ref::<E>()
  }

  pub fn into_inner(self) -> Box<dyn Error + Send + Sync + 'static> {
    self.inner
  }
}

impl Debug for AccessorError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    Debug::fmt(&self.inner, f)
  }
}

impl Display for AccessorError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    Display::fmt(&self.inner, f)
  }
}

impl Error for AccessorError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    Some(&*self.inner)
  }
}

static_assertions::assert_impl_all!(SerializeError: Send, Sync);
static_assertions::assert_impl_all!(RegistryError: Send, Sync);
static_assertions::assert_impl_all!(AccessorError: Send, Sync);
