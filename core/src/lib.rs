//! Authorization-aware serializer resolution.
//!
//! Resources are rendered into JSON documents by [`SerializerDefinition`]s. Definitions are
//! looked up per association member, scoped definitions nested in an enclosing definition win
//! over the global registry, and every rule may consult the caller's [`ScopeHandle`].

extern crate self as nexus_serializer_core_rs;

pub mod association;
pub mod attribute;
pub mod collection;
pub mod config;
pub mod config_option;
pub mod definition;
pub mod document;
pub mod error;
pub mod inflection;
pub mod instance;
pub mod lookup;
pub mod registry;
pub mod resource;
pub mod scope;
pub mod shape;
pub mod sideload;

pub use association::{list_associations, AssociationOptions, AssociationRegistry, AssociationSpec, Cardinality};
pub use attribute::{resolve_attributes, AttributeOverride, AttributeSet};
pub use collection::{group_by_collection_key, CollectionOverride, CollectionSerializer, SerializedElement};
pub use config::{AssembleConfig, RootKey, DEFAULT_META_KEY};
pub use config_option::AssembleOption;
pub use definition::{SerializerDefinition, SerializerDefinitionBuilder};
pub use document::{DocumentAssembler, Subject};
pub use error::{AccessorError, RegistryError, SerializeError};
pub use instance::{ResolutionContext, SerializerInstance, MAX_NESTING_DEPTH};
pub use lookup::{DefinitionChain, ResolvedSerializer, SerializerLookup};
pub use registry::SerializerRegistry;
pub use resource::{resource_handle, AssociationValue, DynamicResource, Resource, ResourceHandle};
pub use scope::{ScopeHandle, ScopeOverride, ScopeProvider};
pub use shape::Shape;

pub use serde_json;

// Re-exports for derive macros
pub use nexus_serializer_resource_derive_rs::Resource;
