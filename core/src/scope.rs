use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::resource::Resource;

/// Opaque authorization context threaded through one resolution tree.
///
/// The engine never looks inside; definitions downcast it in their own predicates.
#[derive(Clone, Default)]
pub struct ScopeHandle(Option<Arc<dyn Any + Send + Sync>>);

impl ScopeHandle {
  pub fn new<T: Any + Send + Sync>(scope: T) -> Self {
    ScopeHandle(Some(Arc::new(scope)))
  }

  pub fn none() -> Self {
    ScopeHandle(None)
  }

  pub fn is_none(&self) -> bool {
    self.0.is_none()
  }

  pub fn to_typed<T: Any + Send + Sync>(&self) -> Option<&T> {
    self.0.as_ref().and_then(|scope| scope.downcast_ref::<T>())
  }

  /// Evaluates `predicate` against the scope, `false` when the scope is absent or of another type.
  pub fn satisfies<T, F>(&self, predicate: F) -> bool
  where
    T: Any + Send + Sync,
    F: FnOnce(&T) -> bool, {
    self.to_typed::<T>().map(predicate).unwrap_or(false)
  }
}

impl Debug for ScopeHandle {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.0 {
      Some(_) => write!(f, "ScopeHandle(..)"),
      None => write!(f, "ScopeHandle(None)"),
    }
  }
}

impl PartialEq for ScopeHandle {
  fn eq(&self, other: &Self) -> bool {
    match (&self.0, &other.0) {
      (Some(a), Some(b)) => Arc::ptr_eq(a, b),
      (None, None) => true,
      _ => false,
    }
  }
}

/// Host hook producing the scope for one top-level request.
pub trait ScopeProvider<R: ?Sized> {
  fn provide_scope(&self, request: &R) -> ScopeHandle;
}

impl<R: ?Sized, F> ScopeProvider<R> for F
where
  F: Fn(&R) -> ScopeHandle,
{
  fn provide_scope(&self, request: &R) -> ScopeHandle {
    self(request)
  }
}

/// Per-call replacement of the scope for each top-level resource.
#[derive(Clone)]
pub struct ScopeOverride(Arc<dyn Fn(&dyn Resource) -> ScopeHandle + Send + Sync + 'static>);

impl ScopeOverride {
  pub fn new(f: impl Fn(&dyn Resource) -> ScopeHandle + Send + Sync + 'static) -> Self {
    ScopeOverride(Arc::new(f))
  }

  pub fn run(&self, resource: &dyn Resource) -> ScopeHandle {
    (self.0)(resource)
  }
}

impl Debug for ScopeOverride {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "ScopeOverride")
  }
}

impl PartialEq for ScopeOverride {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

/// Scope derivation a definition applies to the subtree it renders.
#[derive(Clone)]
pub struct ScopeDerivation(Arc<dyn Fn(&dyn Resource, &ScopeHandle) -> ScopeHandle + Send + Sync + 'static>);

impl ScopeDerivation {
  pub fn new(f: impl Fn(&dyn Resource, &ScopeHandle) -> ScopeHandle + Send + Sync + 'static) -> Self {
    ScopeDerivation(Arc::new(f))
  }

  pub fn run(&self, resource: &dyn Resource, scope: &ScopeHandle) -> ScopeHandle {
    (self.0)(resource, scope)
  }
}

impl Debug for ScopeDerivation {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "ScopeDerivation")
  }
}

impl PartialEq for ScopeDerivation {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

static_assertions::assert_impl_all!(ScopeHandle: Send, Sync);
static_assertions::assert_impl_all!(ScopeOverride: Send, Sync);
static_assertions::assert_impl_all!(ScopeDerivation: Send, Sync);
