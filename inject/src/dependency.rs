//! The dependency marker attached to parameters.

use crate::provider::{ErasedProvider, Provider};
use std::any::{type_name, Any};
use std::fmt;

/// Describes how to obtain a value: a provider (possibly left for the declared
/// type to fill in) and whether the result is cached.
pub struct Dependency<T> {
  provider: Option<Provider<T>>,
  cache: bool,
}

impl<T: Any + Send + Sync> Dependency<T> {
  /// A cached dependency on `provider`.
  pub fn new(provider: &Provider<T>) -> Self {
    Self {
      provider: Some(provider.clone()),
      cache: true,
    }
  }

  /// A cached dependency whose provider is the parameter's declared type.
  pub fn declared() -> Self {
    Self {
      provider: None,
      cache: true,
    }
  }

  /// Sets whether resolved values are cached. Defaults to `true`.
  pub fn cache(mut self, cache: bool) -> Self {
    self.cache = cache;
    self
  }

  pub fn provider(&self) -> Option<&Provider<T>> {
    self.provider.as_ref()
  }

  pub fn is_cached(&self) -> bool {
    self.cache
  }

  pub(crate) fn erase(&self) -> ErasedDependency {
    ErasedDependency {
      provider: self.provider.as_ref().map(|p| p.erased().clone()),
      cache: self.cache,
      type_name: type_name::<T>(),
    }
  }
}

impl<T> Clone for Dependency<T> {
  fn clone(&self) -> Self {
    Self {
      provider: self.provider.clone(),
      cache: self.cache,
    }
  }
}

impl<T> fmt::Debug for Dependency<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Dependency")
      .field("provider", &self.provider)
      .field("cache", &self.cache)
      .finish()
  }
}

/// Shorthand for [`Dependency::new`]: a cached dependency on `provider`.
///
/// Chain `.cache(false)` to resolve a fresh value every time.
pub fn depends<T: Any + Send + Sync>(provider: &Provider<T>) -> Dependency<T> {
  Dependency::new(provider)
}

#[derive(Clone, Debug)]
pub(crate) struct ErasedDependency {
  pub(crate) provider: Option<ErasedProvider>,
  pub(crate) cache: bool,
  pub(crate) type_name: &'static str,
}
