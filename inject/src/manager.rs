//! The `Manager`: owner of cached values and active overrides.

use crate::autowired::{AutoWired, BoundArguments, Signature};
use crate::builder::ManagerBuilder;
use crate::dependency::{Dependency, ErasedDependency};
use crate::error::{Error, Result};
use crate::guard::ResolutionGuard;
use crate::overrides::{OverrideEntry, OverrideScope, Overrides};
use crate::provider::{downcast_value, ErasedProvider, ErasedValue, Provider, ProviderKey};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

struct CachedValue {
  // Pins the provider so its key cannot be reused while the value is cached.
  _provider: ErasedProvider,
  value: ErasedValue,
}

pub(crate) struct ManagerShared {
  pub(crate) name: Option<String>,
  cache: DashMap<ProviderKey, CachedValue>,
  overrides: Mutex<HashMap<ProviderKey, OverrideEntry>>,
}

impl ManagerShared {
  pub(crate) fn new(name: Option<String>, initial_capacity: usize, shards: Option<usize>) -> Self {
    let cache = match shards {
      Some(shards) => DashMap::with_capacity_and_shard_amount(initial_capacity, shards),
      None => DashMap::with_capacity(initial_capacity),
    };
    Self {
      name,
      cache,
      overrides: Mutex::new(HashMap::new()),
    }
  }
}

/// A registry of cached dependency values and active overrides.
///
/// `Manager` is a cheap handle: clones share the same cache and overrides,
/// while every [`Manager::new`] call creates an independent registry. The cache
/// and the overrides are guarded separately and never locked together, and no
/// lock is held while a provider runs, so providers may resolve through the
/// same manager.
#[derive(Clone)]
pub struct Manager {
  shared: Arc<ManagerShared>,
}

impl Manager {
  /// Creates a new, independent `Manager` with default settings.
  pub fn new() -> Self {
    Self::from_shared(ManagerShared::new(None, 0, None))
  }

  /// Returns a builder to configure a new `Manager`.
  pub fn builder() -> ManagerBuilder {
    ManagerBuilder::default()
  }

  pub(crate) fn from_shared(shared: ManagerShared) -> Self {
    Self {
      shared: Arc::new(shared),
    }
  }

  pub fn name(&self) -> &str {
    self.shared.name.as_deref().unwrap_or("anonymous")
  }

  fn id(&self) -> usize {
    Arc::as_ptr(&self.shared) as usize
  }

  // --- Resolution ---

  /// Resolves a dependency to its value.
  ///
  /// An active override for the provider wins and is invoked on every call
  /// without caching. Otherwise a cached dependency returns the stored value if
  /// there is one, and the provider is invoked (and its result stored, when
  /// caching) if there is not.
  ///
  /// # Errors
  ///
  /// [`Error::MissingProvider`] if the dependency has no provider, and
  /// [`Error::CircularDependency`] if the provider is already being resolved
  /// on this thread.
  pub fn resolve<T: Any + Send + Sync>(&self, dependency: &Dependency<T>) -> Result<Arc<T>> {
    let value = self.resolve_erased(&dependency.erase())?;
    downcast_value(value, std::any::type_name::<T>())
  }

  pub(crate) fn resolve_erased(&self, dependency: &ErasedDependency) -> Result<ErasedValue> {
    let provider = dependency.provider.as_ref().ok_or(Error::MissingProvider {
      type_name: dependency.type_name,
    })?;
    let key = provider.key();
    let _guard = ResolutionGuard::enter(self.id(), key, provider.type_name())?;

    let replacement = self
      .shared
      .overrides
      .lock()
      .get(&key)
      .map(|entry| entry.replacement.clone());
    if let Some(replacement) = replacement {
      trace!(
        manager = self.name(),
        dependency = provider.type_name(),
        "resolving through override"
      );
      return replacement.invoke();
    }

    if dependency.cache {
      let cached = self.shared.cache.get(&key).map(|entry| entry.value.clone());
      if let Some(value) = cached {
        trace!(manager = self.name(), dependency = provider.type_name(), "cache hit");
        return Ok(value);
      }
    }

    trace!(
      manager = self.name(),
      dependency = provider.type_name(),
      cache = dependency.cache,
      "invoking provider"
    );
    let value = provider.invoke()?;
    if dependency.cache {
      self.shared.cache.insert(
        key,
        CachedValue {
          _provider: provider.clone(),
          value: value.clone(),
        },
      );
    }
    Ok(value)
  }

  // --- Overrides ---

  /// Applies all of `overrides` as one unit and returns what they displaced.
  ///
  /// Providers that had no active override are absent from the result. The
  /// result must be handed back to [`Manager::restore_overrides`] together with
  /// the same `overrides`.
  pub fn apply_overrides(&self, overrides: &Overrides) -> Overrides {
    let mut active = self.shared.overrides.lock();
    let mut previous = Overrides::new();
    for (key, entry) in &overrides.entries {
      if let Some(displaced) = active.insert(*key, entry.clone()) {
        previous.insert_entry(displaced);
      }
    }
    debug!(
      manager = self.name(),
      applied = overrides.len(),
      displaced = previous.len(),
      "applied overrides"
    );
    previous
  }

  /// Undoes a matching [`Manager::apply_overrides`] call.
  ///
  /// Every provider in `overrides` gets its displaced override back, or loses
  /// its override entirely if it had none. Restoring with a pair that did not
  /// come from the same `apply_overrides` call leaves the overrides in an
  /// unspecified (but memory-safe) state.
  pub fn restore_overrides(&self, overrides: &Overrides, mut previous: Overrides) {
    let mut active = self.shared.overrides.lock();
    for key in overrides.entries.keys() {
      match previous.entries.remove(key) {
        Some(displaced) => {
          active.insert(*key, displaced);
        }
        None => {
          active.remove(key);
        }
      }
    }
    debug!(manager = self.name(), restored = overrides.len(), "restored overrides");
  }

  /// Applies `overrides` until the returned scope is dropped.
  pub fn override_scope(&self, overrides: Overrides) -> OverrideScope<'_> {
    OverrideScope::new(self, overrides)
  }

  /// Runs `f` once with `overrides` applied, restoring them afterwards.
  pub fn with_overrides<R>(&self, overrides: Overrides, f: impl FnOnce() -> R) -> R {
    OverrideScope::run(self, overrides, f)
  }

  pub fn is_overridden<T: Any + Send + Sync>(&self, provider: &Provider<T>) -> bool {
    self.has_override(provider.key())
  }

  /// Whether the bare declared type `T` is currently overridden.
  pub fn is_type_overridden<T: Any + Send + Sync>(&self) -> bool {
    self.has_override(ProviderKey::of_type::<T>())
  }

  pub(crate) fn has_override(&self, key: ProviderKey) -> bool {
    self.shared.overrides.lock().contains_key(&key)
  }

  /// A snapshot of the overrides active right now.
  pub fn active_overrides(&self) -> Overrides {
    let active = self.shared.overrides.lock();
    let mut snapshot = Overrides::new();
    for entry in active.values() {
      snapshot.insert_entry(entry.clone());
    }
    snapshot
  }

  // --- Cache ---

  pub fn is_cached<T: Any + Send + Sync>(&self, provider: &Provider<T>) -> bool {
    self.shared.cache.contains_key(&provider.key())
  }

  pub fn cached_len(&self) -> usize {
    self.shared.cache.len()
  }

  /// Drops every cached value; the next cached resolution invokes its provider.
  pub fn clear_cache(&self) {
    self.shared.cache.clear();
    debug!(manager = self.name(), "cleared dependency cache");
  }

  // --- Wiring ---

  /// Wraps `target` so its parameters are resolved through this manager.
  pub fn autowire<R>(
    &self,
    signature: Signature,
    target: impl Fn(&BoundArguments) -> Result<R> + Send + Sync + 'static,
  ) -> AutoWired<R> {
    AutoWired::with_manager(self, signature, target)
  }
}

impl Default for Manager {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Manager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Manager")
      .field("name", &self.name())
      .field("cached", &self.shared.cache.len())
      .field("overrides", &self.shared.overrides.lock().len())
      .finish()
  }
}
