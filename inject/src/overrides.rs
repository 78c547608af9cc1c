//! Override mappings and the scope that applies them.

use crate::autowired::{Arguments, AutoWired};
use crate::error::Result;
use crate::manager::Manager;
use crate::provider::{ErasedProvider, Provider, ProviderKey};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// One overridden provider and what stands in for it.
///
/// The original is kept alongside its replacement so its identity stays pinned
/// for as long as the override exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OverrideEntry {
  pub(crate) original: ErasedProvider,
  pub(crate) replacement: ErasedProvider,
}

/// A mapping from original providers to their replacements.
///
/// Returned by [`Manager::apply_overrides`] as the record of what was displaced,
/// and consumed again by [`Manager::restore_overrides`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Overrides {
  pub(crate) entries: HashMap<ProviderKey, OverrideEntry>,
}

impl Overrides {
  pub fn new() -> Self {
    Self::default()
  }

  /// Resolves `original` through `replacement` while applied.
  pub fn replace<T: Any + Send + Sync>(
    mut self,
    original: &Provider<T>,
    replacement: &Provider<T>,
  ) -> Self {
    self.insert(original, replacement);
    self
  }

  /// Overrides the bare declared type `T`, affecting parameters declared as `T`
  /// even when they carry no dependency marker.
  pub fn replace_type<T: Any + Send + Sync>(mut self, replacement: &Provider<T>) -> Self {
    self.insert_entry(OverrideEntry {
      original: ErasedProvider::declared::<T>(),
      replacement: replacement.erased().clone(),
    });
    self
  }

  pub fn insert<T: Any + Send + Sync>(
    &mut self,
    original: &Provider<T>,
    replacement: &Provider<T>,
  ) {
    self.insert_entry(OverrideEntry {
      original: original.erased().clone(),
      replacement: replacement.erased().clone(),
    });
  }

  /// The replacement registered for `original`, if any.
  pub fn replacement_for<T: Any + Send + Sync>(
    &self,
    original: &Provider<T>,
  ) -> Option<Provider<T>> {
    self
      .entries
      .get(&original.key())
      .map(|entry| Provider::from_erased(entry.replacement.clone()))
  }

  pub fn contains<T: Any + Send + Sync>(&self, original: &Provider<T>) -> bool {
    self.entries.contains_key(&original.key())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub(crate) fn insert_entry(&mut self, entry: OverrideEntry) {
    self.entries.insert(entry.original.key(), entry);
  }
}

impl fmt::Debug for Overrides {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map()
      .entries(
        self
          .entries
          .values()
          .map(|entry| (entry.original.type_name(), entry.replacement.key())),
      )
      .finish()
  }
}

/// An RAII guard that keeps a set of overrides applied to a manager.
///
/// Opening the scope applies the overrides and remembers what they displaced;
/// dropping it restores exactly that state, also while unwinding. Nested scopes
/// on one manager must close in reverse order of opening.
///
/// # Examples
///
/// ```
/// use fibre_inject::{depends, Manager, Overrides, Provider};
///
/// let manager = Manager::new();
/// let port = Provider::new(|| 8080_u16);
/// let test_port = Provider::new(|| 0_u16);
///
/// {
///   let _scope = manager.override_scope(Overrides::new().replace(&port, &test_port));
///   assert_eq!(*manager.resolve(&depends(&port)).unwrap(), 0);
/// }
/// assert_eq!(*manager.resolve(&depends(&port)).unwrap(), 8080);
/// ```
#[must_use = "overrides are restored as soon as the scope is dropped"]
pub struct OverrideScope<'m> {
  manager: &'m Manager,
  overrides: Overrides,
  previous: Option<Overrides>,
}

impl<'m> OverrideScope<'m> {
  pub fn new(manager: &'m Manager, overrides: Overrides) -> Self {
    let previous = manager.apply_overrides(&overrides);
    Self {
      manager,
      overrides,
      previous: Some(previous),
    }
  }

  /// Opens a scope, runs `f` once inside it and closes the scope again.
  pub fn run<R>(manager: &'m Manager, overrides: Overrides, f: impl FnOnce() -> R) -> R {
    let _scope = Self::new(manager, overrides);
    f()
  }

  /// Calls a wrapped function while this scope's overrides are active.
  ///
  /// The call resolves through this scope's manager, whichever manager
  /// `wired` was originally bound to.
  pub fn call<R>(&self, wired: &AutoWired<R>, args: Arguments) -> Result<R> {
    wired.bound_to(self.manager).call(args)
  }

  pub fn overrides(&self) -> &Overrides {
    &self.overrides
  }

  pub fn manager(&self) -> &'m Manager {
    self.manager
  }
}

impl Drop for OverrideScope<'_> {
  fn drop(&mut self) {
    if let Some(previous) = self.previous.take() {
      self.manager.restore_overrides(&self.overrides, previous);
    }
  }
}

impl fmt::Debug for OverrideScope<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("OverrideScope")
      .field("manager", &self.manager.name())
      .field("overrides", &self.overrides)
      .finish()
  }
}
