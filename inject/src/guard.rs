//! Detection of providers that resolve themselves.

use crate::error::{Error, Result};
use crate::provider::ProviderKey;
use std::cell::RefCell;
use std::collections::HashSet;

type StackEntry = (usize, ProviderKey); // (manager identity, provider)

thread_local! {
  // Providers currently being resolved on this thread, per manager.
  static RESOLVING_STACK: RefCell<HashSet<StackEntry>> = RefCell::new(HashSet::new());
}

/// An RAII guard marking a provider as "being resolved" on the current thread.
///
/// Entering a provider that is already on the stack fails with
/// [`Error::CircularDependency`]; dropping the guard pops it again.
pub(crate) struct ResolutionGuard {
  entry: StackEntry,
}

impl ResolutionGuard {
  pub(crate) fn enter(
    manager_id: usize,
    key: ProviderKey,
    type_name: &'static str,
  ) -> Result<Self> {
    let entry = (manager_id, key);
    let inserted = RESOLVING_STACK.with(|stack| stack.borrow_mut().insert(entry));
    if !inserted {
      return Err(Error::CircularDependency { type_name });
    }
    Ok(Self { entry })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.entry);
    });
  }
}
