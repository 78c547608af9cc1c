//! The process-wide default manager and free-standing entry points.

use crate::manager::{Manager, ManagerShared};
use once_cell::sync::Lazy;

// Built on first access, in a thread-safe manner.
static DEFAULT_MANAGER: Lazy<Manager> =
  Lazy::new(|| Manager::from_shared(ManagerShared::new(Some("default".to_owned()), 0, None)));

/// Provides a reference to the process-wide default manager.
///
/// [`AutoWired::new`](crate::AutoWired::new) resolves through this manager.
///
/// # Examples
///
/// ```
/// use fibre_inject::{default_manager, depends, Provider};
///
/// let greeting = Provider::new(|| String::from("hello"));
/// let value = default_manager().resolve(&depends(&greeting)).unwrap();
/// assert_eq!(*value, "hello");
/// ```
pub fn default_manager() -> &'static Manager {
  &DEFAULT_MANAGER
}

/// Creates a new manager that shares nothing with any other.
pub fn create_manager() -> Manager {
  Manager::new()
}

/// Runs `starting_point` with `args` and returns whatever it returns.
///
/// This is the boundary where wired functions are ultimately executed.
///
/// ```
/// use fibre_inject::execute;
///
/// assert_eq!(execute(|n: i32| n * 2, 21), 42);
/// ```
pub fn execute<A, R>(starting_point: impl FnOnce(A) -> R, args: A) -> R {
  starting_point(args)
}
