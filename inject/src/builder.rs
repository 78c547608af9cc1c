use crate::error::BuildError;
use crate::manager::{Manager, ManagerShared};

/// A builder for creating [`Manager`] instances.
///
/// # Examples
///
/// ```
/// use fibre_inject::Manager;
///
/// let manager = Manager::builder()
///   .name("request-scope")
///   .initial_capacity(64)
///   .shards(8)
///   .build()
///   .unwrap();
/// assert_eq!(manager.name(), "request-scope");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManagerBuilder {
  name: Option<String>,
  initial_capacity: usize,
  shards: Option<usize>,
}

impl ManagerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the label the manager reports in log events and `Debug` output.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Pre-allocates room in the value cache for `capacity` providers.
  pub fn initial_capacity(mut self, capacity: usize) -> Self {
    self.initial_capacity = capacity;
    self
  }

  /// Sets the number of shards of the value cache.
  ///
  /// Must be a power of two greater than one. Defaults to a value derived from
  /// the number of CPUs.
  pub fn shards(mut self, shards: usize) -> Self {
    self.shards = Some(shards);
    self
  }

  /// Builds the manager.
  ///
  /// # Errors
  ///
  /// [`BuildError::ZeroShards`] or [`BuildError::ShardsNotPowerOfTwo`] if the
  /// configured shard amount is unusable.
  pub fn build(self) -> Result<Manager, BuildError> {
    self.validate()?;
    Ok(Manager::from_shared(ManagerShared::new(
      self.name,
      self.initial_capacity,
      self.shards,
    )))
  }

  fn validate(&self) -> Result<(), BuildError> {
    match self.shards {
      Some(0) => Err(BuildError::ZeroShards),
      Some(n) if n < 2 || !n.is_power_of_two() => Err(BuildError::ShardsNotPowerOfTwo(n)),
      _ => Ok(()),
    }
  }
}
