use thiserror::Error;

/// The main error type for the `fibre_inject` library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A dependency reached resolution without a provider, and the declared type
  /// could not stand in for one.
  #[error(
    "dependency on `{type_name}` has no provider; \
     pass one to `depends()` or declare a constructible type"
  )]
  MissingProvider { type_name: &'static str },

  /// The annotation attached to a parameter is not a `Dependency` for the
  /// parameter's declared type.
  #[error(
    "annotation on parameter '{parameter}' is not a `Dependency<{declared}>`; \
     use `depends(&provider)` or `Dependency::declared()`"
  )]
  InvalidMarker {
    parameter: String,
    declared: &'static str,
  },

  #[error("missing required argument '{0}'")]
  MissingArgument(String),

  #[error("got an unexpected keyword argument '{0}'")]
  UnexpectedArgument(String),

  #[error("got multiple values for argument '{0}'")]
  DuplicateArgument(String),

  #[error("takes {expected} positional arguments but {given} were given")]
  TooManyPositional { expected: usize, given: usize },

  /// A bound argument was read back as a different type than it holds.
  #[error("argument '{name}' is not a `{expected}`")]
  ArgumentType {
    name: String,
    expected: &'static str,
  },

  /// A provider produced a value of a different type than its key promised.
  #[error("provider for `{expected}` produced a value of another type")]
  TypeMismatch { expected: &'static str },

  /// A provider resolved itself, directly or through other providers.
  #[error("circular dependency detected while resolving `{type_name}`")]
  CircularDependency { type_name: &'static str },
}

/// A specialized `Result` type for `fibre_inject` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur when building a [`Manager`](crate::Manager).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The manager was configured with zero cache shards.
  #[error("shard count cannot be zero")]
  ZeroShards,
  /// The cache shard amount must be a power of two greater than one.
  #[error("shard count must be a power of two greater than one, got {0}")]
  ShardsNotPowerOfTwo(usize),
}
