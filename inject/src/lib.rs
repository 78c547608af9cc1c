//! # Fibre Inject
//!
//! A small, thread-safe dependency injection toolkit for Rust.
//!
//! Functions declare their parameters once, marking the ones that should be
//! resolved through a zero-argument [`Provider`]. Wrapping such a function in
//! [`AutoWired`] resolves every parameter the caller did not pass, optionally
//! caching provider results, before running the function body. Overrides swap
//! providers out temporarily, which is mostly useful in tests.
//!
//! ## Core Concepts
//!
//! - **Provider**: a zero-argument factory with reference identity.
//! - **Dependency**: a marker pairing a provider with a cache flag, created with
//!   [`depends`].
//! - **Manager**: owns cached values and active overrides. A process-wide
//!   default is available via [`default_manager`]; [`create_manager`] gives an
//!   independent one.
//! - **Override Scope**: applies replacement providers and restores the
//!   previous state when dropped.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{depends, overrides, Arguments, Manager, Parameter, Provider, Signature};
//!
//! let manager = Manager::new();
//! let foo = Provider::new(|| 1_i32);
//! let bar = Provider::new(|| 2_i32);
//!
//! let add = manager.autowire(
//!   Signature::new()
//!     .param(Parameter::new::<i32>("a").annotated(depends(&foo)))
//!     .param(Parameter::new::<i32>("b").annotated(depends(&bar))),
//!   |args| Ok(*args.get::<i32>("a")? + *args.get::<i32>("b")?),
//! );
//! assert_eq!(add.call(Arguments::new()).unwrap(), 3);
//!
//! let two = Provider::new(|| 2_i32);
//! {
//!   let scope = manager.override_scope(overrides! { foo => two });
//!   assert_eq!(scope.call(&add, Arguments::new()).unwrap(), 4);
//! }
//! assert_eq!(add.call(Arguments::new()).unwrap(), 3);
//! ```

mod autowired;
mod builder;
mod dependency;
mod error;
mod global;
mod guard;
mod macros;
mod manager;
mod overrides;
mod provider;

pub use autowired::{Arguments, AutoWired, BoundArguments, Parameter, Signature, TypedParameter};
pub use builder::ManagerBuilder;
pub use dependency::{depends, Dependency};
pub use error::{BuildError, Error, Result};
pub use global::{create_manager, default_manager, execute};
pub use manager::Manager;
pub use overrides::{OverrideScope, Overrides};
pub use provider::{Provider, ProviderKey};
