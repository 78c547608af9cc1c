//! Automatic resolution of function parameters.
//!
//! A [`Signature`] declares a function's parameters in order: their names,
//! declared types, optional annotations (normally a [`Dependency`]) and
//! defaults. [`AutoWired`] pairs a signature with the function body; calling it
//! binds the caller's [`Arguments`], resolves every unbound parameter it can
//! through a [`Manager`], and hands the merged [`BoundArguments`] to the body.

use crate::dependency::{Dependency, ErasedDependency};
use crate::error::{Error, Result};
use crate::global::default_manager;
use crate::manager::Manager;
use crate::provider::{downcast_value, ErasedProvider, ErasedValue, Provider};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

type Annotation = Arc<dyn Any + Send + Sync>;
type MarkerReader = fn(&(dyn Any + Send + Sync)) -> Option<ErasedDependency>;

fn read_marker<T: Any + Send + Sync>(
  annotation: &(dyn Any + Send + Sync),
) -> Option<ErasedDependency> {
  annotation.downcast_ref::<Dependency<T>>().map(Dependency::<T>::erase)
}

/// A declared function parameter.
#[derive(Clone)]
pub struct Parameter {
  name: String,
  declared: ErasedProvider,
  annotation: Option<Annotation>,
  read_marker: MarkerReader,
  default: Option<ErasedValue>,
}

impl Parameter {
  /// A parameter of type `T`. The type has no way to build itself, so a marker
  /// without a provider can only be satisfied by an override of `T`.
  pub fn new<T: Any + Send + Sync>(name: impl Into<String>) -> TypedParameter<T> {
    TypedParameter::declare(name.into(), ErasedProvider::declared::<T>())
  }

  /// A parameter of type `T` whose declared type acts as its own provider.
  pub fn constructible<T: Any + Send + Sync + Default>(
    name: impl Into<String>,
  ) -> TypedParameter<T> {
    let declared = Provider::<T>::from_type().erased().clone();
    TypedParameter::declare(name.into(), declared)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn declared_type(&self) -> &'static str {
    self.declared.type_name()
  }

  /// The dependency to resolve for this unbound parameter, if any.
  fn injection(&self, manager: &Manager) -> Result<Option<ErasedDependency>> {
    if let Some(annotation) = &self.annotation {
      let mut marker =
        (self.read_marker)(&**annotation).ok_or_else(|| Error::InvalidMarker {
          parameter: self.name.clone(),
          declared: self.declared.type_name(),
        })?;
      if marker.provider.is_none() {
        marker.provider = Some(self.declared.clone());
      }
      return Ok(Some(marker));
    }

    if manager.has_override(self.declared.key()) {
      return Ok(Some(ErasedDependency {
        provider: Some(self.declared.clone()),
        cache: false,
        type_name: self.declared.type_name(),
      }));
    }

    Ok(None)
  }
}

/// A [`Parameter`] under construction, still carrying its declared type so
/// defaults are checked against it.
pub struct TypedParameter<T> {
  inner: Parameter,
  _declared: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypedParameter<T> {
  fn declare(name: String, declared: ErasedProvider) -> Self {
    Self {
      inner: Parameter {
        name,
        declared,
        annotation: None,
        read_marker: read_marker::<T>,
        default: None,
      },
      _declared: PhantomData,
    }
  }

  /// Attaches an annotation, normally a [`Dependency`] on the declared type.
  ///
  /// Anything else is reported as [`Error::InvalidMarker`] when the parameter
  /// needs resolving.
  pub fn annotated(mut self, annotation: impl Any + Send + Sync) -> Self {
    self.inner.annotation = Some(Arc::new(annotation) as Annotation);
    self
  }

  /// Declares a default value used when the caller does not bind the parameter.
  pub fn default_value(mut self, value: T) -> Self {
    self.inner.default = Some(Arc::new(value) as ErasedValue);
    self
  }

  pub fn name(&self) -> &str {
    self.inner.name()
  }
}

impl<T> From<TypedParameter<T>> for Parameter {
  fn from(param: TypedParameter<T>) -> Self {
    param.inner
  }
}

impl fmt::Debug for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Parameter")
      .field("name", &self.name)
      .field("type", &self.declared.type_name())
      .field("annotated", &self.annotation.is_some())
      .field("has_default", &self.default.is_some())
      .finish()
  }
}

/// The ordered parameter list of a wrapped function.
#[derive(Clone, Debug, Default)]
pub struct Signature {
  params: Vec<Parameter>,
}

impl Signature {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn param(mut self, param: impl Into<Parameter>) -> Self {
    self.params.push(param.into());
    self
  }

  pub fn params(&self) -> &[Parameter] {
    &self.params
  }

  fn position(&self, name: &str) -> Option<usize> {
    self.params.iter().position(|p| p.name == name)
  }

  /// Binds `args` to parameters without requiring every parameter.
  fn bind_partial(&self, args: Arguments) -> Result<BoundArguments> {
    if args.positional.len() > self.params.len() {
      return Err(Error::TooManyPositional {
        expected: self.params.len(),
        given: args.positional.len(),
      });
    }

    let mut bound = BoundArguments::default();
    for (param, value) in self.params.iter().zip(args.positional) {
      bound.values.insert(param.name.clone(), value);
    }
    for (name, value) in args.keyword {
      if self.position(&name).is_none() {
        return Err(Error::UnexpectedArgument(name));
      }
      if bound.values.contains_key(&name) {
        return Err(Error::DuplicateArgument(name));
      }
      bound.values.insert(name, value);
    }
    Ok(bound)
  }

  fn apply_defaults(&self, bound: &mut BoundArguments) {
    for param in &self.params {
      if let Some(default) = &param.default {
        bound
          .values
          .entry(param.name.clone())
          .or_insert_with(|| default.clone());
      }
    }
  }
}

/// The arguments a caller passes to a wrapped function.
#[derive(Default)]
pub struct Arguments {
  positional: Vec<ErasedValue>,
  keyword: Vec<(String, ErasedValue)>,
}

impl Arguments {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a positional argument.
  pub fn arg<T: Any + Send + Sync>(mut self, value: T) -> Self {
    self.positional.push(Arc::new(value));
    self
  }

  /// Adds a keyword argument.
  pub fn kwarg<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
    self.keyword.push((name.into(), Arc::new(value) as ErasedValue));
    self
  }

  /// Adds a keyword argument that is already shared, keeping its identity.
  pub fn kwarg_shared<T: Any + Send + Sync>(
    mut self,
    name: impl Into<String>,
    value: Arc<T>,
  ) -> Self {
    self.keyword.push((name.into(), value as ErasedValue));
    self
  }
}

impl fmt::Debug for Arguments {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Arguments")
      .field("positional", &self.positional.len())
      .field(
        "keyword",
        &self.keyword.iter().map(|(name, _)| name).collect::<Vec<_>>(),
      )
      .finish()
  }
}

/// Arguments after binding, defaults and injection, as seen by the function body.
#[derive(Default)]
pub struct BoundArguments {
  values: HashMap<String, ErasedValue>,
}

impl BoundArguments {
  /// Reads the argument bound to `name`.
  ///
  /// # Errors
  ///
  /// [`Error::MissingArgument`] if nothing is bound to `name`, and
  /// [`Error::ArgumentType`] if the bound value is not a `T`.
  pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let value = self
      .values
      .get(name)
      .cloned()
      .ok_or_else(|| Error::MissingArgument(name.to_owned()))?;
    downcast_value::<T>(value, type_name::<T>()).map_err(|_| Error::ArgumentType {
      name: name.to_owned(),
      expected: type_name::<T>(),
    })
  }

  pub fn contains(&self, name: &str) -> bool {
    self.values.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

impl fmt::Debug for BoundArguments {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.values.keys()).finish()
  }
}

type Target<R> = Arc<dyn Fn(&BoundArguments) -> Result<R> + Send + Sync>;

/// A function whose parameters are resolved through a [`Manager`] at call time.
///
/// Explicitly passed arguments always win: a parameter the caller binds is
/// never injected and its provider is never invoked.
///
/// # Examples
///
/// ```
/// use fibre_inject::{depends, Arguments, AutoWired, Manager, Parameter, Provider, Signature};
///
/// let manager = Manager::new();
/// let foo = Provider::new(|| 1_i32);
/// let bar = Provider::new(|| 2_i32);
///
/// let add = AutoWired::with_manager(
///   &manager,
///   Signature::new()
///     .param(Parameter::new::<i32>("a").annotated(depends(&foo)))
///     .param(Parameter::new::<i32>("b").annotated(depends(&bar))),
///   |args| Ok(*args.get::<i32>("a")? + *args.get::<i32>("b")?),
/// );
///
/// assert_eq!(add.call(Arguments::new()).unwrap(), 3);
/// assert_eq!(add.call(Arguments::new().kwarg("b", 40_i32)).unwrap(), 41);
/// ```
pub struct AutoWired<R> {
  signature: Arc<Signature>,
  target: Target<R>,
  manager: Manager,
}

impl<R> AutoWired<R> {
  /// Wraps `target`, resolving through the process-wide default manager.
  pub fn new(
    signature: Signature,
    target: impl Fn(&BoundArguments) -> Result<R> + Send + Sync + 'static,
  ) -> Self {
    Self::with_manager(default_manager(), signature, target)
  }

  /// Wraps `target`, resolving through `manager`.
  pub fn with_manager(
    manager: &Manager,
    signature: Signature,
    target: impl Fn(&BoundArguments) -> Result<R> + Send + Sync + 'static,
  ) -> Self {
    Self {
      signature: Arc::new(signature),
      target: Arc::new(target),
      manager: manager.clone(),
    }
  }

  /// Binds `args`, injects what is missing and calls the wrapped function.
  ///
  /// # Errors
  ///
  /// Binding errors, [`Error::InvalidMarker`] and resolution errors are
  /// returned before the body runs; anything the body returns is passed on.
  pub fn call(&self, args: Arguments) -> Result<R> {
    let mut bound = self.signature.bind_partial(args)?;
    self.signature.apply_defaults(&mut bound);
    self.inject(&mut bound)?;
    (self.target)(&bound)
  }

  fn inject(&self, bound: &mut BoundArguments) -> Result<()> {
    for param in self.signature.params() {
      if bound.contains(&param.name) {
        continue;
      }
      if let Some(dependency) = param.injection(&self.manager)? {
        trace!(
          manager = self.manager.name(),
          parameter = param.name.as_str(),
          "injecting dependency"
        );
        let value = self.manager.resolve_erased(&dependency)?;
        bound.values.insert(param.name.clone(), value);
      }
    }
    Ok(())
  }

  /// The same function, resolving through `manager` instead.
  pub(crate) fn bound_to(&self, manager: &Manager) -> Self {
    Self {
      signature: self.signature.clone(),
      target: self.target.clone(),
      manager: manager.clone(),
    }
  }

  pub fn signature(&self) -> &Signature {
    &self.signature
  }

  pub fn manager(&self) -> &Manager {
    &self.manager
  }
}

impl<R> Clone for AutoWired<R> {
  fn clone(&self) -> Self {
    Self {
      signature: self.signature.clone(),
      target: self.target.clone(),
      manager: self.manager.clone(),
    }
  }
}

impl<R> fmt::Debug for AutoWired<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AutoWired")
      .field("signature", &self.signature)
      .field("manager", &self.manager.name())
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn two_ints() -> Signature {
    Signature::new()
      .param(Parameter::new::<i32>("a"))
      .param(Parameter::new::<i32>("b"))
  }

  #[test]
  fn positional_arguments_bind_in_declaration_order() {
    let bound = two_ints()
      .bind_partial(Arguments::new().arg(1_i32).arg(2_i32))
      .unwrap();
    assert_eq!(*bound.get::<i32>("a").unwrap(), 1);
    assert_eq!(*bound.get::<i32>("b").unwrap(), 2);
  }

  #[test]
  fn too_many_positional_arguments_are_rejected() {
    let err = two_ints()
      .bind_partial(Arguments::new().arg(1_i32).arg(2_i32).arg(3_i32))
      .unwrap_err();
    assert_eq!(err, Error::TooManyPositional { expected: 2, given: 3 });
  }

  #[test]
  fn unknown_keyword_is_rejected() {
    let err = two_ints()
      .bind_partial(Arguments::new().kwarg("c", 1_i32))
      .unwrap_err();
    assert_eq!(err, Error::UnexpectedArgument("c".into()));
  }

  #[test]
  fn keyword_repeating_a_positional_is_rejected() {
    let err = two_ints()
      .bind_partial(Arguments::new().arg(1_i32).kwarg("a", 2_i32))
      .unwrap_err();
    assert_eq!(err, Error::DuplicateArgument("a".into()));
  }

  #[test]
  fn defaults_fill_only_unbound_parameters() {
    let signature = Signature::new()
      .param(Parameter::new::<i32>("a").default_value(10_i32))
      .param(Parameter::new::<i32>("b").default_value(20_i32));
    let mut bound = signature
      .bind_partial(Arguments::new().kwarg("b", 2_i32))
      .unwrap();
    signature.apply_defaults(&mut bound);
    assert_eq!(*bound.get::<i32>("a").unwrap(), 10);
    assert_eq!(*bound.get::<i32>("b").unwrap(), 2);
  }

  #[test]
  fn defaults_take_the_declared_type() {
    // The literal is inferred as the declared `u8`, not as the `i32` fallback.
    let signature = Signature::new().param(Parameter::new::<u8>("small").default_value(7));
    let mut bound = signature.bind_partial(Arguments::new()).unwrap();
    signature.apply_defaults(&mut bound);
    assert_eq!(*bound.get::<u8>("small").unwrap(), 7);
  }

  #[test]
  fn reading_with_the_wrong_type_fails() {
    let bound = two_ints().bind_partial(Arguments::new().arg(1_i32)).unwrap();
    assert_eq!(
      bound.get::<String>("a").unwrap_err(),
      Error::ArgumentType {
        name: "a".into(),
        expected: type_name::<String>(),
      }
    );
    assert_eq!(
      bound.get::<i32>("b").unwrap_err(),
      Error::MissingArgument("b".into())
    );
  }
}
