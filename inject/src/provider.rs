//! Providers: zero-argument factories with reference identity.

use crate::error::{Error, Result};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;
pub(crate) type ErasedFactory = Arc<dyn Fn() -> ErasedValue + Send + Sync>;

/// The identity under which a provider is cached and overridden.
///
/// Function providers are keyed by the address of their shared factory, so two
/// clones of one [`Provider`] are the same provider while two separately
/// constructed ones never are. Type providers are keyed by the type itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKey {
  Type(TypeId),
  Factory(usize),
}

impl ProviderKey {
  pub(crate) fn of_type<T: ?Sized + Any>() -> Self {
    ProviderKey::Type(TypeId::of::<T>())
  }

  fn of_factory(factory: &ErasedFactory) -> Self {
    ProviderKey::Factory(Arc::as_ptr(factory) as *const () as usize)
  }
}

impl fmt::Debug for ProviderKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProviderKey::Type(type_id) => write!(f, "Key(Type({:?}))", type_id),
      ProviderKey::Factory(addr) => write!(f, "Key(Factory({:#x}))", addr),
    }
  }
}

/// The untyped form every map inside a manager stores.
///
/// `factory` is `None` only for a bare declared type that has no way to build
/// itself; such a provider can still be overridden.
#[derive(Clone)]
pub(crate) struct ErasedProvider {
  key: ProviderKey,
  type_name: &'static str,
  factory: Option<ErasedFactory>,
}

impl ErasedProvider {
  /// A key-only provider for the declared type `T`.
  pub(crate) fn declared<T: Any + Send + Sync>() -> Self {
    Self {
      key: ProviderKey::of_type::<T>(),
      type_name: type_name::<T>(),
      factory: None,
    }
  }

  pub(crate) fn key(&self) -> ProviderKey {
    self.key
  }

  pub(crate) fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub(crate) fn invoke(&self) -> Result<ErasedValue> {
    match &self.factory {
      Some(factory) => Ok(factory()),
      None => Err(Error::MissingProvider {
        type_name: self.type_name,
      }),
    }
  }
}

impl PartialEq for ErasedProvider {
  fn eq(&self, other: &Self) -> bool {
    self.key == other.key
  }
}

impl Eq for ErasedProvider {}

impl fmt::Debug for ErasedProvider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Provider")
      .field("key", &self.key)
      .field("type", &self.type_name)
      .field("has_factory", &self.factory.is_some())
      .finish()
  }
}

/// A zero-argument factory producing values of type `T`.
///
/// Providers are cheap to clone and clones share identity. Values are handed
/// out as `Arc<T>` so a cached value is returned as the very same allocation.
///
/// # Examples
///
/// ```
/// use fibre_inject::{depends, Manager, Provider};
/// use std::sync::Arc;
///
/// let answer = Provider::new(|| 42_u32);
/// let manager = Manager::new();
///
/// let first = manager.resolve(&depends(&answer)).unwrap();
/// let second = manager.resolve(&depends(&answer)).unwrap();
/// assert_eq!(*first, 42);
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct Provider<T> {
  inner: ErasedProvider,
  _value: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Provider<T> {
  /// Creates a new provider with its own identity from a factory closure.
  pub fn new(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
    let factory: ErasedFactory = Arc::new(move || Arc::new(factory()) as ErasedValue);
    Self::from_erased(ErasedProvider {
      key: ProviderKey::of_factory(&factory),
      type_name: type_name::<T>(),
      factory: Some(factory),
    })
  }

  /// The provider for which the type `T` builds itself via `Default`.
  ///
  /// Every type provider for `T` shares one identity, the same one used when a
  /// bare declared type `T` is overridden.
  pub fn from_type() -> Self
  where
    T: Default,
  {
    Self::from_erased(ErasedProvider {
      key: ProviderKey::of_type::<T>(),
      type_name: type_name::<T>(),
      factory: Some(Arc::new(|| Arc::new(T::default()) as ErasedValue)),
    })
  }

  /// Invokes the factory directly, bypassing any manager.
  pub fn provide(&self) -> Result<Arc<T>> {
    downcast_value(self.inner.invoke()?, self.inner.type_name)
  }

  pub fn key(&self) -> ProviderKey {
    self.inner.key
  }

  pub(crate) fn from_erased(inner: ErasedProvider) -> Self {
    Self {
      inner,
      _value: PhantomData,
    }
  }

  pub(crate) fn erased(&self) -> &ErasedProvider {
    &self.inner
  }
}

impl<T> Clone for Provider<T> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      _value: PhantomData,
    }
  }
}

impl<T> PartialEq for Provider<T> {
  fn eq(&self, other: &Self) -> bool {
    self.inner == other.inner
  }
}

impl<T> Eq for Provider<T> {}

impl<T> fmt::Debug for Provider<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.inner.fmt(f)
  }
}

pub(crate) fn downcast_value<T: Any + Send + Sync>(
  value: ErasedValue,
  expected: &'static str,
) -> Result<Arc<T>> {
  value
    .downcast::<T>()
    .map_err(|_| Error::TypeMismatch { expected })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Default)]
  struct Settings;

  #[test]
  fn clones_share_identity() {
    let provider = Provider::new(|| 1_i32);
    let clone = provider.clone();
    assert_eq!(provider, clone);
    assert_eq!(provider.key(), clone.key());
  }

  #[test]
  fn identical_closures_are_distinct_providers() {
    let a = Provider::new(|| 1_i32);
    let b = Provider::new(|| 1_i32);
    assert_ne!(a, b);
  }

  #[test]
  fn type_providers_share_the_type_key() {
    let a = Provider::<Settings>::from_type();
    let b = Provider::<Settings>::from_type();
    assert_eq!(a.key(), b.key());
    assert_eq!(a.key(), ErasedProvider::declared::<Settings>().key());
  }

  #[test]
  fn declared_provider_without_factory_is_missing() {
    let declared = ErasedProvider::declared::<Settings>();
    assert!(matches!(
      declared.invoke(),
      Err(Error::MissingProvider { .. })
    ));
  }

  #[test]
  fn provide_calls_the_factory_every_time() {
    let provider = Provider::new(|| String::from("fresh"));
    let a = provider.provide().unwrap();
    let b = provider.provide().unwrap();
    assert_eq!(*a, "fresh");
    assert!(!Arc::ptr_eq(&a, &b));
  }
}
