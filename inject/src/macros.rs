//! Public macros for building override mappings.

/// Builds an [`Overrides`](crate::Overrides) mapping from `original => replacement`
/// pairs of [`Provider`](crate::Provider)s.
///
/// A `type T => replacement` arm overrides the bare declared type `T`.
///
/// # Examples
///
/// ```
/// use fibre_inject::{depends, overrides, Manager, Provider};
///
/// let foo = Provider::new(|| 1_i32);
/// let foo_override = Provider::new(|| 2_i32);
///
/// let manager = Manager::new();
/// let value = manager.with_overrides(overrides! { foo => foo_override }, || {
///   manager.resolve(&depends(&foo)).unwrap()
/// });
/// assert_eq!(*value, 2);
/// ```
#[macro_export]
macro_rules! overrides {
    (@acc $acc:expr; ) => {
        $acc
    };

    (@acc $acc:expr; type $type:ty => $replacement:expr $(, $($rest:tt)*)?) => {
        $crate::overrides!(@acc $acc.replace_type::<$type>(&$replacement); $($($rest)*)?)
    };

    (@acc $acc:expr; $original:expr => $replacement:expr $(, $($rest:tt)*)?) => {
        $crate::overrides!(@acc $acc.replace(&$original, &$replacement); $($($rest)*)?)
    };

    () => {
        $crate::Overrides::new()
    };

    // Entry point: overrides! { foo => foo_override, type Config => test_config }
    ($($pairs:tt)+) => {
        $crate::overrides!(@acc $crate::Overrides::new(); $($pairs)+)
    };
}
