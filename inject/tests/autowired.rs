use fibre_inject::{
  depends, Arguments, AutoWired, Dependency, Error, Manager, Overrides, Parameter, Provider,
  Signature,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Debug, PartialEq)]
struct Database {
  url: String,
}

impl Default for Database {
  fn default() -> Self {
    Database {
      url: "postgres://localhost/app".to_string(),
    }
  }
}

fn adder(manager: &Manager, foo: &Provider<i32>, bar: &Provider<i32>) -> AutoWired<i32> {
  manager.autowire(
    Signature::new()
      .param(Parameter::new::<i32>("a").annotated(depends(foo)))
      .param(Parameter::new::<i32>("b").annotated(depends(bar))),
    |args| Ok(*args.get::<i32>("a")? + *args.get::<i32>("b")?),
  )
}

// --- Tests ---

#[test]
fn test_annotated_parameters_are_injected() {
  let manager = Manager::new();
  let foo = Provider::new(|| 1);
  let bar = Provider::new(|| 2);

  let f = adder(&manager, &foo, &bar);

  assert_eq!(f.call(Arguments::new()).unwrap(), 3);
}

#[test]
fn test_explicit_arguments_win_over_injection() {
  // Arrange
  let manager = Manager::new();
  let foo_calls = Arc::new(AtomicUsize::new(0));
  let foo = {
    let foo_calls = foo_calls.clone();
    Provider::new(move || {
      foo_calls.fetch_add(1, Ordering::SeqCst);
      1
    })
  };
  let bar = Provider::new(|| 2);
  let f = adder(&manager, &foo, &bar);

  // Act
  let by_keyword = f.call(Arguments::new().kwarg("a", 10)).unwrap();
  let by_position = f.call(Arguments::new().arg(20)).unwrap();

  // Assert
  assert_eq!(by_keyword, 12);
  assert_eq!(by_position, 22);
  // The provider behind an explicitly passed parameter never runs.
  assert_eq!(foo_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_declared_defaults_are_not_injected() {
  let manager = Manager::new();
  let calls = Arc::new(AtomicUsize::new(0));
  let provider = {
    let calls = calls.clone();
    Provider::new(move || {
      calls.fetch_add(1, Ordering::SeqCst);
      1
    })
  };
  let f = manager.autowire(
    Signature::new().param(
      Parameter::new::<i32>("a")
        .annotated(depends(&provider))
        .default_value(7),
    ),
    |args| Ok(*args.get::<i32>("a")?),
  );

  assert_eq!(f.call(Arguments::new()).unwrap(), 7);
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_declared_marker_falls_back_to_the_declared_type() {
  let manager = Manager::new();
  let f = manager.autowire(
    Signature::new().param(
      Parameter::constructible::<Database>("db").annotated(Dependency::<Database>::declared()),
    ),
    |args| Ok(args.get::<Database>("db")?.url.clone()),
  );

  assert_eq!(f.call(Arguments::new()).unwrap(), "postgres://localhost/app");
  // The declared type is cached like any other provider.
  assert!(manager.is_cached(&Provider::<Database>::from_type()));
}

#[test]
fn test_declared_marker_without_constructible_type_is_missing_provider() {
  let manager = Manager::new();
  let f = manager.autowire(
    Signature::new().param(Parameter::new::<u64>("id").annotated(Dependency::<u64>::declared())),
    |args| Ok(*args.get::<u64>("id")?),
  );

  assert_eq!(
    f.call(Arguments::new()).unwrap_err(),
    Error::MissingProvider {
      type_name: std::any::type_name::<u64>(),
    }
  );
}

#[test]
fn test_declared_marker_resolves_through_a_type_override() {
  let manager = Manager::new();
  let f = manager.autowire(
    Signature::new().param(Parameter::new::<u64>("id").annotated(Dependency::<u64>::declared())),
    |args| Ok(*args.get::<u64>("id")?),
  );
  let test_id = Provider::new(|| 99_u64);

  let scope = manager.override_scope(Overrides::new().replace_type::<u64>(&test_id));

  assert_eq!(scope.call(&f, Arguments::new()).unwrap(), 99);
}

#[test]
fn test_non_marker_annotation_is_rejected() {
  let manager = Manager::new();
  let f = manager.autowire(
    Signature::new().param(Parameter::new::<i32>("a").annotated("not a marker")),
    |args| Ok(*args.get::<i32>("a")?),
  );

  assert_eq!(
    f.call(Arguments::new()).unwrap_err(),
    Error::InvalidMarker {
      parameter: "a".into(),
      declared: std::any::type_name::<i32>(),
    }
  );
}

#[test]
fn test_marker_for_another_type_is_rejected() {
  let manager = Manager::new();
  let text = Provider::new(|| String::from("text"));
  let f = manager.autowire(
    Signature::new().param(Parameter::new::<i32>("a").annotated(depends(&text))),
    |args| Ok(*args.get::<i32>("a")?),
  );

  assert!(matches!(
    f.call(Arguments::new()),
    Err(Error::InvalidMarker { .. })
  ));
}

#[test]
fn test_invalid_marker_is_ignored_when_argument_is_passed() {
  let manager = Manager::new();
  let f = manager.autowire(
    Signature::new().param(Parameter::new::<i32>("a").annotated(42_u8)),
    |args| Ok(*args.get::<i32>("a")?),
  );

  assert_eq!(f.call(Arguments::new().arg(5)).unwrap(), 5);
}

#[test]
fn test_plain_parameter_is_injected_only_while_its_type_is_overridden() {
  // Arrange
  let manager = Manager::new();
  let f = manager.autowire(
    Signature::new().param(Parameter::new::<Database>("db")),
    |args| Ok(args.get::<Database>("db")?.url.clone()),
  );
  let calls = Arc::new(AtomicUsize::new(0));
  let test_db = {
    let calls = calls.clone();
    Provider::new(move || {
      calls.fetch_add(1, Ordering::SeqCst);
      Database {
        url: "sqlite::memory:".to_string(),
      }
    })
  };

  // Act & Assert
  // 1. Without an override the parameter stays unbound.
  assert_eq!(
    f.call(Arguments::new()).unwrap_err(),
    Error::MissingArgument("db".into())
  );

  // 2. While the type is overridden the replacement is injected, uncached.
  manager.with_overrides(Overrides::new().replace_type::<Database>(&test_db), || {
    assert_eq!(f.call(Arguments::new()).unwrap(), "sqlite::memory:");
    assert_eq!(f.call(Arguments::new()).unwrap(), "sqlite::memory:");
  });
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert!(!manager.is_cached(&test_db));

  // 3. After the scope closes, the parameter is unbound again.
  assert!(matches!(
    f.call(Arguments::new()),
    Err(Error::MissingArgument(_))
  ));
}

#[test]
fn test_binding_errors_are_reported_before_injection() {
  let manager = Manager::new();
  let foo = Provider::new(|| 1);
  let bar = Provider::new(|| 2);
  let f = adder(&manager, &foo, &bar);

  assert_eq!(
    f.call(Arguments::new().kwarg("c", 3)).unwrap_err(),
    Error::UnexpectedArgument("c".into())
  );
  assert_eq!(
    f.call(Arguments::new().arg(1).arg(2).arg(3)).unwrap_err(),
    Error::TooManyPositional { expected: 2, given: 3 }
  );
  assert!(!manager.is_cached(&foo));
}

#[test]
fn test_cached_injection_shares_one_value_across_calls() {
  let manager = Manager::new();
  let connection = Provider::new(Database::default);
  let f = manager.autowire(
    Signature::new().param(Parameter::new::<Database>("db").annotated(depends(&connection))),
    |args| args.get::<Database>("db"),
  );

  let first = f.call(Arguments::new()).unwrap();
  let second = f.clone().call(Arguments::new()).unwrap();

  assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_shared_keyword_keeps_identity() {
  let manager = Manager::new();
  let f = manager.autowire(
    Signature::new().param(Parameter::new::<Database>("db")),
    |args| args.get::<Database>("db"),
  );
  let db = Arc::new(Database::default());

  let passed = f.call(Arguments::new().kwarg_shared("db", db.clone())).unwrap();

  assert!(Arc::ptr_eq(&db, &passed));
}
