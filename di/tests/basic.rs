use std::sync::Arc;

use weft_di::{injectable, provides, resolve, Container, ResolutionMode};

// --- Test Fixtures ---

// The trait must be Send + Sync for the container to accept it.
trait Greeter: Send + Sync {
  fn greet(&self) -> String;
}

struct EnglishGreeter;
impl Greeter for EnglishGreeter {
  fn greet(&self) -> String {
    "Hello!".to_string()
  }
}
injectable!(EnglishGreeter { new() => EnglishGreeter; });
provides!(EnglishGreeter: dyn Greeter);

// A simple struct for testing.
#[derive(Debug, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}
injectable!(SimpleService { new() => SimpleService { id: 101 }; });

// --- Basic Tests ---

#[test]
fn test_singleton_type_binding_returns_identical_instance() {
  // Arrange
  let container = Container::new();
  container.bind::<SimpleService>().to_self().as_singleton();

  // Act
  let r1 = resolve!(container, SimpleService);
  let r2 = resolve!(container, SimpleService);

  // Assert
  assert_eq!(r1.id, 101);
  // Ensure it's a singleton by checking pointer equality.
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_transient_type_binding_returns_distinct_instances() {
  // Arrange
  let container = Container::new();
  container.bind::<SimpleService>().to_self();

  // Act
  let r1 = resolve!(container, SimpleService);
  let r2 = resolve!(container, SimpleService);

  // Assert
  assert_eq!(r1.id, r2.id);
  // Ensure it's a transient by checking the pointers are different.
  assert!(!Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_named_value_binding() {
  // Arrange
  let container = Container::new();
  container
    .bind::<SimpleService>()
    .to_value(SimpleService { id: 202 })
    .named("named_instance");

  // Act
  let r1 = resolve!(container, SimpleService, "named_instance");
  let r2 = resolve!(container, SimpleService, "named_instance");

  // Assert
  assert_eq!(r1.id, 202);
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_value_binding_returns_the_stored_reference() {
  // Arrange
  let container = Container::new();
  let stored = Arc::new(SimpleService { id: 303 });
  container.bind::<SimpleService>().to_arc(stored.clone());

  // Act
  let resolved = resolve!(container, SimpleService);

  // Assert
  assert!(Arc::ptr_eq(&stored, &resolved));
}

#[test]
fn test_trait_binding_resolves_as_trait_object() {
  // Arrange
  let container = Container::new();
  container.bind::<dyn Greeter>().to::<EnglishGreeter>();

  // Act
  let greeter = resolve!(container, trait Greeter);

  // Assert
  assert_eq!(greeter.greet(), "Hello!");
}

#[test]
fn test_named_trait_binding() {
  // Arrange
  struct GermanGreeter;
  impl Greeter for GermanGreeter {
    fn greet(&self) -> String {
      "Hallo!".to_string()
    }
  }
  injectable!(GermanGreeter { new() => GermanGreeter; });
  provides!(GermanGreeter: dyn Greeter);

  let container = Container::new();
  container.bind::<dyn Greeter>().to::<EnglishGreeter>();
  container.bind::<dyn Greeter>().to::<GermanGreeter>().named("german");

  // Act
  let greeter = resolve!(container, trait Greeter, "german");

  // Assert
  assert_eq!(greeter.greet(), "Hallo!");
}

#[test]
fn test_bound_only_mode_returns_empty_instead_of_failing() {
  // Arrange
  let container = Container::builder()
    .resolution_mode(ResolutionMode::BoundOnly)
    .build();

  // Act
  let missing = container.resolve::<SimpleService>();

  // Assert: absence is an explicit result, not an error.
  assert!(matches!(missing, Ok(None)));
}

#[test]
fn test_always_resolve_mode_constructs_unbound_types() {
  // Arrange: the type is known to the reflection cache but has no binding.
  let container = Container::new();
  container.register_type::<SimpleService>();

  // Act
  let constructed = container.resolve::<SimpleService>();

  // Assert
  assert_eq!(constructed.unwrap().unwrap().id, 101);
}

#[test]
fn test_always_resolve_without_reflection_info_is_a_construction_error() {
  // Arrange
  struct UnknownService;
  let container = Container::new();

  // Act
  let result = container.resolve::<UnknownService>();

  // Assert
  assert!(matches!(
    result,
    Err(weft_di::ResolveError::Construction { .. })
  ));
}

#[test]
fn test_greeter_singleton_unbind_scenario() {
  // Arrange
  let container = Container::builder()
    .resolution_mode(ResolutionMode::BoundOnly)
    .build();
  container
    .bind::<dyn Greeter>()
    .to::<EnglishGreeter>()
    .as_singleton();

  // Act: resolving twice yields the same instance.
  let g1 = resolve!(container, trait Greeter);
  let g2 = resolve!(container, trait Greeter);
  assert!(Arc::ptr_eq(&g1, &g2));

  // Act: after unbinding, resolution under BoundOnly is empty.
  assert_eq!(container.binder().unbind::<dyn Greeter>(), 1);
  let gone = container.resolve::<dyn Greeter>();

  // Assert
  assert!(matches!(gone, Ok(None)));
}

#[test]
#[should_panic(expected = "Failed to resolve required service")]
fn test_resolve_panics_on_missing_concrete_service() {
  struct MissingService;
  let container = Container::builder()
    .resolution_mode(ResolutionMode::BoundOnly)
    .build();
  resolve!(container, MissingService);
}

#[test]
#[should_panic(expected = "Failed to resolve required trait service")]
fn test_resolve_panics_on_missing_trait_service() {
  // The test trait must also be Send + Sync to be a valid contract.
  trait MissingTrait: Send + Sync {}
  let container = Container::builder()
    .resolution_mode(ResolutionMode::BoundOnly)
    .build();
  resolve!(container, trait MissingTrait);
}
