use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use weft_di::{
  injectable, resolve, Binding, Container, ContainerExtension, Flow, InjectionContext,
  InjectionKey, Instance, ResolutionMode, TypeInfo,
};

// --- Extension Fixtures ---

struct Widget {
  marker: u32,
}
injectable!(Widget { new() => Widget { marker: 0 }; });

#[derive(Default)]
struct LifecycleProbe {
  registered: Arc<AtomicUsize>,
  unregistered: Arc<AtomicUsize>,
}

impl ContainerExtension for LifecycleProbe {
  fn on_register(&self, _container: &Container) {
    self.registered.fetch_add(1, Ordering::SeqCst);
  }

  fn on_unregister(&self, _container: &Container) {
    self.unregistered.fetch_add(1, Ordering::SeqCst);
  }
}

// --- Tests ---

#[test]
fn test_extension_lifecycle_notifications() {
  // Arrange
  let registered = Arc::new(AtomicUsize::new(0));
  let unregistered = Arc::new(AtomicUsize::new(0));
  let container = Container::new();

  // Act: registration notifies immediately.
  container.register_extension(LifecycleProbe {
    registered: registered.clone(),
    unregistered: unregistered.clone(),
  });
  assert_eq!(registered.load(Ordering::SeqCst), 1);
  assert_eq!(container.extension_count(), 1);

  // Unregistration notifies and removes.
  assert!(container.unregister_extension::<LifecycleProbe>());
  assert_eq!(unregistered.load(Ordering::SeqCst), 1);
  assert_eq!(container.extension_count(), 0);
  assert!(!container.unregister_extension::<LifecycleProbe>());
}

#[test]
fn test_dispose_notifies_registered_extensions() {
  // Arrange
  let unregistered = Arc::new(AtomicUsize::new(0));
  let container = Container::new();
  container.register_extension(LifecycleProbe {
    registered: Arc::new(AtomicUsize::new(0)),
    unregistered: unregistered.clone(),
  });

  // Act
  container.dispose();

  // Assert: dispose is idempotent and notified exactly once.
  container.dispose();
  assert!(container.is_disposed());
  assert_eq!(unregistered.load(Ordering::SeqCst), 1);
}

#[test]
fn test_before_resolution_short_circuits_default_lookup() {
  struct Interceptor {
    after_resolution_hits: Arc<AtomicUsize>,
  }

  impl ContainerExtension for Interceptor {
    fn before_resolution(
      &self,
      requested: &InjectionKey,
      _ctx: &InjectionContext<'_>,
    ) -> Option<Instance> {
      if requested.type_key().id() == TypeId::of::<u32>() {
        Some(Instance::new::<u32>(Arc::new(42_u32)))
      } else {
        None
      }
    }

    fn after_resolution(&self, requested: &InjectionKey, _results: &mut Vec<Instance>) -> Flow {
      if requested.type_key().id() == TypeId::of::<u32>() {
        self.after_resolution_hits.fetch_add(1, Ordering::SeqCst);
      }
      Flow::Continue
    }
  }

  // Arrange: nothing is bound; the extension supplies the value.
  let after_hits = Arc::new(AtomicUsize::new(0));
  let container = Container::builder()
    .resolution_mode(ResolutionMode::BoundOnly)
    .build();
  container.register_extension(Interceptor {
    after_resolution_hits: after_hits.clone(),
  });

  // Act
  let value = resolve!(container, u32);

  // Assert: the short-circuit result still passes through after-resolution.
  assert_eq!(*value, 42);
  assert_eq!(after_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_substitution_suppresses_later_hooks_but_not_injection_pass() {
  struct Substituting {
    after_injection_hits: Arc<AtomicUsize>,
  }

  impl ContainerExtension for Substituting {
    fn before_instantiation(
      &self,
      binding: &Binding,
      _ctx: &InjectionContext<'_>,
    ) -> Option<Box<dyn Any + Send + Sync>> {
      if binding.resolved().id() == TypeId::of::<Widget>() {
        Some(Box::new(Widget { marker: 42 }))
      } else {
        None
      }
    }

    fn after_injection(&self, info: &TypeInfo, _target: &(dyn Any + Send + Sync)) -> Flow {
      if info.key().id() == TypeId::of::<Widget>() {
        self.after_injection_hits.fetch_add(1, Ordering::SeqCst);
      }
      Flow::Continue
    }
  }

  struct Observing {
    before_instantiation_hits: Arc<AtomicUsize>,
    after_injection_hits: Arc<AtomicUsize>,
  }

  impl ContainerExtension for Observing {
    fn before_instantiation(
      &self,
      _binding: &Binding,
      _ctx: &InjectionContext<'_>,
    ) -> Option<Box<dyn Any + Send + Sync>> {
      self.before_instantiation_hits.fetch_add(1, Ordering::SeqCst);
      None
    }

    fn after_injection(&self, info: &TypeInfo, _target: &(dyn Any + Send + Sync)) -> Flow {
      if info.key().id() == TypeId::of::<Widget>() {
        self.after_injection_hits.fetch_add(1, Ordering::SeqCst);
      }
      Flow::Continue
    }
  }

  // Arrange
  let first_after = Arc::new(AtomicUsize::new(0));
  let second_before = Arc::new(AtomicUsize::new(0));
  let second_after = Arc::new(AtomicUsize::new(0));

  let container = Container::new();
  container.register_extension(Substituting {
    after_injection_hits: first_after.clone(),
  });
  container.register_extension(Observing {
    before_instantiation_hits: second_before.clone(),
    after_injection_hits: second_after.clone(),
  });
  container.bind::<Widget>().to_self();

  // Act
  let widget = resolve!(container, Widget);

  // Assert: the substitute came back, the second extension's
  // before-instantiation never ran, and after-injection ran on both.
  assert_eq!(widget.marker, 42);
  assert_eq!(second_before.load(Ordering::SeqCst), 0);
  assert_eq!(first_after.load(Ordering::SeqCst), 1);
  assert_eq!(second_after.load(Ordering::SeqCst), 1);
}

#[test]
fn test_after_instantiation_can_mutate_the_raw_object() {
  struct Stamping;

  impl ContainerExtension for Stamping {
    fn after_instantiation(
      &self,
      _binding: &Binding,
      target: &mut (dyn Any + Send + Sync),
      _ctx: &InjectionContext<'_>,
    ) -> Flow {
      if let Some(widget) = target.downcast_mut::<Widget>() {
        widget.marker = 7;
      }
      Flow::Continue
    }
  }

  // Arrange
  let container = Container::new();
  container.register_extension(Stamping);
  container.bind::<Widget>().to_self();

  // Act
  let widget = resolve!(container, Widget);

  // Assert
  assert_eq!(widget.marker, 7);
}

#[test]
fn test_before_injection_handled_suppresses_member_pass() {
  struct Gadget {
    label: Option<Arc<String>>,
  }
  injectable!(Gadget {
    new() => Gadget { label: None };
    field label: String => |gadget: &mut Gadget, value| gadget.label = Some(value);
  });

  struct Suppressing;

  impl ContainerExtension for Suppressing {
    fn before_injection(&self, info: &TypeInfo, _target: &(dyn Any + Send + Sync)) -> Flow {
      if info.key().id() == TypeId::of::<Gadget>() {
        Flow::Handled
      } else {
        Flow::Continue
      }
    }
  }

  // Arrange
  let container = Container::new();
  container.register_extension(Suppressing);
  container.bind::<String>().to_value("would be injected".to_string());
  container.bind::<Gadget>().to_self();

  // Act
  let gadget = resolve!(container, Gadget);

  // Assert: the member pass was vetoed.
  assert!(gadget.label.is_none());
}

#[test]
fn test_unregistered_extension_no_longer_intercepts() {
  struct Counting {
    hits: Arc<AtomicUsize>,
  }

  impl ContainerExtension for Counting {
    fn after_injection(&self, info: &TypeInfo, _target: &(dyn Any + Send + Sync)) -> Flow {
      if info.key().id() == TypeId::of::<Widget>() {
        self.hits.fetch_add(1, Ordering::SeqCst);
      }
      Flow::Continue
    }
  }

  // Arrange
  let hits = Arc::new(AtomicUsize::new(0));
  let container = Container::new();
  container.register_extension(Counting { hits: hits.clone() });
  container.bind::<Widget>().to_self();

  // Act
  let _first = resolve!(container, Widget);
  assert_eq!(hits.load(Ordering::SeqCst), 1);
  assert!(container.unregister_extension::<Counting>());
  let _second = resolve!(container, Widget);

  // Assert: no further interception after unregistration.
  assert_eq!(hits.load(Ordering::SeqCst), 1);
}
