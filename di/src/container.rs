//! The composition root: binder, injector, reflection cache, and extension
//! pipeline under one identity.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::binder::{Binder, BindingBuilder};
use crate::error::ResolveError;
use crate::extension::{ContainerExtension, ExtensionPipeline};
use crate::injector::{Injector, ResolutionMode};
use crate::reflection::{Injectable, ReflectionCache};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity token of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

impl ContainerId {
  pub fn value(&self) -> u64 {
    self.0
  }
}

/// Configuration for a [`Container`].
pub struct ContainerBuilder {
  mode: ResolutionMode,
}

impl ContainerBuilder {
  /// Sets the policy for requests with no matching binding.
  pub fn resolution_mode(mut self, mode: ResolutionMode) -> Self {
    self.mode = mode;
    self
  }

  /// Builds the container.
  pub fn build(self) -> Container {
    let binder = Arc::new(Binder::new());
    let cache = Arc::new(ReflectionCache::new());
    let extensions = Arc::new(ExtensionPipeline::new());
    let injector = Injector::new(binder.clone(), cache.clone(), extensions.clone(), self.mode);
    let id = ContainerId(NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed));
    debug!(container = id.0, mode = ?self.mode, "container created");
    Container {
      id,
      binder,
      cache,
      extensions,
      injector,
      disposed: AtomicBool::new(false),
    }
  }
}

/// An independent resolution domain.
///
/// The container exclusively owns its binder, injector, and reflection
/// cache; distinct containers never share state and may be used
/// concurrently without coordination. Mutating and resolving against the
/// *same* container from several threads at once is mechanically safe but
/// order-dependent; serialize access when determinism matters.
pub struct Container {
  id: ContainerId,
  binder: Arc<Binder>,
  cache: Arc<ReflectionCache>,
  extensions: Arc<ExtensionPipeline>,
  injector: Injector,
  disposed: AtomicBool,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// A container with the permissive [`ResolutionMode::AlwaysResolve`]
  /// default.
  pub fn new() -> Self {
    Self::builder().build()
  }

  /// Starts configuring a container.
  pub fn builder() -> ContainerBuilder {
    ContainerBuilder {
      mode: ResolutionMode::AlwaysResolve,
    }
  }

  pub fn id(&self) -> ContainerId {
    self.id
  }

  pub fn is_disposed(&self) -> bool {
    self.disposed.load(Ordering::SeqCst)
  }

  /// The binding storage.
  pub fn binder(&self) -> &Binder {
    &self.binder
  }

  /// The resolution engine.
  pub fn injector(&self) -> &Injector {
    &self.injector
  }

  /// The reflective metadata cache.
  pub fn reflection(&self) -> &ReflectionCache {
    &self.cache
  }

  // --- registration surface ---

  /// Starts a fluent binding for contract `C`. See [`Binder::bind`].
  pub fn bind<C: ?Sized + Any + Send + Sync>(&self) -> BindingBuilder<'_, C> {
    self.binder.bind::<C>()
  }

  /// Adds `T` to the reflection cache so unbound requests can construct it.
  pub fn register_type<T: Injectable>(&self) {
    self.cache.register::<T>();
  }

  /// Pre-warms the reflection cache from the current bindings.
  pub fn warm_reflection(&self) {
    self.cache.warm_from_binder(&self.binder);
  }

  // --- resolution surface ---

  /// See [`Injector::resolve`].
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self) -> Result<Option<Arc<T>>, ResolveError> {
    self.injector.resolve::<T>()
  }

  /// See [`Injector::resolve_named`].
  pub fn resolve_named<T: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
  ) -> Result<Option<Arc<T>>, ResolveError> {
    self.injector.resolve_named::<T>(name)
  }

  /// See [`Injector::resolve_all`].
  pub fn resolve_all<T: ?Sized + Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>, ResolveError> {
    self.injector.resolve_all::<T>()
  }

  /// See [`Injector::resolve_all_named`].
  pub fn resolve_all_named<T: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
  ) -> Result<Vec<Arc<T>>, ResolveError> {
    self.injector.resolve_all_named::<T>(name)
  }

  /// See [`Injector::inject`].
  pub fn inject<T: Injectable>(&self, target: &mut T) -> Result<(), ResolveError> {
    self.injector.inject(target)
  }

  /// See [`Injector::construct`].
  pub fn construct<T: Injectable>(&self) -> Result<Arc<T>, ResolveError> {
    self.injector.construct::<T>()
  }

  // --- extension surface ---

  /// Registers `extension` at the end of the pipeline and notifies it.
  pub fn register_extension<E: ContainerExtension + 'static>(&self, extension: E) {
    let extension = self.extensions.push(extension);
    debug!(container = self.id.0, "extension registered");
    extension.on_register(self);
  }

  /// Unregisters the extension of type `E`, notifying it. Returns whether
  /// one was found.
  pub fn unregister_extension<E: ContainerExtension + 'static>(&self) -> bool {
    match self.extensions.remove::<E>() {
      Some(extension) => {
        debug!(container = self.id.0, "extension unregistered");
        extension.on_unregister(self);
        true
      }
      None => false,
    }
  }

  pub fn extension_count(&self) -> usize {
    self.extensions.len()
  }

  /// Releases everything this container owns: extensions are notified via
  /// `on_unregister`, then the bindings (and with them the produced and
  /// singleton values) are dropped. Values whose last reference lives here
  /// run their `Drop` now. Idempotent; `Drop` for the container calls it.
  pub fn dispose(&self) {
    if self.disposed.swap(true, Ordering::SeqCst) {
      return;
    }
    debug!(container = self.id.0, "disposing container");
    for extension in self.extensions.drain() {
      extension.on_unregister(self);
    }
    self.binder.clear();
  }
}

impl Drop for Container {
  fn drop(&mut self) {
    self.dispose();
  }
}
