//! The interception pipeline: container-scoped, ordered extension hooks
//! around resolution and injection.

use std::any::{Any, TypeId};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::binding::Binding;
use crate::container::Container;
use crate::context::InjectionContext;
use crate::core::{Instance, InjectionKey};
use crate::reflection::TypeInfo;

/// Chain-control signal returned by extension hooks.
///
/// `Handled` stops the remaining chain and, for `before_*` hooks, the
/// default behavior the hook guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Handled,
}

/// A cross-cutting extension attached to one container.
///
/// Extensions are notified when they are registered and unregistered, and
/// may intercept the six points of the resolution/injection pipeline.
/// Invocation follows registration order. Hooks are trusted code: a
/// panicking hook propagates to the resolver's caller.
#[allow(unused_variables)]
pub trait ContainerExtension: Send + Sync {
  /// Called once when the extension is registered.
  fn on_register(&self, container: &Container) {}

  /// Called when the extension is unregistered or the container disposed.
  fn on_unregister(&self, container: &Container) {}

  /// Runs before type-level resolution. Returning `Some` supplies the
  /// result and skips default resolution and the rest of the chain.
  fn before_resolution(
    &self,
    requested: &InjectionKey,
    ctx: &InjectionContext<'_>,
  ) -> Option<Instance> {
    None
  }

  /// Runs after type-level resolution with the mutable result list.
  fn after_resolution(&self, requested: &InjectionKey, results: &mut Vec<Instance>) -> Flow {
    Flow::Continue
  }

  /// Runs before default instantiation of the selected binding. Returning
  /// `Some` substitutes the raw object (which must be of the binding's
  /// resolved type) and suppresses default construction; the substitute
  /// still flows through the post-creation pass.
  fn before_instantiation(
    &self,
    binding: &Binding,
    ctx: &InjectionContext<'_>,
  ) -> Option<Box<dyn Any + Send + Sync>> {
    None
  }

  /// Runs right after a raw object exists; may mutate it in place.
  fn after_instantiation(
    &self,
    binding: &Binding,
    target: &mut (dyn Any + Send + Sync),
    ctx: &InjectionContext<'_>,
  ) -> Flow {
    Flow::Continue
  }

  /// Runs before the member-injection pass; `Handled` suppresses it.
  fn before_injection(&self, info: &TypeInfo, target: &(dyn Any + Send + Sync)) -> Flow {
    Flow::Continue
  }

  /// Runs after the member-injection pass.
  fn after_injection(&self, info: &TypeInfo, target: &(dyn Any + Send + Sync)) -> Flow {
    Flow::Continue
  }
}

struct ExtensionEntry {
  type_id: TypeId,
  extension: Arc<dyn ContainerExtension>,
}

/// Ordered registry of the extensions attached to one container.
#[derive(Default)]
pub struct ExtensionPipeline {
  entries: RwLock<Vec<ExtensionEntry>>,
}

impl ExtensionPipeline {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn push<E: ContainerExtension + 'static>(&self, extension: E) -> Arc<dyn ContainerExtension> {
    let extension: Arc<dyn ContainerExtension> = Arc::new(extension);
    self.entries.write().push(ExtensionEntry {
      type_id: TypeId::of::<E>(),
      extension: extension.clone(),
    });
    extension
  }

  pub(crate) fn remove<E: ContainerExtension + 'static>(&self) -> Option<Arc<dyn ContainerExtension>> {
    let mut entries = self.entries.write();
    let position = entries
      .iter()
      .position(|entry| entry.type_id == TypeId::of::<E>())?;
    Some(entries.remove(position).extension)
  }

  pub(crate) fn drain(&self) -> Vec<Arc<dyn ContainerExtension>> {
    self
      .entries
      .write()
      .drain(..)
      .map(|entry| entry.extension)
      .collect()
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }

  // Dispatch helpers snapshot the list so no lock is held while user hooks
  // run; hooks may re-enter the container.
  fn snapshot(&self) -> Vec<Arc<dyn ContainerExtension>> {
    self
      .entries
      .read()
      .iter()
      .map(|entry| entry.extension.clone())
      .collect()
  }

  pub(crate) fn before_resolution(
    &self,
    requested: &InjectionKey,
    ctx: &InjectionContext<'_>,
  ) -> Option<Instance> {
    for extension in self.snapshot() {
      if let Some(instance) = extension.before_resolution(requested, ctx) {
        return Some(instance);
      }
    }
    None
  }

  pub(crate) fn after_resolution(&self, requested: &InjectionKey, results: &mut Vec<Instance>) {
    for extension in self.snapshot() {
      if extension.after_resolution(requested, results) == Flow::Handled {
        break;
      }
    }
  }

  pub(crate) fn before_instantiation(
    &self,
    binding: &Binding,
    ctx: &InjectionContext<'_>,
  ) -> Option<Box<dyn Any + Send + Sync>> {
    for extension in self.snapshot() {
      if let Some(raw) = extension.before_instantiation(binding, ctx) {
        return Some(raw);
      }
    }
    None
  }

  pub(crate) fn after_instantiation(
    &self,
    binding: &Binding,
    target: &mut (dyn Any + Send + Sync),
    ctx: &InjectionContext<'_>,
  ) {
    for extension in self.snapshot() {
      if extension.after_instantiation(binding, target, ctx) == Flow::Handled {
        break;
      }
    }
  }

  /// Returns `false` when an extension suppressed the member pass.
  pub(crate) fn before_injection(&self, info: &TypeInfo, target: &(dyn Any + Send + Sync)) -> bool {
    for extension in self.snapshot() {
      if extension.before_injection(info, target) == Flow::Handled {
        return false;
      }
    }
    true
  }

  pub(crate) fn after_injection(&self, info: &TypeInfo, target: &(dyn Any + Send + Sync)) {
    for extension in self.snapshot() {
      if extension.after_injection(info, target) == Flow::Handled {
        break;
      }
    }
  }
}
