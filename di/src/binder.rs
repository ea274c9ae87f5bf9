//! Pure binding storage plus the fluent registration builder.

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::binding::{Binding, BindingSource, Lifetime};
use crate::context::InjectionContext;
use crate::core::{Instance, ProvideAs, TypeKey};
use crate::error::ResolveError;
use crate::reflection::{Injectable, TypeInfo};

/// Ordered storage for [`Binding`] records.
///
/// The binder stores and matches; it never resolves values. Registration
/// order is preserved because multi-binding resolution returns results in
/// that order.
#[derive(Default)]
pub struct Binder {
  bindings: RwLock<Vec<Arc<Binding>>>,
}

impl Binder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts a fluent binding for contract `C`.
  ///
  /// The finished record is committed atomically when the returned builder
  /// drops at the end of the chain; partially-configured bindings are never
  /// visible to readers.
  pub fn bind<C: ?Sized + Any + Send + Sync>(&self) -> BindingBuilder<'_, C> {
    BindingBuilder {
      binder: self,
      resolved: TypeKey::of::<C>(),
      name: None,
      lifetime: Lifetime::Transient,
      condition: None,
      source: None,
      _contract: PhantomData,
    }
  }

  /// All bindings whose contract is `type_id`, in registration order.
  pub fn bindings_for(&self, type_id: TypeId) -> Vec<Arc<Binding>> {
    self
      .bindings
      .read()
      .iter()
      .filter(|binding| binding.contract.id() == type_id)
      .cloned()
      .collect()
  }

  /// Reverse lookup: bindings whose *resolved* type is `type_id`.
  pub fn bindings_to(&self, type_id: TypeId) -> Vec<Arc<Binding>> {
    self
      .bindings
      .read()
      .iter()
      .filter(|binding| binding.resolved.id() == type_id)
      .cloned()
      .collect()
  }

  /// Snapshot of every registered binding, in registration order.
  pub fn all_bindings(&self) -> Vec<Arc<Binding>> {
    self.bindings.read().clone()
  }

  /// Removes every binding for contract `C`, returning how many went away.
  ///
  /// Removal never disposes values; released instances drop with their last
  /// reference.
  pub fn unbind<C: ?Sized + Any + Send + Sync>(&self) -> usize {
    self.retain(|binding| binding.contract.id() != TypeId::of::<C>())
  }

  /// Removes bindings for contract `C` registered under `name`.
  pub fn unbind_named<C: ?Sized + Any + Send + Sync>(&self, name: &str) -> usize {
    self.retain(|binding| {
      binding.contract.id() != TypeId::of::<C>() || binding.name.as_deref() != Some(name)
    })
  }

  /// Removes one exact binding by reference identity.
  pub fn unbind_binding(&self, binding: &Arc<Binding>) -> bool {
    self.retain(|candidate| !Arc::ptr_eq(candidate, binding)) > 0
  }

  /// Removes everything.
  pub fn clear(&self) {
    self.bindings.write().clear();
  }

  pub fn len(&self) -> usize {
    self.bindings.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.read().is_empty()
  }

  fn retain(&self, keep: impl Fn(&Arc<Binding>) -> bool) -> usize {
    let mut bindings = self.bindings.write();
    let before = bindings.len();
    bindings.retain(|binding| keep(binding));
    before - bindings.len()
  }

  pub(crate) fn commit(&self, binding: Binding) -> Arc<Binding> {
    debug!(
      contract = binding.contract.name(),
      resolved = binding.resolved.name(),
      kind = ?binding.kind(),
      "binding registered"
    );
    let binding = Arc::new(binding);
    self.bindings.write().push(binding.clone());
    binding
  }
}

/// Fluent handle for one binding under construction.
///
/// Every verb consumes and returns the builder, so a registration reads as
/// one statement:
///
/// ```ignore
/// binder.bind::<dyn Greeter>().to::<EnglishGreeter>().as_singleton().named("english");
/// ```
///
/// Dropping the builder commits the record to the binder.
pub struct BindingBuilder<'b, C: ?Sized + Any + Send + Sync> {
  binder: &'b Binder,
  resolved: TypeKey,
  name: Option<String>,
  lifetime: Lifetime,
  condition: Option<crate::binding::ConditionFn>,
  source: Option<BindingSource>,
  _contract: PhantomData<fn(&C)>,
}

impl<'b, C: ?Sized + Any + Send + Sync> BindingBuilder<'b, C> {
  /// Retargets the binding to construct concrete type `U`.
  pub fn to<U>(mut self) -> Self
  where
    U: Injectable + ProvideAs<C>,
  {
    self.resolved = TypeKey::of::<U>();
    self.source = Some(BindingSource::Type {
      seal: Some(Box::new(|raw| {
        let concrete = raw.downcast::<U>().map_err(|_| ResolveError::TypeMismatch {
          expected: std::any::type_name::<U>(),
          context: "promoting a constructed instance to its contract".to_owned(),
        })?;
        Ok(Instance::new::<C>(U::promote(Arc::new(*concrete))))
      })),
      info: Some(U::type_info as fn() -> TypeInfo),
    });
    self
  }

  /// Explicit self-binding: the contract is itself the constructed type.
  pub fn to_self(self) -> Self
  where
    C: Injectable,
  {
    self.to::<C>()
  }

  /// Binds to a pre-built value, stored as the single shared instance.
  pub fn to_value<V: ProvideAs<C>>(mut self, value: V) -> Self {
    self.resolved = TypeKey::of::<V>();
    self.source = Some(BindingSource::Value {
      instance: Instance::new::<C>(V::promote(Arc::new(value))),
    });
    self
  }

  /// Binds to an already-shared value.
  pub fn to_arc(mut self, value: Arc<C>) -> Self {
    self.source = Some(BindingSource::Value {
      instance: Instance::new::<C>(value),
    });
    self
  }

  /// Binds to a factory producing a fresh raw value per resolution. The
  /// engine applies the standard post-creation pass to the product.
  pub fn to_factory<V, F>(mut self, factory: F) -> Self
  where
    V: ProvideAs<C>,
    F: Fn(&InjectionContext<'_>) -> Result<V, ResolveError> + Send + Sync + 'static,
  {
    self.resolved = TypeKey::of::<V>();
    self.source = Some(BindingSource::Factory {
      produce: Box::new(move |ctx| {
        factory(ctx).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
      }),
      seal: Box::new(|raw| {
        let concrete = raw.downcast::<V>().map_err(|_| ResolveError::TypeMismatch {
          expected: std::any::type_name::<V>(),
          context: "promoting a factory product to its contract".to_owned(),
        })?;
        Ok(Instance::new::<C>(V::promote(Arc::new(*concrete))))
      }),
    });
    self
  }

  /// Binds to an ordered list of pre-supplied values resolved together.
  pub fn to_instances<I>(mut self, values: I) -> Self
  where
    I: IntoIterator<Item = Arc<C>>,
  {
    self.source = Some(BindingSource::Multiton {
      instances: values.into_iter().map(Instance::new::<C>).collect(),
    });
    self
  }

  /// Reuses one canonical instance across resolutions.
  pub fn as_singleton(mut self) -> Self {
    self.lifetime = Lifetime::Singleton;
    self
  }

  /// Disambiguates this binding with an identifier (value equality).
  pub fn named(mut self, name: &str) -> Self {
    self.name = Some(name.to_owned());
    self
  }

  /// Restricts this binding to contexts accepted by `predicate`.
  pub fn when(
    mut self,
    predicate: impl Fn(&InjectionContext<'_>) -> bool + Send + Sync + 'static,
  ) -> Self {
    self.condition = Some(Box::new(predicate));
    self
  }
}

impl<'b, C: ?Sized + Any + Send + Sync> Drop for BindingBuilder<'b, C> {
  fn drop(&mut self) {
    let source = self
      .source
      .take()
      .unwrap_or(BindingSource::Type { seal: None, info: None });
    let binding = Binding::new(
      TypeKey::of::<C>(),
      self.resolved,
      self.name.take(),
      self.lifetime,
      self.condition.take(),
      source,
    );
    self.binder.commit(binding);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::binding::BindingKind;

  #[test]
  fn bindings_commit_in_registration_order() {
    let binder = Binder::new();
    binder.bind::<u32>().to_value(1_u32);
    binder.bind::<u32>().to_value(2_u32).named("second");

    let bindings = binder.bindings_for(TypeId::of::<u32>());
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].name(), None);
    assert_eq!(bindings[1].name(), Some("second"));
    assert_eq!(bindings[0].kind(), BindingKind::Value);
  }

  #[test]
  fn unbind_variants_remove_expected_records() {
    let binder = Binder::new();
    binder.bind::<u32>().to_value(1_u32);
    binder.bind::<u32>().to_value(2_u32).named("keep");
    binder.bind::<String>().to_value("other".to_string());

    assert_eq!(binder.unbind_named::<u32>("keep"), 1);
    assert_eq!(binder.unbind::<u32>(), 1);
    assert_eq!(binder.len(), 1);

    let remaining = binder.all_bindings();
    assert!(binder.unbind_binding(&remaining[0]));
    assert!(binder.is_empty());
  }
}
