//! Binding records: the registered rule mapping a contract type to a way of
//! producing values.

use std::any::{Any, TypeId};
use std::fmt;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::context::InjectionContext;
use crate::core::{Instance, TypeKey};
use crate::error::ResolveError;
use crate::reflection::{SealFn, TypeInfo};

/// Whether a binding reuses one canonical instance or produces a new one per
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
  Singleton,
  Transient,
}

/// Discriminant of the binding kinds, for inspection tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
  Type,
  Value,
  Factory,
  Multiton,
}

pub(crate) type ConditionFn = Box<dyn Fn(&InjectionContext<'_>) -> bool + Send + Sync>;
pub(crate) type ProduceFn =
  Box<dyn Fn(&InjectionContext<'_>) -> Result<Box<dyn Any + Send + Sync>, ResolveError> + Send + Sync>;

/// How a binding produces values.
///
/// A closed sum: the resolver matches on the tag, so adding a kind is a
/// compile-visible change rather than a virtual-dispatch surprise.
pub(crate) enum BindingSource {
  /// Construct the resolved type through its cached reflection info.
  Type {
    /// Promotion from the concrete type to the contract; `None` means the
    /// contract is the concrete type and the info's own seal applies.
    seal: Option<SealFn>,
    /// Reflection provider, kept for cache pre-warming and lazy lookup.
    info: Option<fn() -> TypeInfo>,
  },
  /// Return a stored, already-shared value.
  Value { instance: Instance },
  /// Invoke a callback producing a fresh raw value, then run the standard
  /// post-creation pass on the product.
  Factory { produce: ProduceFn, seal: SealFn },
  /// Return an ordered list of pre-supplied values.
  Multiton { instances: Vec<Instance> },
}

/// A registered resolution rule.
///
/// Immutable after the builder commits it; the interior cells only
/// accumulate values the binding produces.
pub struct Binding {
  pub(crate) contract: TypeKey,
  pub(crate) resolved: TypeKey,
  pub(crate) name: Option<String>,
  pub(crate) lifetime: Lifetime,
  pub(crate) condition: Option<ConditionFn>,
  pub(crate) source: BindingSource,
  /// Canonical instance for singleton bindings.
  pub(crate) singleton: OnceCell<Instance>,
  /// Every value this binding has produced, in production order.
  pub(crate) produced: Mutex<Vec<Instance>>,
}

impl Binding {
  pub(crate) fn new(
    contract: TypeKey,
    resolved: TypeKey,
    name: Option<String>,
    lifetime: Lifetime,
    condition: Option<ConditionFn>,
    source: BindingSource,
  ) -> Self {
    // Value and multiton bindings own their instances from the start.
    let produced = match &source {
      BindingSource::Value { instance } => vec![instance.clone()],
      BindingSource::Multiton { instances } => instances.clone(),
      _ => Vec::new(),
    };
    Self {
      contract,
      resolved,
      name,
      lifetime,
      condition,
      source,
      singleton: OnceCell::new(),
      produced: Mutex::new(produced),
    }
  }

  pub fn contract(&self) -> TypeKey {
    self.contract
  }

  pub fn resolved(&self) -> TypeKey {
    self.resolved
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn lifetime(&self) -> Lifetime {
    self.lifetime
  }

  pub fn is_singleton(&self) -> bool {
    self.lifetime == Lifetime::Singleton
  }

  pub fn is_conditional(&self) -> bool {
    self.condition.is_some()
  }

  pub fn kind(&self) -> BindingKind {
    match self.source {
      BindingSource::Type { .. } => BindingKind::Type,
      BindingSource::Value { .. } => BindingKind::Value,
      BindingSource::Factory { .. } => BindingKind::Factory,
      BindingSource::Multiton { .. } => BindingKind::Multiton,
    }
  }

  /// Snapshot of the values this binding has produced so far.
  pub fn produced(&self) -> Vec<Instance> {
    self.produced.lock().clone()
  }

  pub(crate) fn record(&self, instance: &Instance) {
    self.produced.lock().push(instance.clone());
  }

  pub(crate) fn matches_name(&self, requested: Option<&str>) -> bool {
    self.name.as_deref() == requested
  }

  pub(crate) fn passes_condition(&self, ctx: &InjectionContext<'_>) -> bool {
    self.condition.as_ref().map_or(true, |condition| condition(ctx))
  }

  pub(crate) fn seal_fn(&self) -> Option<&SealFn> {
    match &self.source {
      BindingSource::Type { seal, .. } => seal.as_ref(),
      BindingSource::Factory { seal, .. } => Some(seal),
      _ => None,
    }
  }

  pub(crate) fn reflection_source(&self) -> Option<(TypeId, fn() -> TypeInfo)> {
    match &self.source {
      BindingSource::Type {
        info: Some(provider),
        ..
      } => Some((self.resolved.id(), *provider)),
      _ => None,
    }
  }
}

impl fmt::Debug for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Binding")
      .field("contract", &self.contract.name())
      .field("resolved", &self.resolved.name())
      .field("name", &self.name)
      .field("kind", &self.kind())
      .field("lifetime", &self.lifetime)
      .field("conditional", &self.condition.is_some())
      .finish()
  }
}
