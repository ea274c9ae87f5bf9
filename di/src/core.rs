//! Core identity and value-erasure primitives shared across the engine.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::ResolveError;

thread_local! {
  // The ordered list of keys currently being constructed on this thread.
  // Guard creation consults it to detect circular dependencies.
  static RESOLVING_STACK: RefCell<Vec<InjectionKey>> = RefCell::new(Vec::new());
}

/// Identity of a type as the engine sees it: the `TypeId` plus the human
/// readable type name carried along for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: type_name::<T>(),
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// A resolution request: the contract type plus the optional identifier.
///
/// Identifiers use value equality. An unnamed binding only matches an
/// unnamed request, and a named binding only matches a request carrying an
/// equal identifier.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InjectionKey {
  pub(crate) type_key: TypeKey,
  pub(crate) name: Option<String>,
}

impl InjectionKey {
  pub fn new<T: ?Sized + Any>() -> Self {
    Self {
      type_key: TypeKey::of::<T>(),
      name: None,
    }
  }

  pub fn new_with_name<T: ?Sized + Any>(name: &str) -> Self {
    Self {
      type_key: TypeKey::of::<T>(),
      name: Some(name.to_owned()),
    }
  }

  pub(crate) fn from_parts(type_key: TypeKey, name: Option<String>) -> Self {
    Self { type_key, name }
  }

  pub fn type_key(&self) -> TypeKey {
    self.type_key
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }
}

impl fmt::Debug for InjectionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "Key({}, Name({}))", self.type_key.name(), name),
      None => write!(f, "Key({})", self.type_key.name()),
    }
  }
}

/// A type-erased, shareable resolved value.
///
/// The payload holds an `Arc<T>` for the contract type the value was
/// produced under, so an `Instance` can be cloned into value lists,
/// singleton cells, and extension hooks without knowing `T`.
#[derive(Clone)]
pub struct Instance {
  payload: Arc<dyn Any + Send + Sync>,
  contract: TypeKey,
}

impl Instance {
  /// Wraps an already-shared value.
  pub fn new<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      payload: Arc::new(value),
      contract: TypeKey::of::<T>(),
    }
  }

  /// Recovers the strongly-typed shared value. Returns `None` if `T` is not
  /// the contract type this instance was produced under.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.payload.downcast_ref::<Arc<T>>().cloned()
  }

  /// The contract type this instance was produced under.
  pub fn contract(&self) -> TypeKey {
    self.contract
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Instance({})", self.contract.name())
  }
}

/// Promotes a shared concrete value into one of the contract types it
/// serves.
///
/// Every type trivially provides itself. Implementations for trait-object
/// contracts are generated with the [`provides!`](crate::provides) macro,
/// which is where the unsizing coercion is spelled out.
pub trait ProvideAs<C: ?Sized + Any + Send + Sync>: Any + Send + Sync {
  /// Converts a shared `Self` into a shared contract value.
  fn promote(this: Arc<Self>) -> Arc<C>;
}

impl<T: Any + Send + Sync> ProvideAs<T> for T {
  fn promote(this: Arc<Self>) -> Arc<T> {
    this
  }
}

/// An RAII guard tracking in-flight constructions on the current thread.
///
/// Creation fails with [`ResolveError::CircularDependency`] when the key is
/// already on the stack; dropping the guard pops it again.
pub(crate) struct ResolutionGuard {
  key: InjectionKey,
}

impl ResolutionGuard {
  pub(crate) fn enter(key: InjectionKey) -> Result<Self, ResolveError> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if stack.contains(&key) {
        let chain = stack
          .iter()
          .map(|entry| entry.type_key.name())
          .chain(std::iter::once(key.type_key.name()))
          .collect::<Vec<_>>()
          .join(" -> ");
        return Err(ResolveError::CircularDependency {
          key: format!("{:?}", key),
          chain,
        });
      }
      stack.push(key.clone());
      Ok(())
    })?;
    Ok(Self { key })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(position) = stack.iter().rposition(|entry| entry == &self.key) {
        stack.remove(position);
      }
    });
  }
}
