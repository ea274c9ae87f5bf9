//! The reflective metadata side-table: per-type injection point
//! descriptions and the cache that memoizes them.
//!
//! Rust has no runtime reflection, so types declare their own injection
//! points by implementing [`Injectable`] (usually through the
//! [`injectable!`](crate::injectable) macro). The engine only ever consumes
//! the resulting [`TypeInfo`]; how the declaration was produced is
//! irrelevant to it.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;

use crate::binder::Binder;
use crate::context::PointKind;
use crate::core::{Instance, TypeKey};
use crate::error::ResolveError;

pub(crate) type BuildFn =
  Box<dyn Fn(&ResolvedArgs) -> Result<Box<dyn Any + Send + Sync>, ResolveError> + Send + Sync>;
pub(crate) type ApplyFn =
  Box<dyn Fn(&mut (dyn Any + Send + Sync), &ResolvedArgs) -> Result<(), ResolveError> + Send + Sync>;
pub(crate) type SealFn =
  Box<dyn Fn(Box<dyn Any + Send + Sync>) -> Result<Instance, ResolveError> + Send + Sync>;

/// Declares a type's injection points to the engine — the Rust rendition of
/// a reflective injection marker.
pub trait Injectable: Any + Send + Sync + Sized {
  /// The full injection-point description for `Self`.
  fn type_info() -> TypeInfo;
}

/// A single declared dependency: the target type plus an optional
/// identifier.
#[derive(Clone, Debug)]
pub struct InjectionPoint {
  pub(crate) target: TypeKey,
  pub(crate) name: Option<String>,
}

impl InjectionPoint {
  /// Declares a dependency on `T`, optionally under an identifier.
  pub fn of<T: ?Sized + Any + Send + Sync>(name: Option<&str>) -> Self {
    Self {
      target: TypeKey::of::<T>(),
      name: name.map(str::to_owned),
    }
  }

  pub fn target(&self) -> TypeKey {
    self.target
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }
}

/// Resolved values for the points of a constructor or method, in
/// declaration order.
pub struct ResolvedArgs {
  values: Vec<Instance>,
}

impl ResolvedArgs {
  pub(crate) fn new(values: Vec<Instance>) -> Self {
    Self { values }
  }

  /// Recovers argument `index` as `Arc<T>`.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, ResolveError> {
    let value = self
      .values
      .get(index)
      .ok_or_else(|| ResolveError::TypeMismatch {
        expected: type_name::<T>(),
        context: format!("argument {index} (out of range)"),
      })?;
    value.downcast::<T>().ok_or_else(|| ResolveError::TypeMismatch {
      expected: type_name::<T>(),
      context: format!("argument {index} (got `{}`)", value.contract().name()),
    })
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// The constructor injection point of a type.
pub struct ConstructorInfo {
  pub(crate) params: Vec<InjectionPoint>,
  pub(crate) build: BuildFn,
}

impl ConstructorInfo {
  pub fn params(&self) -> &[InjectionPoint] {
    &self.params
  }
}

/// A post-construction member injection point.
pub struct MemberInfo {
  pub(crate) name: &'static str,
  pub(crate) kind: PointKind,
  pub(crate) points: Vec<InjectionPoint>,
  pub(crate) apply: ApplyFn,
}

impl MemberInfo {
  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn kind(&self) -> PointKind {
    self.kind
  }

  pub fn points(&self) -> &[InjectionPoint] {
    &self.points
  }
}

/// Everything the engine knows about one concrete type: its constructor
/// parameters and member injection points, with type-erased closures to
/// build, fill, and share instances of it.
///
/// A type with no injection points is a valid, empty `TypeInfo`.
pub struct TypeInfo {
  pub(crate) key: TypeKey,
  pub(crate) constructor: Option<ConstructorInfo>,
  pub(crate) members: Vec<MemberInfo>,
  pub(crate) priority: i32,
  pub(crate) seal: SealFn,
}

impl TypeInfo {
  /// Starts describing type `S`.
  pub fn builder<S: Any + Send + Sync>() -> TypeInfoBuilder<S> {
    TypeInfoBuilder {
      constructor: None,
      members: Vec::new(),
      priority: 0,
      _marker: PhantomData,
    }
  }

  /// An empty description of `S`: no constructor, no members.
  pub fn of<S: Any + Send + Sync>() -> TypeInfo {
    Self::builder::<S>().build()
  }

  pub fn key(&self) -> TypeKey {
    self.key
  }

  pub fn constructor(&self) -> Option<&ConstructorInfo> {
    self.constructor.as_ref()
  }

  pub fn members(&self) -> &[MemberInfo] {
    &self.members
  }

  /// Relative ordering priority for batch setup routines. The core
  /// resolver ignores it; discovery layers order their sweeps by it.
  pub fn priority(&self) -> i32 {
    self.priority
  }
}

impl fmt::Debug for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TypeInfo")
      .field("type", &self.key.name())
      .field(
        "constructor_params",
        &self.constructor.as_ref().map_or(0, |ctor| ctor.params.len()),
      )
      .field("members", &self.members.len())
      .finish()
  }
}

/// Fluent builder for [`TypeInfo`], parameterized on the described type.
pub struct TypeInfoBuilder<S> {
  constructor: Option<ConstructorInfo>,
  members: Vec<MemberInfo>,
  priority: i32,
  _marker: PhantomData<fn() -> S>,
}

impl<S: Any + Send + Sync> TypeInfoBuilder<S> {
  /// Declares the constructor: ordered parameter points and a build closure
  /// receiving the resolved arguments.
  pub fn constructor(
    mut self,
    params: Vec<InjectionPoint>,
    build: impl Fn(&ResolvedArgs) -> Result<S, ResolveError> + Send + Sync + 'static,
  ) -> Self {
    self.constructor = Some(ConstructorInfo {
      params,
      build: Box::new(move |args| {
        build(args).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
      }),
    });
    self
  }

  /// Declares a field point, assigned from a single resolved dependency.
  pub fn field<M: ?Sized + Any + Send + Sync>(
    mut self,
    name: &'static str,
    identifier: Option<&str>,
    assign: impl Fn(&mut S, Arc<M>) + Send + Sync + 'static,
  ) -> Self {
    let point = InjectionPoint::of::<M>(identifier);
    self.members.push(MemberInfo {
      name,
      kind: PointKind::Field,
      points: vec![point],
      apply: Box::new(move |target, args| {
        let value = args.get::<M>(0)?;
        let target = target
          .downcast_mut::<S>()
          .ok_or_else(|| ResolveError::TypeMismatch {
            expected: type_name::<S>(),
            context: format!("field `{name}`"),
          })?;
        assign(target, value);
        Ok(())
      }),
    });
    self
  }

  /// Declares a method point, invoked with all of its resolved arguments.
  pub fn method(
    mut self,
    name: &'static str,
    points: Vec<InjectionPoint>,
    invoke: impl Fn(&mut S, &ResolvedArgs) -> Result<(), ResolveError> + Send + Sync + 'static,
  ) -> Self {
    self.members.push(MemberInfo {
      name,
      kind: PointKind::Method,
      points,
      apply: Box::new(move |target, args| {
        let target = target
          .downcast_mut::<S>()
          .ok_or_else(|| ResolveError::TypeMismatch {
            expected: type_name::<S>(),
            context: format!("method `{name}`"),
          })?;
        invoke(target, args)
      }),
    });
    self
  }

  /// Sets the relative ordering priority carried for batch setup sweeps.
  pub fn priority(mut self, priority: i32) -> Self {
    self.priority = priority;
    self
  }

  /// Finishes the description.
  pub fn build(self) -> TypeInfo {
    TypeInfo {
      key: TypeKey::of::<S>(),
      constructor: self.constructor,
      members: self.members,
      priority: self.priority,
      seal: Box::new(|raw| {
        let concrete = raw.downcast::<S>().map_err(|_| ResolveError::TypeMismatch {
          expected: type_name::<S>(),
          context: "sealing a constructed instance".to_owned(),
        })?;
        Ok(Instance::new::<S>(Arc::new(*concrete)))
      }),
    }
  }
}

/// Memoizes [`TypeInfo`] per concrete type.
///
/// Information is computed once on first use (cache-on-miss) and reused for
/// every later resolution. Eviction affects future resolutions only; object
/// graphs built earlier remain valid.
#[derive(Default)]
pub struct ReflectionCache {
  entries: DashMap<TypeId, Arc<TypeInfo>>,
}

impl ReflectionCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Introspects `T` once and stores the result. Re-registering a cached
  /// type is a no-op.
  pub fn register<T: Injectable>(&self) {
    self
      .entries
      .entry(TypeId::of::<T>())
      .or_insert_with(|| Arc::new(T::type_info()));
  }

  /// Cached info for `T`, computing it on a miss.
  pub fn info<T: Injectable>(&self) -> Arc<TypeInfo> {
    self.register::<T>();
    // A racing `remove` between the two calls simply recomputes here.
    match self.entries.get(&TypeId::of::<T>()) {
      Some(entry) => entry.value().clone(),
      None => Arc::new(T::type_info()),
    }
  }

  /// Cached info by runtime type id; never computes.
  pub fn get(&self, type_id: TypeId) -> Option<Arc<TypeInfo>> {
    self.entries.get(&type_id).map(|entry| entry.value().clone())
  }

  /// Existence check without side effects.
  pub fn contains(&self, type_id: TypeId) -> bool {
    self.entries.contains_key(&type_id)
  }

  /// Evicts a type, returning whether it was cached.
  pub fn remove(&self, type_id: TypeId) -> bool {
    self.entries.remove(&type_id).is_some()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Pre-warms the cache for every binding in `binder` that carries a
  /// reflection source, avoiding first-resolution latency on hot paths.
  pub fn warm_from_binder(&self, binder: &Binder) {
    for binding in binder.all_bindings() {
      if let Some((type_id, provider)) = binding.reflection_source() {
        self.entries.entry(type_id).or_insert_with(|| Arc::new(provider()));
      }
    }
  }

  pub(crate) fn ensure(&self, type_id: TypeId, provider: fn() -> TypeInfo) -> Arc<TypeInfo> {
    self
      .entries
      .entry(type_id)
      .or_insert_with(|| Arc::new(provider()))
      .value()
      .clone()
  }
}

impl fmt::Debug for ReflectionCache {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ReflectionCache")
      .field("types", &self.entries.len())
      .finish()
  }
}
