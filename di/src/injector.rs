//! The resolver: binding lookup, conditional matching, recursive
//! construction, and member injection.

use std::any::{type_name, Any};
use std::sync::Arc;

use tracing::{trace, warn};

use crate::binder::Binder;
use crate::binding::{Binding, BindingSource};
use crate::context::{InjectionContext, PointKind};
use crate::core::{Instance, InjectionKey, ResolutionGuard};
use crate::error::ResolveError;
use crate::extension::ExtensionPipeline;
use crate::reflection::{Injectable, ReflectionCache, ResolvedArgs, TypeInfo};

/// Container-wide policy for requests with no matching binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMode {
  /// Fall back to direct construction of the requested type through its
  /// cached reflection info — an implicit self-binding.
  #[default]
  AlwaysResolve,
  /// Return an explicit empty result instead.
  BoundOnly,
}

/// The resolution engine of one container.
///
/// Resolution completes synchronously on the calling thread; recursion into
/// dependency construction happens inline with no suspension points. No
/// lock is held across recursion, so extension hooks and factories may
/// re-enter the engine freely.
pub struct Injector {
  binder: Arc<Binder>,
  cache: Arc<ReflectionCache>,
  extensions: Arc<ExtensionPipeline>,
  mode: ResolutionMode,
}

impl Injector {
  pub(crate) fn new(
    binder: Arc<Binder>,
    cache: Arc<ReflectionCache>,
    extensions: Arc<ExtensionPipeline>,
    mode: ResolutionMode,
  ) -> Self {
    Self {
      binder,
      cache,
      extensions,
      mode,
    }
  }

  pub fn mode(&self) -> ResolutionMode {
    self.mode
  }

  // --- public resolution surface ---

  /// Resolves a single value for `T`.
  ///
  /// `Ok(None)` means no binding matched under
  /// [`ResolutionMode::BoundOnly`]. When several bindings survive matching,
  /// the first registered wins (deterministically) and a warning is logged.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self) -> Result<Option<Arc<T>>, ResolveError> {
    self.resolve_single::<T>(None)
  }

  /// Resolves a single value registered under `name`.
  pub fn resolve_named<T: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
  ) -> Result<Option<Arc<T>>, ResolveError> {
    self.resolve_single::<T>(Some(name))
  }

  /// Resolves every matching binding for `T`, in registration order.
  pub fn resolve_all<T: ?Sized + Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>, ResolveError> {
    self.resolve_many::<T>(None)
  }

  /// Resolves every matching binding for `T` registered under `name`.
  pub fn resolve_all_named<T: ?Sized + Any + Send + Sync>(
    &self,
    name: &str,
  ) -> Result<Vec<Arc<T>>, ResolveError> {
    self.resolve_many::<T>(Some(name))
  }

  /// Member-injects an externally-owned object: only the member pass runs,
  /// construction stays with the caller.
  pub fn inject<T: Injectable>(&self, target: &mut T) -> Result<(), ResolveError> {
    let info = self.cache.info::<T>();
    trace!(target_type = info.key().name(), "member-injecting external instance");
    if self.extensions.before_injection(&info, &*target) {
      self.apply_members(&info, &mut *target)?;
    }
    self.extensions.after_injection(&info, &*target);
    Ok(())
  }

  /// Constructs `T` directly through its reflection info, ignoring
  /// bindings. The product is not recorded in any binding.
  pub fn construct<T: Injectable>(&self) -> Result<Arc<T>, ResolveError> {
    let key = InjectionKey::new::<T>();
    let _guard = ResolutionGuard::enter(key.clone())?;
    let ctx = InjectionContext::root(&key);
    let info = self.cache.info::<T>();
    let raw = self.build_raw(&info, &ctx)?;
    let instance = self.finish_raw(None, raw, &ctx)?;
    instance
      .downcast::<T>()
      .ok_or_else(|| ResolveError::TypeMismatch {
        expected: type_name::<T>(),
        context: "direct construction".to_owned(),
      })
  }

  fn resolve_single<T: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
  ) -> Result<Option<Arc<T>>, ResolveError> {
    let key = Self::key_for::<T>(name);
    let ctx = InjectionContext::root(&key);
    let results = self.resolve_request(&key, &ctx)?;
    if results.len() > 1 {
      warn!(
        request = ?key,
        candidates = results.len(),
        "multiple values matched a single-value request; using the first registered"
      );
    }
    match results.into_iter().next() {
      None => Ok(None),
      Some(instance) => {
        let typed = instance
          .downcast::<T>()
          .ok_or_else(|| ResolveError::TypeMismatch {
            expected: type_name::<T>(),
            context: format!("result of {:?}", key),
          })?;
        Ok(Some(typed))
      }
    }
  }

  fn resolve_many<T: ?Sized + Any + Send + Sync>(
    &self,
    name: Option<&str>,
  ) -> Result<Vec<Arc<T>>, ResolveError> {
    let key = Self::key_for::<T>(name);
    let ctx = InjectionContext::root(&key);
    let results = self.resolve_request(&key, &ctx)?;
    let mut typed = Vec::with_capacity(results.len());
    for instance in results {
      typed.push(
        instance
          .downcast::<T>()
          .ok_or_else(|| ResolveError::TypeMismatch {
            expected: type_name::<T>(),
            context: format!("result of {:?}", key),
          })?,
      );
    }
    Ok(typed)
  }

  fn key_for<T: ?Sized + Any>(name: Option<&str>) -> InjectionKey {
    match name {
      Some(name) => InjectionKey::new_with_name::<T>(name),
      None => InjectionKey::new::<T>(),
    }
  }

  // --- core algorithm ---

  /// One full request: extension interception, candidate matching,
  /// per-binding production, post-processing. Results come back in
  /// registration order.
  pub(crate) fn resolve_request(
    &self,
    key: &InjectionKey,
    ctx: &InjectionContext<'_>,
  ) -> Result<Vec<Instance>, ResolveError> {
    if let Some(instance) = self.extensions.before_resolution(key, ctx) {
      let mut results = vec![instance];
      self.extensions.after_resolution(key, &mut results);
      return Ok(results);
    }

    let candidates: Vec<Arc<Binding>> = self
      .binder
      .bindings_for(key.type_key().id())
      .into_iter()
      .filter(|binding| binding.matches_name(key.name()))
      .filter(|binding| binding.passes_condition(ctx))
      .collect();

    let mut results = Vec::with_capacity(candidates.len());
    if candidates.is_empty() {
      match self.mode {
        ResolutionMode::BoundOnly => {
          trace!(request = ?key, "no binding matched; returning empty result");
        }
        ResolutionMode::AlwaysResolve => {
          results.push(self.construct_unbound(key, ctx)?);
        }
      }
    } else {
      for binding in &candidates {
        self.resolve_binding(binding, ctx, &mut results)?;
      }
    }

    self.extensions.after_resolution(key, &mut results);
    Ok(results)
  }

  /// Produces instances for one selected binding into `out`.
  fn resolve_binding(
    &self,
    binding: &Arc<Binding>,
    ctx: &InjectionContext<'_>,
    out: &mut Vec<Instance>,
  ) -> Result<(), ResolveError> {
    match &binding.source {
      BindingSource::Value { instance } => {
        out.push(instance.clone());
        Ok(())
      }
      BindingSource::Multiton { instances } => {
        out.extend(instances.iter().cloned());
        Ok(())
      }
      BindingSource::Type { .. } | BindingSource::Factory { .. } => {
        if let Some(instance) = binding.singleton.get() {
          out.push(instance.clone());
          return Ok(());
        }
        // The guard must exist before the singleton cell is entered, so a
        // cyclic graph surfaces as an error instead of a deadlock.
        let _guard = ResolutionGuard::enter(Self::guard_key(binding))?;
        if binding.is_singleton() {
          let canonical = binding.singleton.get_or_try_init(|| {
            let instance = self.instantiate(binding, ctx)?;
            binding.record(&instance);
            Ok::<_, ResolveError>(instance)
          })?;
          out.push(canonical.clone());
        } else {
          let instance = self.instantiate(binding, ctx)?;
          binding.record(&instance);
          out.push(instance);
        }
        Ok(())
      }
    }
  }

  /// Cycle-guard identity for a construction: the concrete type for TYPE
  /// bindings, the contract for factories (whose products are opaque).
  fn guard_key(binding: &Binding) -> InjectionKey {
    let type_key = match &binding.source {
      BindingSource::Type { .. } => binding.resolved,
      _ => binding.contract,
    };
    InjectionKey::from_parts(type_key, binding.name.clone())
  }

  /// Default instantiation for TYPE and FACTORY bindings, with the
  /// before-instantiation interception point.
  fn instantiate(
    &self,
    binding: &Arc<Binding>,
    ctx: &InjectionContext<'_>,
  ) -> Result<Instance, ResolveError> {
    let raw = match self.extensions.before_instantiation(binding, ctx) {
      Some(substitute) => {
        trace!(
          contract = binding.contract().name(),
          "instantiation substituted by extension"
        );
        substitute
      }
      None => match &binding.source {
        BindingSource::Type { .. } => {
          let info = self.info_for_binding(binding)?;
          trace!(resolved = binding.resolved().name(), "constructing");
          self.build_raw(&info, ctx)?
        }
        BindingSource::Factory { produce, .. } => {
          trace!(contract = binding.contract().name(), "invoking factory");
          produce(ctx)?
        }
        // Value and multiton bindings never reach instantiation.
        BindingSource::Value { .. } | BindingSource::Multiton { .. } => {
          return Err(ResolveError::construction(
            binding.contract().name(),
            "binding kind does not instantiate",
          ));
        }
      },
    };
    self.finish_raw(Some(binding), raw, ctx)
  }

  /// Implicit self-binding: direct construction of the requested type via
  /// its cached reflection info.
  fn construct_unbound(
    &self,
    key: &InjectionKey,
    ctx: &InjectionContext<'_>,
  ) -> Result<Instance, ResolveError> {
    let type_key = key.type_key();
    let info = self.cache.get(type_key.id()).ok_or_else(|| {
      ResolveError::construction(
        type_key.name(),
        "no binding matched and the type is not in the reflection cache",
      )
    })?;
    let _guard = ResolutionGuard::enter(key.clone())?;
    trace!(target_type = type_key.name(), "implicit self-construction");
    let raw = self.build_raw(&info, ctx)?;
    self.finish_raw(None, raw, ctx)
  }

  /// Resolves constructor parameters and builds the raw object.
  ///
  /// Constructor dependencies are mandatory: an empty result for any
  /// parameter aborts the construction.
  fn build_raw(
    &self,
    info: &TypeInfo,
    _ctx: &InjectionContext<'_>,
  ) -> Result<Box<dyn Any + Send + Sync>, ResolveError> {
    let ctor = info.constructor().ok_or_else(|| {
      ResolveError::construction(info.key().name(), "no injectable constructor declared")
    })?;
    let mut args = Vec::with_capacity(ctor.params().len());
    for point in ctor.params() {
      let child_key = InjectionKey::from_parts(point.target(), point.name().map(str::to_owned));
      let child_ctx = InjectionContext {
        requested: &child_key,
        member: Some(PointKind::Constructor),
        member_name: None,
        parent_type: Some(info.key()),
        parent: None,
      };
      let mut resolved = self.resolve_request(&child_key, &child_ctx)?;
      if resolved.is_empty() {
        return Err(ResolveError::construction(
          info.key().name(),
          format!("constructor dependency `{}` is unresolved", point.target().name()),
        ));
      }
      args.push(resolved.remove(0));
    }
    let args = ResolvedArgs::new(args);
    (ctor.build)(&args)
  }

  /// Post-creation pass shared by every construction path: extension
  /// mutation, member injection keyed off the raw object's runtime type,
  /// sealing into a shared instance.
  fn finish_raw(
    &self,
    binding: Option<&Arc<Binding>>,
    mut raw: Box<dyn Any + Send + Sync>,
    ctx: &InjectionContext<'_>,
  ) -> Result<Instance, ResolveError> {
    if let Some(binding) = binding {
      self.extensions.after_instantiation(binding, raw.as_mut(), ctx);
    }
    // Keying off the runtime type means factory products and extension
    // substitutes get the same member pass as constructed objects.
    let runtime_id = raw.as_ref().type_id();
    let info = self.cache.get(runtime_id).or_else(|| {
      binding
        .and_then(|binding| binding.reflection_source())
        .filter(|(type_id, _)| *type_id == runtime_id)
        .map(|(type_id, provider)| self.cache.ensure(type_id, provider))
    });
    if let Some(info) = &info {
      if self.extensions.before_injection(info, raw.as_ref()) {
        self.apply_members(info, raw.as_mut())?;
      }
      self.extensions.after_injection(info, raw.as_ref());
    }
    match binding.and_then(|binding| binding.seal_fn()) {
      Some(seal) => seal(raw),
      None => {
        let info = info.ok_or_else(|| {
          let name = binding.map_or("<unbound type>", |binding| binding.resolved().name());
          ResolveError::construction(name, "cannot share an instance with no reflection info")
        })?;
        (info.seal)(raw)
      }
    }
  }

  /// Fills every member injection point of `target`.
  ///
  /// Members are optional: a point whose resolution comes back empty is
  /// skipped, leaving whatever the constructor put there.
  fn apply_members(
    &self,
    info: &TypeInfo,
    target: &mut (dyn Any + Send + Sync),
  ) -> Result<(), ResolveError> {
    for member in info.members() {
      let mut args = Vec::with_capacity(member.points().len());
      let mut satisfied = true;
      for point in member.points() {
        let child_key = InjectionKey::from_parts(point.target(), point.name().map(str::to_owned));
        let child_ctx = InjectionContext {
          requested: &child_key,
          member: Some(member.kind()),
          member_name: Some(member.name()),
          parent_type: Some(info.key()),
          parent: Some(&*target),
        };
        let mut resolved = self.resolve_request(&child_key, &child_ctx)?;
        if resolved.is_empty() {
          satisfied = false;
          break;
        }
        args.push(resolved.remove(0));
      }
      if !satisfied {
        trace!(
          member = member.name(),
          "member injection point unresolved; leaving default"
        );
        continue;
      }
      let args = ResolvedArgs::new(args);
      (member.apply)(&mut *target, &args)?;
    }
    Ok(())
  }

  fn info_for_binding(&self, binding: &Binding) -> Result<Arc<TypeInfo>, ResolveError> {
    if let Some(info) = self.cache.get(binding.resolved().id()) {
      return Ok(info);
    }
    if let Some((type_id, provider)) = binding.reflection_source() {
      return Ok(self.cache.ensure(type_id, provider));
    }
    Err(ResolveError::construction(
      binding.resolved().name(),
      "type binding has no reflection info; bind with `to`/`to_self` or register the type",
    ))
  }
}
