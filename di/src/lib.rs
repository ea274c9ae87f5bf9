//! # Weft DI
//!
//! A flexible, dynamic dependency-injection runtime for Rust: a registry of
//! type bindings plus a resolution engine that builds object graphs on
//! demand, with extensibility hooks and reflective metadata caching.
//!
//! ## Core Concepts
//!
//! - **Container**: an independent resolution domain combining binding
//!   storage, the resolver, the reflection cache, and the extension
//!   pipeline. Containers are created and passed explicitly; there is no
//!   global registry.
//! - **Binding**: a rule mapping a contract type (plus an optional
//!   identifier) to a way of producing values: a constructed type, a stored
//!   value, a factory, or a list of instances. Several bindings may serve
//!   one contract; `condition` predicates select among them per request.
//! - **Resolution**: [`Container::resolve`] and [`Container::resolve_all`]
//!   find matching bindings and produce values, recursively constructing
//!   constructor dependencies and filling member injection points.
//! - **Injection points**: types declare their constructor parameters and
//!   members through [`Injectable`], usually via the [`injectable!`] macro.
//! - **Extensions**: ordered interceptors around resolution and injection,
//!   registered per container.
//!
//! ## Quick Start
//!
//! ```
//! use weft_di::{injectable, provides, resolve, Container};
//! use std::sync::Arc;
//!
//! // Define a trait and a concrete implementation.
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter;
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     "Hello, World!".to_string()
//!   }
//! }
//!
//! injectable!(EnglishGreeter { new() => EnglishGreeter; });
//! provides!(EnglishGreeter: dyn Greeter);
//!
//! // A service that depends on the abstraction, not the implementation.
//! struct Announcer {
//!   greeter: Arc<dyn Greeter>,
//! }
//!
//! injectable!(Announcer {
//!   new(greeter: dyn Greeter) => Announcer { greeter };
//! });
//!
//! let container = Container::new();
//! container.bind::<dyn Greeter>().to::<EnglishGreeter>().as_singleton();
//! container.bind::<Announcer>().to_self();
//!
//! let announcer = resolve!(container, Announcer);
//! assert_eq!(announcer.greeter.greet(), "Hello, World!");
//! ```
//!
//! ## Concurrency
//!
//! Resolution is synchronous and re-entrant on the calling thread. The
//! container's storage is internally consistent under concurrent access,
//! but interleaving registration and resolution from several threads is
//! order-dependent; serialize access to a container when determinism
//! matters. Distinct containers are fully independent.

mod binder;
mod binding;
mod container;
mod context;
mod core;
mod error;
mod extension;
mod injector;
mod macros;
mod reflection;

pub use binder::{Binder, BindingBuilder};
pub use binding::{Binding, BindingKind, Lifetime};
pub use container::{Container, ContainerBuilder, ContainerId};
pub use context::{InjectionContext, PointKind};
pub use self::core::{Instance, InjectionKey, ProvideAs, TypeKey};
pub use error::ResolveError;
pub use extension::{ContainerExtension, ExtensionPipeline, Flow};
pub use injector::{Injector, ResolutionMode};
pub use reflection::{
  ConstructorInfo, Injectable, InjectionPoint, MemberInfo, ReflectionCache, ResolvedArgs,
  TypeInfo, TypeInfoBuilder,
};
