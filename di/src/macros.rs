//! Public macros for ergonomic declaration and resolution.

/// Resolves a required service from an explicit container.
///
/// This is the primary way to get dependencies that must be present. It
/// panics when the service cannot be resolved; for a non-panicking version
/// use [`Container::resolve`](crate::Container::resolve) directly.
///
/// # Panics
///
/// Panics when no binding matches (under `BoundOnly` mode) or resolution
/// fails.
///
/// # Examples
///
/// ```
/// use weft_di::{resolve, Container};
///
/// let container = Container::new();
/// container.bind::<String>().to_value(String::from("hello"));
///
/// let message = resolve!(container, String);
/// assert_eq!(*message, "hello");
/// ```
///
/// ```
/// use weft_di::{injectable, provides, resolve, Container};
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter {
///   fn greet(&self) -> String { "Hello!".to_string() }
/// }
/// injectable!(EnglishGreeter { new() => EnglishGreeter; });
/// provides!(EnglishGreeter: dyn Greeter);
///
/// let container = Container::new();
/// container.bind::<dyn Greeter>().to::<EnglishGreeter>().as_singleton();
///
/// let greeter = resolve!(container, trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
  // Arm for resolving a concrete type: resolve!(container, MyService)
  ($container:expr, $type:ty) => {
    match $container.resolve::<$type>() {
      Ok(Some(value)) => value,
      Ok(None) => panic!(
        "Failed to resolve required service: {}",
        std::any::type_name::<$type>()
      ),
      Err(err) => panic!(
        "Failed to resolve required service {}: {}",
        std::any::type_name::<$type>(),
        err
      ),
    }
  };

  // Arm for resolving a named concrete type: resolve!(container, MyService, "name")
  ($container:expr, $type:ty, $name:expr) => {
    match $container.resolve_named::<$type>($name) {
      Ok(Some(value)) => value,
      Ok(None) => panic!(
        "Failed to resolve required service with name '{}': {}",
        $name,
        std::any::type_name::<$type>()
      ),
      Err(err) => panic!(
        "Failed to resolve required service with name '{}' {}: {}",
        $name,
        std::any::type_name::<$type>(),
        err
      ),
    }
  };

  // Arm for resolving a trait object: resolve!(container, trait MyTrait)
  ($container:expr, trait $trait_ident:ident) => {
    match $container.resolve::<dyn $trait_ident>() {
      Ok(Some(value)) => value,
      Ok(None) => panic!(
        "Failed to resolve required trait service: {}",
        std::any::type_name::<dyn $trait_ident>()
      ),
      Err(err) => panic!(
        "Failed to resolve required trait service {}: {}",
        std::any::type_name::<dyn $trait_ident>(),
        err
      ),
    }
  };

  // Arm for resolving a named trait object: resolve!(container, trait MyTrait, "name")
  ($container:expr, trait $trait_ident:ident, $name:expr) => {
    match $container.resolve_named::<dyn $trait_ident>($name) {
      Ok(Some(value)) => value,
      Ok(None) => panic!(
        "Failed to resolve required trait service with name '{}': {}",
        $name,
        std::any::type_name::<dyn $trait_ident>()
      ),
      Err(err) => panic!(
        "Failed to resolve required trait service with name '{}' {}: {}",
        $name,
        std::any::type_name::<dyn $trait_ident>(),
        err
      ),
    }
  };
}

/// Declares a type's injection points, generating its
/// [`Injectable`](crate::Injectable) impl.
///
/// Constructor parameters and member dependencies arrive as `Arc<T>`; an
/// optional `@ "identifier"` after a name requests the binding registered
/// under that identifier.
///
/// # Examples
///
/// ```
/// use weft_di::{injectable, resolve, Container};
///
/// struct AppConfig { database_url: String }
/// injectable!(AppConfig {
///   new() => AppConfig { database_url: "postgres://localhost/db".to_string() };
/// });
///
/// struct Database { url: String }
/// injectable!(Database {
///   new(config: AppConfig) => Database { url: config.database_url.clone() };
/// });
///
/// let container = Container::new();
/// container.bind::<AppConfig>().to_self().as_singleton();
/// container.bind::<Database>().to_self();
///
/// let db = resolve!(container, Database);
/// assert_eq!(db.url, "postgres://localhost/db");
/// ```
#[macro_export]
macro_rules! injectable {
  // Constructor plus optional field and method points.
  (
    $ty:ty {
      new ( $( $param:ident $(@ $pid:literal)? : $pty:ty ),* $(,)? ) => $body:expr;
      $( field $fname:ident $(@ $fid:literal)? : $fty:ty => $assign:expr; )*
      $( method $mname:ident ( $( $mparam:ident $(@ $mpid:literal)? : $mpty:ty ),* $(,)? ) => $invoke:expr; )*
    }
  ) => {
    impl $crate::Injectable for $ty {
      fn type_info() -> $crate::TypeInfo {
        $crate::TypeInfo::builder::<Self>()
          .constructor(
            vec![ $( $crate::InjectionPoint::of::<$pty>($crate::__identifier!($($pid)?)) ),* ],
            |args| {
              #[allow(unused_mut)]
              let mut index = 0usize;
              $(
                let $param: ::std::sync::Arc<$pty> = args.get(index)?;
                index += 1;
              )*
              let _ = index;
              Ok($body)
            },
          )
          $( .field::<$fty>(stringify!($fname), $crate::__identifier!($($fid)?), $assign) )*
          $( .method(
            stringify!($mname),
            vec![ $( $crate::InjectionPoint::of::<$mpty>($crate::__identifier!($($mpid)?)) ),* ],
            |target, args| {
              #[allow(unused_mut)]
              let mut index = 0usize;
              $(
                let $mparam: ::std::sync::Arc<$mpty> = args.get(index)?;
                index += 1;
              )*
              let _ = index;
              ($invoke)(target, $( $mparam ),*);
              Ok(())
            },
          ) )*
          .build()
      }
    }
  };

  // Member points only; construction stays with the caller (`inject`).
  (
    $ty:ty {
      $( field $fname:ident $(@ $fid:literal)? : $fty:ty => $assign:expr; )*
      $( method $mname:ident ( $( $mparam:ident $(@ $mpid:literal)? : $mpty:ty ),* $(,)? ) => $invoke:expr; )*
    }
  ) => {
    impl $crate::Injectable for $ty {
      fn type_info() -> $crate::TypeInfo {
        $crate::TypeInfo::builder::<Self>()
          $( .field::<$fty>(stringify!($fname), $crate::__identifier!($($fid)?), $assign) )*
          $( .method(
            stringify!($mname),
            vec![ $( $crate::InjectionPoint::of::<$mpty>($crate::__identifier!($($mpid)?)) ),* ],
            |target, args| {
              #[allow(unused_mut)]
              let mut index = 0usize;
              $(
                let $mparam: ::std::sync::Arc<$mpty> = args.get(index)?;
                index += 1;
              )*
              let _ = index;
              ($invoke)(target, $( $mparam ),*);
              Ok(())
            },
          ) )*
          .build()
      }
    }
  };

  // No injection points at all.
  ($ty:ty) => {
    impl $crate::Injectable for $ty {
      fn type_info() -> $crate::TypeInfo {
        $crate::TypeInfo::of::<Self>()
      }
    }
  };
}

/// Declares which trait-object contracts a concrete type provides,
/// generating [`ProvideAs`](crate::ProvideAs) impls. The unsizing coercion
/// lives here, so `bind::<dyn Trait>().to::<Concrete>()` stays fully
/// type-checked.
///
/// # Examples
///
/// ```
/// use weft_di::provides;
///
/// trait Greeter: Send + Sync {}
/// trait Speaker: Send + Sync {}
///
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter {}
/// impl Speaker for EnglishGreeter {}
///
/// provides!(EnglishGreeter: dyn Greeter, dyn Speaker);
/// ```
#[macro_export]
macro_rules! provides {
  ($concrete:ty : $( $contract:ty ),+ $(,)?) => {
    $(
      impl $crate::ProvideAs<$contract> for $concrete {
        fn promote(this: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
          this
        }
      }
    )+
  };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __identifier {
  () => {
    ::core::option::Option::None
  };
  ($id:literal) => {
    ::core::option::Option::Some($id)
  };
}
