use std::sync::Arc;

use weft_di::{injectable, provides, resolve, Container, Injectable, PointKind};

// --- Macro Fixtures ---

trait Formatter: Send + Sync {
  fn render(&self, value: u32) -> String;
}

struct HexFormatter;
impl Formatter for HexFormatter {
  fn render(&self, value: u32) -> String {
    format!("{value:#x}")
  }
}
injectable!(HexFormatter { new() => HexFormatter; });
provides!(HexFormatter: dyn Formatter);

struct Printer {
  formatter: Arc<dyn Formatter>,
  width: Arc<u32>,
}
injectable!(Printer {
  new(formatter: dyn Formatter, width @ "width": u32) => Printer { formatter, width };
});

// --- Tests ---

#[test]
fn test_injectable_macro_declares_ordered_constructor_points() {
  // Arrange: inspect the generated metadata directly.
  let info = Printer::type_info();
  let ctor = info.constructor().expect("constructor declared");

  // Assert
  assert_eq!(ctor.params().len(), 2);
  assert_eq!(ctor.params()[0].name(), None);
  assert_eq!(ctor.params()[1].name(), Some("width"));
}

#[test]
fn test_injectable_macro_declares_member_points() {
  struct WithMembers {
    label: Option<Arc<String>>,
  }
  injectable!(WithMembers {
    new() => WithMembers { label: None };
    field label @ "label": String => |target: &mut WithMembers, value| target.label = Some(value);
  });

  let info = WithMembers::type_info();
  assert_eq!(info.members().len(), 1);
  assert_eq!(info.members()[0].name(), "label");
  assert_eq!(info.members()[0].kind(), PointKind::Field);
  assert_eq!(info.members()[0].points()[0].name(), Some("label"));
}

#[test]
fn test_identified_constructor_point_resolves_the_named_binding() {
  // Arrange
  let container = Container::new();
  container.bind::<dyn Formatter>().to::<HexFormatter>();
  container.bind::<u32>().to_value(80_u32).named("width");
  container.bind::<u32>().to_value(9999_u32);
  container.bind::<Printer>().to_self();

  // Act
  let printer = resolve!(container, Printer);

  // Assert: the identified parameter picked the named binding.
  assert_eq!(*printer.width, 80);
  assert_eq!(printer.formatter.render(255), "0xff");
}

#[test]
fn test_resolve_macro_named_arm() {
  // Arrange
  let container = Container::new();
  container.bind::<String>().to_value("plain".to_string());
  container.bind::<String>().to_value("named".to_string()).named("tag");

  // Act & Assert
  assert_eq!(*resolve!(container, String), "plain");
  assert_eq!(*resolve!(container, String, "tag"), "named");
}

#[test]
fn test_provides_macro_supports_multiple_contracts() {
  trait Readable: Send + Sync {
    fn read(&self) -> u32;
  }
  trait Writable: Send + Sync {
    fn write(&self) -> u32;
  }

  struct Store;
  impl Readable for Store {
    fn read(&self) -> u32 {
      1
    }
  }
  impl Writable for Store {
    fn write(&self) -> u32 {
      2
    }
  }
  injectable!(Store { new() => Store; });
  provides!(Store: dyn Readable, dyn Writable);

  // Arrange
  let container = Container::new();
  container.bind::<dyn Readable>().to::<Store>();
  container.bind::<dyn Writable>().to::<Store>();

  // Act & Assert
  assert_eq!(resolve!(container, trait Readable).read(), 1);
  assert_eq!(resolve!(container, trait Writable).write(), 2);
}

#[test]
#[should_panic(expected = "Failed to resolve required service with name")]
fn test_resolve_macro_panics_on_missing_named_service() {
  let container = Container::builder()
    .resolution_mode(weft_di::ResolutionMode::BoundOnly)
    .build();
  resolve!(container, String, "absent");
}
