use weft_di::{injectable, Container, ResolutionMode};

// A host object whose members are filled according to its own identity:
// the same contract (`f32`) resolves to different values per instance.
struct Cube {
  name: String,
  speed: f32,
}

injectable!(Cube {
  field speed: f32 => |cube: &mut Cube, value| cube.speed = *value;
});

fn main() {
  let container = Container::builder()
    .resolution_mode(ResolutionMode::BoundOnly)
    .build();

  // Two conditional bindings for the same contract. The predicate inspects
  // the object being injected into.
  container
    .bind::<f32>()
    .to_value(0.5_f32)
    .when(|ctx| ctx.parent_as::<Cube>().is_some_and(|cube| cube.name.contains("CubeA")));
  container
    .bind::<f32>()
    .to_value(2.0_f32)
    .when(|ctx| ctx.parent_as::<Cube>().is_some_and(|cube| cube.name.contains("CubeB")));

  let mut slow = Cube { name: "CubeA_instance".to_string(), speed: 0.0 };
  let mut fast = Cube { name: "CubeB_instance".to_string(), speed: 0.0 };
  let mut plain = Cube { name: "CubeC_instance".to_string(), speed: 0.0 };

  container.inject(&mut slow).expect("injection succeeds");
  container.inject(&mut fast).expect("injection succeeds");
  // No binding matches CubeC; under BoundOnly the member keeps its default.
  container.inject(&mut plain).expect("injection succeeds");

  println!("{} -> speed {}", slow.name, slow.speed);
  println!("{} -> speed {}", fast.name, fast.speed);
  println!("{} -> speed {}", plain.name, plain.speed);

  assert_eq!(slow.speed, 0.5);
  assert_eq!(fast.speed, 2.0);
  assert_eq!(plain.speed, 0.0);
}
