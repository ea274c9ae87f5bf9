use weft_di::Container;

// A function that configures dependencies and runs some logic.
// By accepting a `&Container`, it can be tested with a controlled
// environment; there is no global registry to leak into.
fn process_data(container: &Container) -> String {
  // Register a data source ONLY within the scope of this container.
  container.bind::<String>().to_value("test data".to_string());

  // Resolve the dependency from the provided container.
  let data = container
    .resolve::<String>()
    .expect("resolution succeeds")
    .expect("data not found in container");
  format!("Processed: {}", data.to_uppercase())
}

fn main() {
  println!("--- Running with a dedicated container ---");
  let test_container = Container::new();
  let result = process_data(&test_container);

  println!("Result: {}", result);
  assert_eq!(result, "Processed: TEST DATA");

  // --- Verify Isolation ---
  // The value registered in `test_container` does not exist elsewhere.
  let other_container = Container::new();
  assert!(
    other_container.binder().is_empty(),
    "Dependency should not have leaked across containers!"
  );

  println!("\nVerified that containers are isolated from one another.");
}
