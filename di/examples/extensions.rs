use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};

use weft_di::{injectable, resolve, Container, ContainerExtension, Flow, TypeInfo};

struct Job {
  id: u32,
}
injectable!(Job { new() => Job { id: 0 }; });

/// Counts every instance the container finishes injecting.
#[derive(Default)]
struct InstanceCounter {
  produced: AtomicUsize,
}

impl ContainerExtension for InstanceCounter {
  fn on_register(&self, container: &Container) {
    println!("counter attached to container {:?}", container.id());
  }

  fn on_unregister(&self, container: &Container) {
    println!(
      "counter detached from container {:?} after {} instances",
      container.id(),
      self.produced.load(Ordering::SeqCst)
    );
  }

  fn after_injection(&self, info: &TypeInfo, _target: &(dyn Any + Send + Sync)) -> Flow {
    self.produced.fetch_add(1, Ordering::SeqCst);
    println!("produced an instance of {}", info.key().name());
    Flow::Continue
  }
}

fn main() {
  // The engine logs its own steps through `tracing`; surface them.
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
    )
    .init();

  let container = Container::new();
  container.register_extension(InstanceCounter::default());
  container.bind::<Job>().to_self();

  for _ in 0..3 {
    let job = resolve!(container, Job);
    let _ = job.id;
  }

  // Dropping the container disposes it and notifies the extension.
  drop(container);
}
