use std::sync::Arc;

use weft_di::{injectable, provides, resolve, Container};

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}
injectable!(ConsoleLogger { new() => ConsoleLogger; });
provides!(ConsoleLogger: dyn Logger);

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}
injectable!(ReportService {
  new(logger: dyn Logger) => ReportService { logger };
});

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    // ... logic to generate report ...
    self.logger.log("Finished report generation.");
  }
}

fn main() {
  let container = Container::new();

  // --- Registration ---

  // Register the concrete ConsoleLogger as the implementation for the
  // `dyn Logger` contract. The container constructs a ConsoleLogger but
  // serves it as Arc<dyn Logger>.
  container.bind::<dyn Logger>().to::<ConsoleLogger>().as_singleton();

  // Register the ReportService. Its constructor point *resolves* its own
  // dependency; ReportService never creates its logger.
  container.bind::<ReportService>().to_self();

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = resolve!(container, ReportService);

  println!("Using the service...");
  report_service.generate_report();

  // The output shows messages from the ConsoleLogger, proving the
  // dependency was injected.
}
