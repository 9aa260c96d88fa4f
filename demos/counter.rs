//! Counter component backed by component-local state.
//!
//! Run with `cargo run --example counter`. Set `RUST_LOG=statekit=trace` to
//! see commits and notification passes.

use statekit::LocalState;
use tracing_subscriber::EnvFilter;

/// A headless counter: renders its value to stdout on every change.
struct Counter {
    count: LocalState<i64>,
}

impl Counter {
    fn new() -> Self {
        let count = LocalState::new(0);

        render(count.get());
        count.subscribe(|value| render(*value));

        Self { count }
    }

    fn decrement(&self) {
        self.count.update(|v| v - 1);
    }

    fn increment(&self) {
        self.count.update(|v| v + 1);
    }

    fn reset(&self) {
        self.count.set(0);
    }
}

fn render(value: i64) {
    println!("   Current value: {value}");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Counter (local state) ===\n");
    let counter = Counter::new();

    println!("\n[+] [+] [+]");
    counter.increment();
    counter.increment();
    counter.increment();

    println!("\n[-]");
    counter.decrement();

    println!("\n[Reset]");
    counter.reset();

    println!("\n[Reset] again (no change, no render)");
    counter.reset();
}
