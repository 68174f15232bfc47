//! Shared test doubles and utilities for the Chronicle runtime.

mod clock;
mod history;
mod logging;

pub use clock::FixedClock;
pub use history::{EmptyHistory, FailingHistory, InMemoryHistory};
pub use logging::init_tracing;
