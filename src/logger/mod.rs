//! Process-wide `tracing` subscriber with a filter that can be swapped at
//! runtime. See `bin/logger_demo.rs`.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
