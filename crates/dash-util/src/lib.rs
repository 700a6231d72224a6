//! dash-util - Helpers shared by the dashboard store crates
//!
//! Random digit suffixes for entity ids and a pluggable clock so time-based
//! behavior (undo coalescing, request timeouts) can be driven from tests.

pub mod clock;
pub mod digits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use digits::DigitSource;
