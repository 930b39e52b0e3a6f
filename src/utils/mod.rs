//! Utility helpers: vector math, scoped logging timers and step profiling.

pub mod logging;
pub mod math;
pub mod profiling;

pub use math::*;
