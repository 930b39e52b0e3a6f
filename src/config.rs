//! Global configuration constants for the Joint Dynamics engine.

/// Distance below which directions are treated as degenerate.
pub const EPSILON: f32 = 0.001;

/// Default gravity vector applied to every free particle (Y-up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -10.0, 0.0];

/// Number of constraint relaxation iterations performed per step.
pub const DEFAULT_RELAXATION: u32 = 3;

/// Global spring coefficient applied to every constraint correction.
pub const DEFAULT_SPRING_K: f32 = 1.0;

/// Default floor height used by the point collision pass.
pub const DEFAULT_FLOOR_HEIGHT: f32 = 0.02;

/// Time (in seconds) the controller waits after a rebuild or reset before simulating.
pub const DEFAULT_SETTLE_DELAY: f32 = 1.0 / 20.0;

/// Angular frequency multiplier of the oscillating wind.
pub const DEFAULT_WIND_FREQUENCY: f32 = 3.0;

/// Contact friction every particle starts with after initialization.
pub const DEFAULT_INITIAL_FRICTION: f32 = 0.5;

/// Minimum number of items a rayon task processes in one go.
pub const PARALLEL_GRAIN: usize = 8;
