use log::{log_enabled, Level};
use std::time::{Duration, Instant};

/// Traces the start and end of one pipeline stage.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("begin {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            log::trace!("{} took {} µs", self.label, self.start.elapsed().as_micros());
        }
    }
}

/// Warns when a step took longer than the simulated time it covers, which
/// means the next `execute` will block on it.
pub fn warn_if_step_overran(elapsed: Duration, dt: f32, point_count: usize) -> bool {
    let elapsed_ms = elapsed.as_secs_f32() * 1000.0;
    let tick_ms = dt * 1000.0;
    if dt > 0.0 && elapsed_ms > tick_ms {
        log::warn!("dynamics step over {point_count} points took {elapsed_ms:.2} ms, tick is {tick_ms:.2} ms");
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrun_is_relative_to_the_tick() {
        assert!(warn_if_step_overran(Duration::from_millis(20), 1.0 / 60.0, 10));
        assert!(!warn_if_step_overran(Duration::from_millis(5), 1.0 / 60.0, 10));
        assert!(!warn_if_step_overran(Duration::from_millis(5), 0.0, 10));
    }
}
