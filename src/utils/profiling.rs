use std::time::{Duration, Instant};

/// Timing and size data of the most recent simulation step.
#[derive(Debug, Default, Clone, Copy)]
pub struct StepProfiler {
    pub integrate_time: Duration,
    pub relax_time: Duration,
    pub collision_time: Duration,
    pub sync_time: Duration,
    pub total_step_time: Duration,

    pub point_count: usize,
    pub batch_count: usize,
    pub constraint_count: usize,
    pub relaxation: u32,
}

impl StepProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) {
        let total_us = self.total_step_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        log::debug!(
            "dynamics step: {} points, {} constraints in {} batches x {} iterations, {:.3} ms",
            self.point_count,
            self.constraint_count,
            self.batch_count,
            self.relaxation,
            self.total_step_time.as_secs_f32() * 1000.0
        );
        log::debug!(
            "  integrate {:.1}% | relax {:.1}% | collide {:.1}% | sync {:.1}%",
            (self.integrate_time.as_micros() as f32 / total_us) * 100.0,
            (self.relax_time.as_micros() as f32 / total_us) * 100.0,
            (self.collision_time.as_micros() as f32 / total_us) * 100.0,
            (self.sync_time.as_micros() as f32 / total_us) * 100.0
        );
    }
}

/// Adds the lifetime of the guard to `output`.
pub struct StageTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> StageTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for StageTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
