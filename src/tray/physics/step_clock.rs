//! Fixed-step accumulator
//!
//! Turns variable wall-clock frame deltas into a bounded number of fixed
//! integration sub-steps.

use crate::tray::types::PhysicsSettings;

/// Slack for float error when comparing the accumulator against one step.
const STEP_EPSILON: f32 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub struct StepClock {
    fixed_step: f32,
    max_frame_delta: f32,
    speed: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl StepClock {
    pub fn new(fixed_step: f32, max_frame_delta: f32, speed: f32, max_substeps: u32) -> Self {
        Self {
            fixed_step,
            max_frame_delta,
            speed,
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    pub fn from_settings(settings: &PhysicsSettings) -> Self {
        Self::new(
            settings.fixed_step,
            settings.max_frame_delta,
            settings.simulation_speed,
            settings.max_substeps,
        )
    }

    pub fn fixed_step(&self) -> f32 {
        self.fixed_step
    }

    /// Clamp `wall_clock_delta`, scale it and return how many fixed sub-steps
    /// to run now. Time that does not fill a whole step carries over; time
    /// beyond `max_substeps` is dropped.
    pub fn advance(&mut self, wall_clock_delta: f32) -> u32 {
        let delta = if wall_clock_delta.is_finite() {
            wall_clock_delta.clamp(0.0, self.max_frame_delta)
        } else {
            0.0
        };
        self.accumulator += delta * self.speed;

        let mut steps = 0;
        while steps < self.max_substeps && self.accumulator + STEP_EPSILON >= self.fixed_step {
            self.accumulator = (self.accumulator - self.fixed_step).max(0.0);
            steps += 1;
        }
        if steps == self.max_substeps {
            self.accumulator = self.accumulator.min(self.fixed_step);
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
