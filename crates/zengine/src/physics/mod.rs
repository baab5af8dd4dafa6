//! Physics pipeline interface
//!
//! The scheduler advances the physics pipeline by exactly one fixed step per
//! fixed-update iteration. Integration itself belongs to the backend.

use crate::ecs::AsAny;

/// Simulation backend stepped at the fixed rate
pub trait PhysicsPipeline: AsAny {
    /// Advance the simulation by `time_step` seconds
    fn step(&mut self, time_step: f32);
}

/// Physics pipeline that simulates nothing and counts its steps
#[derive(Debug, Default, Clone)]
pub struct NullPhysicsPipeline {
    steps: u64,
    simulated_time: f64,
}

impl NullPhysicsPipeline {
    /// Create a new physics pipeline with no simulated time
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps taken
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Sum of all step sizes in seconds
    pub fn simulated_time(&self) -> f64 {
        self.simulated_time
    }
}

impl PhysicsPipeline for NullPhysicsPipeline {
    fn step(&mut self, time_step: f32) {
        self.steps += 1;
        self.simulated_time += f64::from(time_step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_pipeline_counts_steps() {
        let mut physics = NullPhysicsPipeline::new();
        physics.step(0.5);
        physics.step(0.25);
        assert_eq!(physics.steps(), 2);
        assert_relative_eq!(physics.simulated_time(), 0.75);
    }
}
