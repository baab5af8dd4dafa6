//! Lifetime Component
//!
//! Destroys its owner once a fixed amount of scaled game time has passed.

use crate::ecs::{Component, ComponentId, World};

/// Despawns the owning entity after `duration` seconds
#[derive(Debug, Clone, Copy)]
pub struct Lifetime {
    /// Game time at which the countdown started; set on `awake`, or on
    /// attach when the owner has already awoken
    started_at: Option<f64>,
    /// How long the entity should live (in seconds); non-positive means forever
    pub duration: f64,
}

impl Lifetime {
    /// Create a new lifetime component
    pub fn new(duration: f64) -> Self {
        Self { started_at: None, duration }
    }

    /// Check if the lifetime has run out at `current_time`
    pub fn is_expired(&self, current_time: f64) -> bool {
        match self.started_at {
            Some(start) if self.duration > 0.0 => current_time >= start + self.duration,
            _ => false,
        }
    }

    /// Get remaining lifetime in seconds
    pub fn remaining(&self, current_time: f64) -> f64 {
        if self.duration <= 0.0 {
            return f64::INFINITY;
        }
        let start = self.started_at.unwrap_or(current_time);
        (start + self.duration - current_time).max(0.0)
    }
}

impl Component for Lifetime {
    fn unique() -> bool {
        true
    }

    fn on_attach(&mut self, world: &mut World, this: ComponentId) {
        let owner = world.owner(this);
        if owner.is_some() && !world.is_pending_awake(owner) {
            self.started_at = Some(world.time().elapsed());
        }
    }

    fn awake(&mut self, world: &mut World, _this: ComponentId) {
        self.started_at = Some(world.time().elapsed());
    }

    fn update(&mut self, world: &mut World, this: ComponentId) {
        if self.is_expired(world.time().elapsed()) {
            if let Some(owner) = world.owner(this) {
                log::debug!("Lifetime of entity {owner} ran out");
                world.destroy(owner);
            }
        }
    }
}
