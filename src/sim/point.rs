//! Verlet simulation point

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A verlet point.
///
/// `location - previous` is the implicit velocity. `momentum` is the
/// displacement applied when the point was last integrated (implicit velocity
/// plus the frame's force); it decides which side of a line the point is
/// approaching from. Points are
/// `Copy` values and every update produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationPoint {
    pub location: DVec2,
    pub previous: DVec2,
    pub momentum: DVec2,
    /// Scales the tangential impulse applied on collision
    pub friction: f64,
}

impl SimulationPoint {
    pub const fn new(location: DVec2, previous: DVec2, momentum: DVec2, friction: f64) -> Self {
        Self {
            location,
            previous,
            momentum,
            friction,
        }
    }

    /// A point at rest
    pub const fn at_rest(location: DVec2, friction: f64) -> Self {
        Self::new(location, location, DVec2::ZERO, friction)
    }

    /// A point moving with `velocity`
    pub fn moving(location: DVec2, velocity: DVec2, friction: f64) -> Self {
        Self::new(location, location - velocity, velocity, friction)
    }

    /// Implicit velocity
    #[inline]
    pub fn velocity(&self) -> DVec2 {
        self.location - self.previous
    }

    /// Verlet integration: `2 * location - previous + force`
    pub fn step_momentum(&self, force: DVec2) -> Self {
        let momentum = self.velocity() + force;
        Self::new(self.location + momentum, self.location, momentum, self.friction)
    }

    /// Verlet integration with air friction scaling the carried velocity
    pub fn step_with_air_friction(&self, force: DVec2, air_friction: f64) -> Self {
        let momentum = self.velocity() * air_friction + force;
        Self::new(self.location + momentum, self.location, momentum, self.friction)
    }

    /// Same point moved to `location`, history untouched
    #[inline]
    pub fn with_location(&self, location: DVec2) -> Self {
        Self { location, ..*self }
    }

    /// Same point with a new previous location
    #[inline]
    pub fn with_previous(&self, previous: DVec2) -> Self {
        Self { previous, ..*self }
    }
}
