//! Half-plane line collision
//!
//! A collidable line catches a point moving toward its solid side while the
//! point sits inside the capture band: strictly between 0 and `ZONE` units past
//! the line along its normal, and inside the (possibly extended) interval
//! between its endpoints.

use glam::DVec2;

use super::line::Line;
use super::point::SimulationPoint;
use crate::consts::ZONE;

/// Result of testing a point against a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Point is outside the capture band or moving away
    NoHit,
    /// Point was caught and moved onto the line
    Collided(SimulationPoint),
    /// A diagnostic line saw the point enter its capture band
    DiagnosticHit,
}

impl Contact {
    pub fn is_hit(&self) -> bool {
        !matches!(self, Contact::NoHit)
    }

    /// Point after the contact, `original` when nothing moved it
    pub fn point_or(self, original: SimulationPoint) -> SimulationPoint {
        match self {
            Contact::Collided(p) => p,
            Contact::NoHit | Contact::DiagnosticHit => original,
        }
    }
}

/// Penetration depth (`doty`) if the line captures the point
pub(crate) fn capture(line: &Line, point: &SimulationPoint) -> Option<f64> {
    let normal = line.normal();
    if point.momentum.dot(normal) <= 0.0 {
        return None;
    }

    let start_delta = point.location - line.start();
    let doty = normal.dot(start_delta);
    if !(doty > 0.0 && doty < ZONE) {
        return None;
    }

    let dotx = start_delta.dot(line.diff()) * line.inv_len_sq();
    let (limit_left, limit_right) = line.limits();
    if dotx < limit_left || dotx > limit_right {
        return None;
    }

    Some(doty)
}

/// Move a captured point back onto the line and apply tangential friction
pub(crate) fn resolve(line: &Line, point: &SimulationPoint, doty: f64) -> SimulationPoint {
    let normal = line.normal();
    let location = point.location - normal * doty;

    // Friction magnitude per axis, pushed onto `previous` in the direction of
    // motion so the next implicit velocity shrinks. Capped at the distance to
    // `location` so friction can stop a point but never reverse it.
    let magnitude = DVec2::new(normal.y.abs(), normal.x.abs()) * point.friction * doty;
    let travel = location - point.previous;
    let friction = DVec2::new(
        oppose(travel.x, magnitude.x),
        oppose(travel.y, magnitude.y),
    );

    SimulationPoint::new(location, point.previous + friction, point.momentum, point.friction)
}

#[inline]
fn oppose(travel: f64, magnitude: f64) -> f64 {
    travel.signum() * magnitude.min(travel.abs())
}
