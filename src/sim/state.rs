//! Rider body definition and per-frame rider state

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::bone::{Bone, BoneSpec, Scarf};
use super::point::SimulationPoint;
use crate::error::BodyError;

/// Rider condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiderState {
    #[default]
    Alive,
    /// Terminal: a breakable bone overstretched
    Crashed,
}

impl RiderState {
    pub fn is_crashed(&self) -> bool {
        matches!(self, RiderState::Crashed)
    }
}

/// Contact point indices of the default rider
pub mod parts {
    pub const PEG: usize = 0;
    pub const TAIL: usize = 1;
    pub const NOSE: usize = 2;
    pub const STRING: usize = 3;
    pub const BUTT: usize = 4;
    pub const SHOULDER: usize = 5;
    pub const RIGHT_HAND: usize = 6;
    pub const LEFT_HAND: usize = 7;
    pub const LEFT_FOOT: usize = 8;
    pub const RIGHT_FOOT: usize = 9;
}

/// Number of scarf segments on the default rider
pub const SCARF_SEGMENTS: usize = 7;

/// Static description of a rider body: spawn points (relative to the spawn
/// position), bones in relaxation order, optional scarf.
#[derive(Debug, Clone, PartialEq)]
pub struct RiderBody {
    points: Vec<SimulationPoint>,
    bones: Vec<Bone>,
    scarf: Option<Scarf>,
}

impl RiderBody {
    /// Validate and build a body. Bone rest lengths are measured on `points`.
    pub fn new(
        points: Vec<SimulationPoint>,
        bones: &[BoneSpec],
        endurance_factor: f64,
    ) -> Result<Self, BodyError> {
        if points.is_empty() {
            return Err(BodyError::Empty);
        }
        let bones = bones
            .iter()
            .enumerate()
            .map(|(i, spec)| Bone::from_spec(i, *spec, &points, endurance_factor))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            points,
            bones,
            scarf: None,
        })
    }

    /// Attach a scarf of `segments` links to point `anchor`
    pub fn with_scarf(mut self, anchor: usize, segments: usize) -> Result<Self, BodyError> {
        self.scarf = Some(Scarf::new(anchor, segments, self.points.len())?);
        Ok(self)
    }

    /// The sled-and-rider body
    pub fn default_rider(endurance_factor: f64, scarf: bool) -> Result<Self, BodyError> {
        use parts::*;

        let p = |x: f64, y: f64, friction: f64| SimulationPoint::at_rest(DVec2::new(x, y), friction);
        let points = vec![
            p(0.0, 0.0, 0.8),   // peg
            p(0.0, 5.0, 0.0),   // tail
            p(15.0, 5.0, 0.0),  // nose
            p(17.5, 0.0, 0.0),  // string
            p(5.0, 0.0, 0.8),   // butt
            p(5.0, -5.5, 0.8),  // shoulder
            p(11.5, -5.0, 0.1), // right hand
            p(11.5, -5.0, 0.1), // left hand
            p(10.0, 5.0, 0.0),  // left foot
            p(10.0, 5.0, 0.0),  // right foot
        ];

        let bones = [
            // sled
            BoneSpec::bind(PEG, TAIL),
            BoneSpec::bind(TAIL, NOSE),
            BoneSpec::bind(NOSE, STRING),
            BoneSpec::bind(STRING, PEG),
            BoneSpec::bind(PEG, NOSE),
            BoneSpec::bind(STRING, TAIL),
            // seated on the sled
            BoneSpec::breakable(PEG, BUTT),
            BoneSpec::breakable(TAIL, BUTT),
            BoneSpec::breakable(NOSE, BUTT),
            // body
            BoneSpec::bind(SHOULDER, BUTT),
            BoneSpec::bind(SHOULDER, LEFT_HAND),
            BoneSpec::bind(SHOULDER, RIGHT_HAND),
            BoneSpec::bind(BUTT, LEFT_FOOT),
            BoneSpec::bind(BUTT, RIGHT_FOOT),
            // holding on
            BoneSpec::breakable(SHOULDER, PEG),
            BoneSpec::breakable(STRING, LEFT_HAND),
            BoneSpec::breakable(STRING, RIGHT_HAND),
            BoneSpec::breakable(LEFT_FOOT, NOSE),
            BoneSpec::breakable(RIGHT_FOOT, NOSE),
            // keep feet away from the shoulder
            BoneSpec::repel(SHOULDER, LEFT_FOOT),
            BoneSpec::repel(SHOULDER, RIGHT_FOOT),
        ];

        let body = Self::new(points, &bones, endurance_factor)?;
        if scarf {
            body.with_scarf(SHOULDER, SCARF_SEGMENTS)
        } else {
            Ok(body)
        }
    }

    pub fn points(&self) -> &[SimulationPoint] {
        &self.points
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn scarf(&self) -> Option<&Scarf> {
        self.scarf.as_ref()
    }

    /// Rider at `position` moving with `velocity`
    pub fn spawn(&self, position: DVec2, velocity: DVec2) -> Rider {
        let points: Vec<SimulationPoint> = self
            .points
            .iter()
            .map(|p| SimulationPoint::moving(position + p.location, velocity, p.friction))
            .collect();
        let scarf = match &self.scarf {
            Some(scarf) => scarf.spawn(points[scarf.anchor()].location, velocity),
            None => Vec::new(),
        };
        Rider {
            points,
            scarf,
            state: RiderState::Alive,
        }
    }
}

/// Rider pose for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    /// Body points in body order
    pub points: Vec<SimulationPoint>,
    /// Scarf points, anchor side first (cosmetic)
    pub scarf: Vec<SimulationPoint>,
    pub state: RiderState,
}

impl Rider {
    /// Camera target: mean of the body points
    pub fn center(&self) -> DVec2 {
        mean(self.points.iter().map(|p| p.location), self.points.len())
    }

    /// Mean carried velocity of the body points
    pub fn momentum(&self) -> DVec2 {
        mean(self.points.iter().map(|p| p.momentum), self.points.len())
    }

    /// Points per frame
    pub fn speed(&self) -> f64 {
        self.momentum().length()
    }

    pub fn is_crashed(&self) -> bool {
        self.state.is_crashed()
    }

    /// Body point locations in body order
    pub fn pose(&self) -> Vec<DVec2> {
        self.points.iter().map(|p| p.location).collect()
    }
}

fn mean(values: impl Iterator<Item = DVec2>, count: usize) -> DVec2 {
    if count == 0 {
        return DVec2::ZERO;
    }
    values.fold(DVec2::ZERO, |acc, v| acc + v) / count as f64
}
