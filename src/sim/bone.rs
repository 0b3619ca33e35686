//! Bone constraints between rider points
//!
//! Bones are not track lines: they only connect points of one rider body and
//! are relaxed in body order every iteration of a frame step.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::point::SimulationPoint;
use crate::consts::{SCARF_SEGMENT_BASE, SCARF_SEGMENT_GROWTH};
use crate::error::BodyError;

/// How a bone is declared in a body definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoneSpecKind {
    /// Rigid, never breaks
    Bind,
    /// Rigid until stretched past its endurance, then the rider crashes
    Breakable,
    /// Pushes apart below half the spawn distance, never pulls
    Repel,
}

/// Bone declaration: two point indices and a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoneSpec {
    pub a: usize,
    pub b: usize,
    pub kind: BoneSpecKind,
}

impl BoneSpec {
    pub const fn bind(a: usize, b: usize) -> Self {
        Self {
            a,
            b,
            kind: BoneSpecKind::Bind,
        }
    }

    pub const fn breakable(a: usize, b: usize) -> Self {
        Self {
            a,
            b,
            kind: BoneSpecKind::Breakable,
        }
    }

    pub const fn repel(a: usize, b: usize) -> Self {
        Self {
            a,
            b,
            kind: BoneSpecKind::Repel,
        }
    }
}

/// Resolved bone behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoneKind {
    /// Keeps rest length; `endurance` is the largest tolerated half stretch ratio
    Bind { endurance: Option<f64> },
    Repel,
}

/// Outcome of relaxing one bone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoneOutcome {
    /// Constraint applied or not needed
    Held,
    /// Breakable bone overstretched, nothing applied
    Broke,
    /// Breakable bone skipped because the rider already crashed
    Inert,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    a: usize,
    b: usize,
    rest: f64,
    kind: BoneKind,
}

impl Bone {
    /// Build bone `index` of a body from its spawn points
    pub fn from_spec(
        index: usize,
        spec: BoneSpec,
        points: &[SimulationPoint],
        endurance_factor: f64,
    ) -> Result<Self, BodyError> {
        let count = points.len();
        for point in [spec.a, spec.b] {
            if point >= count {
                return Err(BodyError::PointOutOfRange {
                    bone: index,
                    point,
                    count,
                });
            }
        }
        if spec.a == spec.b {
            return Err(BodyError::SelfReference {
                bone: index,
                point: spec.a,
            });
        }

        let mut rest = points[spec.a].location.distance(points[spec.b].location);
        if !(rest > 0.0 && rest.is_finite()) {
            return Err(BodyError::ZeroLength { bone: index });
        }

        let kind = match spec.kind {
            BoneSpecKind::Bind => BoneKind::Bind { endurance: None },
            BoneSpecKind::Breakable => {
                if !(endurance_factor.is_finite() && endurance_factor > 0.0) {
                    return Err(BodyError::InvalidEndurance {
                        bone: index,
                        endurance: endurance_factor,
                    });
                }
                BoneKind::Bind {
                    endurance: Some(rest * endurance_factor * 0.5),
                }
            }
            BoneSpecKind::Repel => {
                rest *= 0.5;
                BoneKind::Repel
            }
        };

        Ok(Self {
            a: spec.a,
            b: spec.b,
            rest,
            kind,
        })
    }

    pub fn points(&self) -> (usize, usize) {
        (self.a, self.b)
    }

    pub fn rest_length(&self) -> f64 {
        self.rest
    }

    pub fn kind(&self) -> BoneKind {
        self.kind
    }

    pub fn is_breakable(&self) -> bool {
        matches!(self.kind, BoneKind::Bind { endurance: Some(_) })
    }

    /// Relax this bone in place. Breakable bones do nothing once `crashed`.
    pub fn apply(&self, points: &mut [SimulationPoint], crashed: bool) -> BoneOutcome {
        if crashed && self.is_breakable() {
            return BoneOutcome::Inert;
        }

        let pa = points[self.a];
        let pb = points[self.b];
        let delta = pa.location - pb.location;
        let length = delta.length();

        if matches!(self.kind, BoneKind::Repel) && length >= self.rest {
            return BoneOutcome::Held;
        }
        if length == 0.0 {
            // No direction to push along
            return BoneOutcome::Held;
        }

        let scalar = (length - self.rest) / length * 0.5;
        if let BoneKind::Bind {
            endurance: Some(endurance),
        } = self.kind
        {
            if scalar > endurance {
                return BoneOutcome::Broke;
            }
        }

        points[self.a] = pa.with_location(pa.location - delta * scalar);
        points[self.b] = pb.with_location(pb.location + delta * scalar);
        BoneOutcome::Held
    }
}

/// Decorative chain hanging from one body point.
///
/// Segment `i` rests at `SCARF_SEGMENT_BASE + i * SCARF_SEGMENT_GROWTH`, so the
/// chain loosens toward its tail. Only the scarf points move; the anchor belongs
/// to the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Scarf {
    anchor: usize,
    rests: Vec<f64>,
}

impl Scarf {
    pub fn new(anchor: usize, segments: usize, body_points: usize) -> Result<Self, BodyError> {
        if anchor >= body_points {
            return Err(BodyError::ScarfAnchor {
                anchor,
                count: body_points,
            });
        }
        let rests = (0..segments)
            .map(|i| SCARF_SEGMENT_BASE + i as f64 * SCARF_SEGMENT_GROWTH)
            .collect();
        Ok(Self { anchor, rests })
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn segments(&self) -> usize {
        self.rests.len()
    }

    /// Scarf points trailing behind the anchor, all moving with `velocity`
    pub fn spawn(&self, anchor: DVec2, velocity: DVec2) -> Vec<SimulationPoint> {
        let mut offset = 0.0;
        self.rests
            .iter()
            .map(|rest| {
                offset += rest;
                SimulationPoint::moving(anchor - DVec2::new(offset, 0.0), velocity, 0.0)
            })
            .collect()
    }

    /// One relaxation pass over the chain
    pub fn relax(&self, anchor: DVec2, points: &mut [SimulationPoint]) {
        for (i, rest) in self.rests.iter().enumerate() {
            if i >= points.len() {
                break;
            }
            if i == 0 {
                let p = points[0];
                let delta = p.location - anchor;
                let length = delta.length();
                if length > 0.0 {
                    let scalar = (length - rest) / length;
                    points[0] = p.with_location(p.location - delta * scalar);
                }
            } else {
                let pa = points[i - 1];
                let pb = points[i];
                let delta = pa.location - pb.location;
                let length = delta.length();
                if length > 0.0 {
                    let scalar = (length - rest) / length * 0.5;
                    points[i - 1] = pa.with_location(pa.location - delta * scalar);
                    points[i] = pb.with_location(pb.location + delta * scalar);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(distance: f64) -> Vec<SimulationPoint> {
        vec![
            SimulationPoint::at_rest(DVec2::ZERO, 0.0),
            SimulationPoint::at_rest(DVec2::new(distance, 0.0), 0.0),
        ]
    }

    #[test]
    fn test_bind_restores_rest_length() {
        let spawn = pair(10.0);
        let bone = Bone::from_spec(0, BoneSpec::bind(0, 1), &spawn, 0.0285).unwrap();

        let mut points = pair(14.0);
        assert_eq!(bone.apply(&mut points, false), BoneOutcome::Held);
        let length = points[0].location.distance(points[1].location);
        assert!((length - 10.0).abs() < 1e-12);
        // Both ends moved by the same amount
        assert!((points[0].location.x - 2.0).abs() < 1e-12);
        assert!((points[1].location.x - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_breakable_snaps_past_endurance() {
        let spawn = pair(10.0);
        let bone = Bone::from_spec(0, BoneSpec::breakable(0, 1), &spawn, 0.0285).unwrap();
        // endurance = 10 * 0.0285 * 0.5 = 0.1425 on the half stretch ratio

        let mut slight = pair(11.0); // (11 - 10) / 11 * 0.5 ~ 0.045
        assert_eq!(bone.apply(&mut slight, false), BoneOutcome::Held);

        let mut far = pair(100.0); // (100 - 10) / 100 * 0.5 = 0.45
        let before = far.clone();
        assert_eq!(bone.apply(&mut far, false), BoneOutcome::Broke);
        assert_eq!(far, before);

        let mut crashed = pair(11.0);
        assert_eq!(bone.apply(&mut crashed, true), BoneOutcome::Inert);
        assert_eq!(crashed, pair(11.0));
    }

    #[test]
    fn test_repel_only_pushes() {
        let spawn = pair(10.0);
        let bone = Bone::from_spec(0, BoneSpec::repel(0, 1), &spawn, 0.0285).unwrap();
        assert_eq!(bone.rest_length(), 5.0);

        // Farther than rest: untouched
        let mut far = pair(8.0);
        bone.apply(&mut far, false);
        assert_eq!(far, pair(8.0));

        // Closer than rest: pushed back out to rest
        let mut near = pair(2.0);
        bone.apply(&mut near, false);
        let length = near[0].location.distance(near[1].location);
        assert!((length - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_specs_rejected() {
        let spawn = pair(10.0);
        assert_eq!(
            Bone::from_spec(3, BoneSpec::bind(0, 2), &spawn, 0.0285),
            Err(BodyError::PointOutOfRange {
                bone: 3,
                point: 2,
                count: 2
            })
        );
        assert_eq!(
            Bone::from_spec(0, BoneSpec::bind(1, 1), &spawn, 0.0285),
            Err(BodyError::SelfReference { bone: 0, point: 1 })
        );
        assert_eq!(
            Bone::from_spec(0, BoneSpec::bind(0, 1), &pair(0.0), 0.0285),
            Err(BodyError::ZeroLength { bone: 0 })
        );
        assert!(matches!(
            Bone::from_spec(0, BoneSpec::breakable(0, 1), &spawn, -1.0),
            Err(BodyError::InvalidEndurance { .. })
        ));
        // Endurance only matters for breakable bones
        assert!(Bone::from_spec(0, BoneSpec::bind(0, 1), &spawn, f64::NAN).is_ok());
    }

    #[test]
    fn test_scarf_segments_grow_along_chain() {
        let scarf = Scarf::new(0, 4, 1).unwrap();
        let points = scarf.spawn(DVec2::ZERO, DVec2::ZERO);
        assert_eq!(points.len(), 4);
        let gaps: Vec<f64> = std::iter::once(points[0].location.x.abs())
            .chain(points.windows(2).map(|w| w[0].location.distance(w[1].location)))
            .collect();
        for w in gaps.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn test_scarf_relax_converges() {
        let scarf = Scarf::new(0, 3, 1).unwrap();
        let anchor = DVec2::ZERO;
        let mut points = vec![
            SimulationPoint::at_rest(DVec2::new(-10.0, 0.0), 0.0),
            SimulationPoint::at_rest(DVec2::new(-20.0, 0.0), 0.0),
            SimulationPoint::at_rest(DVec2::new(-30.0, 0.0), 0.0),
        ];
        for _ in 0..200 {
            scarf.relax(anchor, &mut points);
        }
        let first = points[0].location.distance(anchor);
        assert!((first - SCARF_SEGMENT_BASE).abs() < 1e-6);
        let second = points[0].location.distance(points[1].location);
        assert!((second - (SCARF_SEGMENT_BASE + SCARF_SEGMENT_GROWTH)).abs() < 1e-6);
    }

    #[test]
    fn test_scarf_anchor_validated() {
        assert_eq!(
            Scarf::new(5, 3, 5),
            Err(BodyError::ScarfAnchor { anchor: 5, count: 5 })
        );
    }
}
