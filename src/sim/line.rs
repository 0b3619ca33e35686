//! Track lines
//!
//! A line is two endpoints plus derived constants (difference, unit normal,
//! inverse squared length, collision interval). The constants are private and
//! rebuilt by every mutator, so they always match the geometry.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collision::{self, Contact};
use super::geometry::perpendicular_right;
use super::point::SimulationPoint;
use crate::consts::{ACCELERATION_BASE, MAX_EXTENSION_RATIO, ZONE};
use crate::error::TrackError;

/// Line identifier, unique within a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub i64);

impl LineId {
    /// Sentinel for a line that was never given an id
    pub const UNSET: Self = Self(i64::MIN);

    pub fn is_set(&self) -> bool {
        *self != Self::UNSET
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#unset")
        }
    }
}

/// Which ends of a line have their collision interval widened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Extension {
    #[default]
    None,
    Left,
    Right,
    Both,
}

impl Extension {
    /// Decode record flags (bit 0 = left, bit 1 = right)
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Extension::None),
            1 => Some(Extension::Left),
            2 => Some(Extension::Right),
            3 => Some(Extension::Both),
            _ => None,
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            Extension::None => 0,
            Extension::Left => 1,
            Extension::Right => 2,
            Extension::Both => 3,
        }
    }

    /// Start of the line is extended
    pub fn left(&self) -> bool {
        matches!(self, Extension::Left | Extension::Both)
    }

    /// End of the line is extended
    pub fn right(&self) -> bool {
        matches!(self, Extension::Right | Extension::Both)
    }
}

/// Zoom change requested when an accelerant line catches the rider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    pub target_zoom: f64,
    pub frame_count: u32,
}

/// Line kinds
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// Plain collision line
    Standard,
    /// Collision line that also accelerates along its direction
    Accelerant {
        multiplier: i32,
        trigger: Option<TriggerDescriptor>,
    },
    /// Decoration only, never collides
    Scenery { width: f64 },
    /// Reports points entering its capture zone without moving them
    InteractionTest,
}

impl LineKind {
    /// Record discriminant
    pub fn discriminant(&self) -> u8 {
        match self {
            LineKind::Standard => 0,
            LineKind::Accelerant { .. } => 1,
            LineKind::Scenery { .. } => 2,
            LineKind::InteractionTest => 3,
        }
    }
}

/// Values derived from the endpoints and flags
#[derive(Debug, Clone, Copy, PartialEq)]
struct LineConstants {
    diff: DVec2,
    normal: DVec2,
    inv_len_sq: f64,
    length: f64,
    limit_left: f64,
    limit_right: f64,
    acceleration: DVec2,
}

/// A track line
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    id: LineId,
    kind: LineKind,
    start: DVec2,
    end: DVec2,
    inverted: bool,
    extension: Extension,
    constants: LineConstants,
}

impl Line {
    pub fn new(
        id: LineId,
        kind: LineKind,
        start: DVec2,
        end: DVec2,
        inverted: bool,
        extension: Extension,
    ) -> Result<Self, TrackError> {
        if !id.is_set() {
            return Err(TrackError::UnsetId);
        }
        validate_kind(id, &kind)?;
        let constants = compute_constants(id, &kind, start, end, inverted, extension)?;
        Ok(Self {
            id,
            kind,
            start,
            end,
            inverted,
            extension,
            constants,
        })
    }

    pub fn standard(id: i64, start: DVec2, end: DVec2) -> Result<Self, TrackError> {
        Self::new(LineId(id), LineKind::Standard, start, end, false, Extension::None)
    }

    pub fn accelerant(id: i64, start: DVec2, end: DVec2, multiplier: i32) -> Result<Self, TrackError> {
        Self::new(
            LineId(id),
            LineKind::Accelerant {
                multiplier,
                trigger: None,
            },
            start,
            end,
            false,
            Extension::None,
        )
    }

    pub fn scenery(id: i64, start: DVec2, end: DVec2, width: f64) -> Result<Self, TrackError> {
        Self::new(LineId(id), LineKind::Scenery { width }, start, end, false, Extension::None)
    }

    pub fn interaction_test(id: i64, start: DVec2, end: DVec2) -> Result<Self, TrackError> {
        Self::new(LineId(id), LineKind::InteractionTest, start, end, false, Extension::None)
    }

    /// Builder-style inversion
    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.set_inverted(inverted);
        self
    }

    /// Builder-style extension
    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.set_extension(extension);
        self
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn kind(&self) -> &LineKind {
        &self.kind
    }

    pub fn start(&self) -> DVec2 {
        self.start
    }

    pub fn end(&self) -> DVec2 {
        self.end
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn extension(&self) -> Extension {
        self.extension
    }

    /// `end - start`
    pub fn diff(&self) -> DVec2 {
        self.constants.diff
    }

    /// Unit normal pointing into the solid side
    pub fn normal(&self) -> DVec2 {
        self.constants.normal
    }

    pub fn length(&self) -> f64 {
        self.constants.length
    }

    pub fn inv_len_sq(&self) -> f64 {
        self.constants.inv_len_sq
    }

    /// Accepted projection interval along the line, 0 = start, 1 = end
    pub fn limits(&self) -> (f64, f64) {
        (self.constants.limit_left, self.constants.limit_right)
    }

    /// Acceleration given to caught points (zero for non-accelerant lines)
    pub fn acceleration(&self) -> DVec2 {
        self.constants.acceleration
    }

    pub fn trigger(&self) -> Option<TriggerDescriptor> {
        match self.kind {
            LineKind::Accelerant { trigger, .. } => trigger,
            _ => None,
        }
    }

    /// Whether the stepper tests this line at all
    pub fn is_collidable(&self) -> bool {
        !matches!(self.kind, LineKind::Scenery { .. })
    }

    /// Move both endpoints. A zero-length result is refused and the line is left as is.
    pub fn set_endpoints(&mut self, start: DVec2, end: DVec2) -> Result<(), TrackError> {
        let constants =
            compute_constants(self.id, &self.kind, start, end, self.inverted, self.extension)?;
        self.start = start;
        self.end = end;
        self.constants = constants;
        Ok(())
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
        self.recompute();
    }

    pub fn set_extension(&mut self, extension: Extension) {
        self.extension = extension;
        self.recompute();
    }

    pub fn set_multiplier(&mut self, value: i32) -> Result<(), TrackError> {
        match &mut self.kind {
            LineKind::Accelerant { multiplier, .. } => {
                if value < 1 {
                    return Err(TrackError::InvalidMultiplier {
                        id: self.id,
                        multiplier: value,
                    });
                }
                *multiplier = value;
            }
            _ => {
                return Err(TrackError::Unsupported {
                    id: self.id,
                    operation: "multiplier",
                });
            }
        }
        self.recompute();
        Ok(())
    }

    pub fn set_trigger(&mut self, value: Option<TriggerDescriptor>) -> Result<(), TrackError> {
        if let Some(t) = value {
            validate_trigger(self.id, t)?;
        }
        match &mut self.kind {
            LineKind::Accelerant { trigger, .. } => {
                *trigger = value;
                Ok(())
            }
            _ => Err(TrackError::Unsupported {
                id: self.id,
                operation: "trigger",
            }),
        }
    }

    /// Rebuild derived constants from the current geometry and flags
    fn recompute(&mut self) {
        // Geometry was validated when it was set; only flags changed here.
        if let Ok(constants) = compute_constants(
            self.id,
            &self.kind,
            self.start,
            self.end,
            self.inverted,
            self.extension,
        ) {
            self.constants = constants;
        }
    }

    /// Test a point against this line
    pub fn interact(&self, point: &SimulationPoint) -> Contact {
        match self.kind {
            LineKind::Scenery { .. } => Contact::NoHit,
            LineKind::Standard => match collision::capture(self, point) {
                Some(doty) => Contact::Collided(collision::resolve(self, point, doty)),
                None => Contact::NoHit,
            },
            LineKind::Accelerant { .. } => match collision::capture(self, point) {
                Some(doty) => {
                    let resolved = collision::resolve(self, point, doty);
                    Contact::Collided(resolved.with_previous(resolved.previous - self.acceleration()))
                }
                None => Contact::NoHit,
            },
            LineKind::InteractionTest => match collision::capture(self, point) {
                Some(_) => Contact::DiagnosticHit,
                None => Contact::NoHit,
            },
        }
    }
}

fn validate_trigger(id: LineId, trigger: TriggerDescriptor) -> Result<(), TrackError> {
    if !(trigger.target_zoom.is_finite() && trigger.target_zoom > 0.0) || trigger.frame_count == 0 {
        return Err(TrackError::InvalidTrigger {
            id,
            target_zoom: trigger.target_zoom,
            frame_count: trigger.frame_count,
        });
    }
    Ok(())
}

fn validate_kind(id: LineId, kind: &LineKind) -> Result<(), TrackError> {
    match *kind {
        LineKind::Accelerant { multiplier, trigger } => {
            if multiplier < 1 {
                return Err(TrackError::InvalidMultiplier { id, multiplier });
            }
            if let Some(t) = trigger {
                validate_trigger(id, t)?;
            }
        }
        LineKind::Scenery { width } => {
            if !(width.is_finite() && width > 0.0) {
                return Err(TrackError::InvalidWidth { id, width });
            }
        }
        LineKind::Standard | LineKind::InteractionTest => {}
    }
    Ok(())
}

fn compute_constants(
    id: LineId,
    kind: &LineKind,
    start: DVec2,
    end: DVec2,
    inverted: bool,
    extension: Extension,
) -> Result<LineConstants, TrackError> {
    if !(start.is_finite() && end.is_finite()) {
        return Err(TrackError::NonFinite { id });
    }
    let diff = end - start;
    let len_sq = diff.length_squared();
    if len_sq == 0.0 {
        return Err(TrackError::ZeroLength { id });
    }
    let length = len_sq.sqrt();

    let mut normal = perpendicular_right(diff) / length;
    if inverted {
        normal = -normal;
    }

    let ext = MAX_EXTENSION_RATIO.min(ZONE / length);
    let limit_left = if extension.left() { -ext } else { 0.0 };
    let limit_right = if extension.right() { 1.0 + ext } else { 1.0 };

    let acceleration = match *kind {
        LineKind::Accelerant { multiplier, .. } => {
            let direction = if inverted { -1.0 } else { 1.0 };
            diff / length * (ACCELERATION_BASE * multiplier as f64) * direction
        }
        _ => DVec2::ZERO,
    };

    Ok(LineConstants {
        diff,
        normal,
        inv_len_sq: 1.0 / len_sq,
        length,
        limit_left,
        limit_right,
        acceleration,
    })
}
