//! Deterministic simulation module
//!
//! Everything that decides where the rider is lives here. This module must be
//! pure and deterministic:
//! - A frame depends only on the previous frame and the line set
//! - Stable iteration order (bones in body order, lines in id order)
//! - Seeded RNG only
//! - No camera, rendering or platform dependencies

pub mod bone;
pub mod collision;
pub mod geometry;
pub mod line;
pub mod point;
pub mod state;
pub mod tick;

pub use bone::{Bone, BoneKind, BoneOutcome, BoneSpec, BoneSpecKind, Scarf};
pub use collision::Contact;
pub use geometry::{lerp, perpendicular_left, perpendicular_right, segment_intersection};
pub use line::{Extension, Line, LineId, LineKind, TriggerDescriptor};
pub use point::SimulationPoint;
pub use state::{Rider, RiderBody, RiderState, SCARF_SEGMENTS, parts};
pub use tick::{StepOutcome, tick};
