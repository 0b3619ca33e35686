//! rider-sim - deterministic line-riding physics and camera core
//!
//! Core modules:
//! - `sim`: Verlet rider body, line collisions, frame stepper
//! - `track`: Id-keyed line store and plain line records
//! - `timeline`: Lazily extended, invalidatable per-frame pose cache
//! - `camera`: Bounding box, frame-cache engine and camera strategies
//! - `playback`: Forward playback cursor, trigger events and zoom
//! - `settings`: Physics and camera configuration

pub mod camera;
pub mod error;
pub mod playback;
pub mod settings;
pub mod sim;
pub mod timeline;
pub mod track;

pub use camera::{Camera, CameraBoundingBox, CameraMode, ClampCamera, PredictiveCamera, SoftCamera};
pub use error::{BodyError, ConfigError, TrackError};
pub use playback::{Playback, TriggerEvent};
pub use settings::{CameraSettings, PhysicsConfig, Settings};
pub use timeline::{CameraEntry, CancelToken, RiderFrame, Timeline};
pub use track::{LineRecord, Track};

use glam::DVec2;

/// Simulation and camera constants
pub mod consts {
    use glam::DVec2;

    /// Perpendicular capture distance of a collidable line
    pub const ZONE: f64 = 10.0;
    /// Maximum extension of a line's collision interval, as a fraction of its length
    pub const MAX_EXTENSION_RATIO: f64 = 0.25;
    /// Acceleration per multiplier step on accelerant lines
    pub const ACCELERATION_BASE: f64 = 0.1;

    /// Default gravity, y grows downward
    pub const GRAVITY: DVec2 = DVec2::new(0.0, 0.175);
    /// Constraint/collision relaxation passes per frame
    pub const ITERATIONS: u32 = 6;
    /// Stretch tolerance of breakable binds, relative to rest length
    pub const ENDURANCE_FACTOR: f64 = 0.0285;
    /// Rider spawn velocity
    pub const START_VELOCITY: DVec2 = DVec2::new(0.4, 0.0);

    /// Air friction applied to scarf points each frame
    pub const SCARF_AIR_FRICTION: f64 = 0.9;
    /// Rest length of the first scarf segment
    pub const SCARF_SEGMENT_BASE: f64 = 1.5;
    /// Rest length added per scarf segment along the chain
    pub const SCARF_SEGMENT_GROWTH: f64 = 0.25;
    /// Rider speed above which the scarf starts to flutter
    pub const SCARF_FLUTTER_SPEED: f64 = 3.0;
    /// Flutter jitter per unit of rider speed
    pub const SCARF_FLUTTER_SCALE: f64 = 0.02;

    /// Frames between camera offset checkpoints
    pub const CAMERA_CHECKPOINT_INTERVAL: usize = 40;
    /// Look-ahead horizon of the predictive camera
    pub const PREDICTIVE_HORIZON: usize = 40;

    /// Bounding box ratio for slow riders (tight framing)
    pub const MIN_CAM_RATIO: f64 = 0.10;
    /// Bounding box ratio for fast riders (wide framing)
    pub const MAX_CAM_RATIO: f64 = 0.30;
    /// Blend between rectangle (0) and ellipse (1) clamping
    pub const CAMERA_ROUNDNESS: f64 = 0.8;
    /// Speed at or below which the smooth ratio bottoms out
    pub const SMOOTH_SPEED_FLOOR: f64 = 5.0;
    /// Speed at or above which the smooth ratio tops out
    pub const SMOOTH_SPEED_CEILING: f64 = 50.0;
    /// Screen width the bounding box ratio is relative to
    pub const BOX_BASE_WIDTH: f64 = 1280.0;
    /// Bounding box aspect ratio (width / height)
    pub const BOX_ASPECT: f64 = 16.0 / 9.0;

    /// Soft camera growth factor when the rider moves away from center
    pub const SOFT_PUSH: f64 = 0.8;
    /// Soft camera per-frame decay toward center
    pub const SOFT_PULL: f64 = 0.01;
}

/// Convert polar (length, angle) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(length: f64, angle: f64) -> DVec2 {
    DVec2::new(length * angle.cos(), length * angle.sin())
}

/// Convert cartesian (x, y) to polar (length, angle)
#[inline]
pub fn cartesian_to_polar(v: DVec2) -> (f64, f64) {
    (v.length(), v.y.atan2(v.x))
}

/// Wrap an angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    while angle >= PI {
        angle -= TAU;
    }
    while angle < -PI {
        angle += TAU;
    }
    angle
}
