//! Camera module
//!
//! Turns cached rider frames into a camera position per frame. A strategy
//! defines the per-frame recurrence; [`Camera`] caches it per timeline.

pub mod bounding_box;
pub mod clamp;
pub mod engine;
pub mod predictive;
pub mod soft;

use serde::{Deserialize, Serialize};

pub use bounding_box::CameraBoundingBox;
pub use clamp::ClampCamera;
pub use engine::{Camera, CameraContext, CameraStrategy, Viewport};
pub use predictive::PredictiveCamera;
pub use soft::SoftCamera;

use crate::settings::CameraSettings;

/// Camera behaviour selectable from settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    Hard,
    Predictive,
    Soft,
}

impl CameraMode {
    pub fn strategy(self) -> Box<dyn CameraStrategy> {
        match self {
            CameraMode::Hard => Box::new(ClampCamera),
            CameraMode::Predictive => Box::new(PredictiveCamera::default()),
            CameraMode::Soft => Box::new(SoftCamera::default()),
        }
    }
}

impl Camera<Box<dyn CameraStrategy>> {
    /// Camera for the mode chosen in settings
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Camera::new(settings.mode.strategy(), settings.smooth)
    }
}
