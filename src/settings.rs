//! Simulation and camera settings
//!
//! Physics constants are per track; camera settings are per viewer. Both are
//! plain serde types, persisted as JSON.

use std::fs;
use std::path::Path;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::camera::CameraMode;
use crate::consts::{ENDURANCE_FACTOR, GRAVITY, ITERATIONS, START_VELOCITY};
use crate::error::ConfigError;

/// Per-track physics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Added to every point each frame, y grows downward
    pub gravity: DVec2,
    /// Bone/collision relaxation passes per frame
    pub iterations: u32,
    /// Stretch tolerance of breakable bones relative to rest length
    pub endurance_factor: f64,
    /// Where the rider spawns
    pub start_position: DVec2,
    /// Velocity of every rider point at spawn
    pub start_velocity: DVec2,
    /// Simulate the decorative scarf
    pub scarf: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            iterations: ITERATIONS,
            endurance_factor: ENDURANCE_FACTOR,
            start_position: DVec2::ZERO,
            start_velocity: START_VELOCITY,
            scarf: true,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::OutOfRange {
                field: "physics.iterations",
                value: 0.0,
            });
        }
        if !(self.endurance_factor.is_finite() && self.endurance_factor > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "physics.endurance_factor",
                value: self.endurance_factor,
            });
        }
        for (field, v) in [
            ("physics.gravity", self.gravity),
            ("physics.start_position", self.start_position),
            ("physics.start_velocity", self.start_velocity),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: f64::NAN,
                });
            }
        }
        Ok(())
    }
}

/// Viewer camera preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub mode: CameraMode,
    /// Widen framing with rider speed
    pub smooth: bool,
    /// Base zoom; triggers animate away from it during playback
    pub zoom: f64,
    /// Screen size in pixels, used to turn the camera center into a viewport
    pub viewport: DVec2,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            mode: CameraMode::Soft,
            smooth: true,
            zoom: 1.0,
            viewport: DVec2::new(1280.0, 720.0),
        }
    }
}

impl CameraSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "camera.zoom",
                value: self.zoom,
            });
        }
        if !(self.viewport.is_finite() && self.viewport.x > 0.0 && self.viewport.y > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "camera.viewport",
                value: self.viewport.x.min(self.viewport.y),
            });
        }
        Ok(())
    }
}

/// All settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsConfig,
    pub camera: CameraSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.camera.validate()
    }

    /// Parse and validate settings JSON
    pub fn from_json(json: &str, origin: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json).map_err(|source| ConfigError::Json {
            path: origin.to_string(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json, &path.display().to_string())?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
