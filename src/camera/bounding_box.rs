//! Visible-region bounds for a camera offset

use glam::DVec2;

use crate::consts::{
    BOX_ASPECT, BOX_BASE_WIDTH, CAMERA_ROUNDNESS, MAX_CAM_RATIO, MIN_CAM_RATIO,
    SMOOTH_SPEED_CEILING, SMOOTH_SPEED_FLOOR,
};
use crate::sim::lerp;

/// Centered 16:9 rectangle limiting how far the camera may stray from its
/// center. Width is `BOX_BASE_WIDTH * ratio / zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBoundingBox {
    center: DVec2,
    half: DVec2,
    ratio: f64,
}

impl CameraBoundingBox {
    pub fn new(center: DVec2, zoom: f64, ratio: f64) -> Self {
        let ratio = ratio.clamp(MIN_CAM_RATIO, MAX_CAM_RATIO);
        let half_width = BOX_BASE_WIDTH * ratio / zoom / 2.0;
        Self {
            center,
            half: DVec2::new(half_width, half_width / BOX_ASPECT),
            ratio,
        }
    }

    /// Box around the origin for a frame moving at `ppf`
    pub fn for_speed(zoom: f64, ppf: f64, smooth: bool) -> Self {
        Self::new(DVec2::ZERO, zoom, Self::smooth_cam_ratio(ppf, smooth))
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn half_extents(&self) -> DVec2 {
        self.half
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn contains(&self, point: DVec2) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half.x && d.y <= self.half.y
    }

    /// Axis-aligned clamp into the rectangle
    pub fn clamp(&self, point: DVec2) -> DVec2 {
        point.clamp(self.center - self.half, self.center + self.half)
    }

    /// Clamp onto the inscribed ellipse
    pub fn ellipse_clamp(&self, point: DVec2) -> DVec2 {
        let rel = point - self.center;
        let scaled = rel / self.half;
        let r = scaled.length_squared();
        if r <= 1.0 {
            return point;
        }
        self.center + rel / r.sqrt()
    }

    /// Rectangle clamp blended toward the ellipse clamp
    pub fn smooth_clamp(&self, point: DVec2) -> DVec2 {
        lerp(self.clamp(point), self.ellipse_clamp(point), CAMERA_ROUNDNESS)
    }

    /// Framing ratio for a speed: tight when slow, wide when fast
    pub fn smooth_cam_ratio(ppf: f64, smooth: bool) -> f64 {
        if !smooth {
            return MAX_CAM_RATIO;
        }
        let t = ((ppf - SMOOTH_SPEED_FLOOR) / (SMOOTH_SPEED_CEILING - SMOOTH_SPEED_FLOOR)).clamp(0.0, 1.0);
        MIN_CAM_RATIO * (1.0 - t) + MAX_CAM_RATIO * t
    }
}
