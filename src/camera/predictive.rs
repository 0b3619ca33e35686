//! Look-ahead camera

use glam::DVec2;

use super::clamp::ClampCamera;
use super::engine::{CameraContext, CameraStrategy};
use crate::consts::PREDICTIVE_HORIZON;
use crate::sim::lerp;

/// Hard clamp stepping, shown as the average of where the clamped camera will
/// be over the next `horizon` frames relative to the rider now. Over the first
/// `horizon` frames the view blends from the rider center to that prediction.
#[derive(Debug, Clone, Copy)]
pub struct PredictiveCamera {
    horizon: usize,
}

impl Default for PredictiveCamera {
    fn default() -> Self {
        Self::new(PREDICTIVE_HORIZON)
    }
}

impl PredictiveCamera {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon: horizon.max(1),
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }
}

impl CameraStrategy for PredictiveCamera {
    fn step(&self, ctx: &CameraContext<'_>, prev_offset: DVec2, frame: usize) -> DVec2 {
        ClampCamera.step(ctx, prev_offset, frame)
    }

    fn present(&self, ctx: &CameraContext<'_>, offset: DVec2, frame: usize) -> DVec2 {
        let origin = ctx.entry(frame).rider_center;
        let mut ahead = offset;
        let mut sum = offset;
        for k in 1..=self.horizon {
            ahead = ClampCamera.step(ctx, ahead, frame + k);
            sum += ctx.entry(frame + k).rider_center + ahead - origin;
        }
        let predicted = sum / (self.horizon + 1) as f64;
        let blend = frame.min(self.horizon) as f64 / self.horizon as f64;
        lerp(DVec2::ZERO, predicted, blend)
    }

    fn lookahead(&self) -> usize {
        self.horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::settings::PhysicsConfig;
    use crate::sim::Line;
    use crate::timeline::{CameraEntry, Timeline};
    use crate::track::Track;

    #[test]
    fn test_frame_zero_is_rider_center() {
        // Flat floor, rider spawned at rest just above it
        let mut track = Track::new();
        track
            .insert(Line::standard(1, DVec2::new(-100.0, 5.5), DVec2::new(100.0, 5.5)).unwrap())
            .unwrap();
        let physics = PhysicsConfig {
            start_velocity: DVec2::ZERO,
            ..PhysicsConfig::default()
        };
        let mut tl = Timeline::new(track, physics).unwrap();
        let mut camera = Camera::new(PredictiveCamera::default(), true);
        let center = tl.get_frame(0).camera.rider_center;
        assert_eq!(camera.frame_camera(&mut tl, 0, 1.0), center);
    }

    #[test]
    fn test_spawn_blend_starts_at_rider() {
        let still = CameraEntry {
            rider_center: DVec2::new(100.0, 50.0),
            camera_offset: DVec2::ZERO,
            ppf: 0.0,
        };
        let entries = vec![still; 60];
        let ctx = CameraContext::new(&entries, 1.0, false);
        let camera = PredictiveCamera::default();
        let offset = DVec2::new(-30.0, 0.0);

        // A quarter of the way through the blend
        let shown = camera.present(&ctx, offset, 10);
        assert!((shown - DVec2::new(-7.5, 0.0)).length() < 1e-9);
        assert_eq!(camera.present(&ctx, offset, 0), DVec2::ZERO);
        let settled = camera.present(&ctx, offset, PREDICTIVE_HORIZON);
        assert!((settled - offset).length() < 1e-9);
    }

    #[test]
    fn test_leads_the_hard_clamp() {
        let mut track = Track::new();
        track
            .insert(Line::standard(1, DVec2::new(-50.0, 5.5), DVec2::new(5000.0, 5.5)).unwrap())
            .unwrap();
        let physics = PhysicsConfig {
            start_velocity: DVec2::new(6.0, 0.0),
            ..PhysicsConfig::default()
        };
        let mut tl = Timeline::new(track, physics).unwrap();
        let mut predictive = Camera::new(PredictiveCamera::default(), false);
        let mut hard = Camera::new(ClampCamera, false);
        let frame = 60;
        let ahead = predictive.frame_camera(&mut tl, frame, 1.0);
        let behind = hard.frame_camera(&mut tl, frame, 1.0);
        // The hard clamp trails the rider; prediction pulls the view forward
        assert!(behind.x < tl.get_frame(frame).camera.rider_center.x);
        assert!(ahead.x > behind.x);
    }

    #[test]
    fn test_horizon_is_at_least_one() {
        let camera = PredictiveCamera::new(0);
        assert_eq!(camera.horizon(), 1);
        assert_eq!(PredictiveCamera::default().lookahead(), PREDICTIVE_HORIZON);
    }
}
