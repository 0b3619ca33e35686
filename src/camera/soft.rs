//! Elastic camera
//!
//! Works on the clamped offset in polar form around the rider. Only the
//! radial length is eased: it grows quickly (damped by the framing ratio and
//! by how far the direction swung) while the rider pulls away, and decays
//! slowly toward the rider otherwise. The angle follows the target directly.

use std::f64::consts::PI;

use glam::DVec2;

use super::engine::{CameraContext, CameraStrategy};
use crate::consts::{MAX_CAM_RATIO, SOFT_PULL, SOFT_PUSH};
use crate::{cartesian_to_polar, normalize_angle, polar_to_cartesian};

#[derive(Debug, Clone, Copy)]
pub struct SoftCamera {
    push: f64,
    pull: f64,
}

impl Default for SoftCamera {
    fn default() -> Self {
        Self {
            push: SOFT_PUSH,
            pull: SOFT_PULL,
        }
    }
}

impl SoftCamera {
    pub fn new(push: f64, pull: f64) -> Self {
        Self {
            push: push.clamp(0.0, 1.0),
            pull: pull.clamp(0.0, 1.0),
        }
    }
}

impl CameraStrategy for SoftCamera {
    fn step(&self, ctx: &CameraContext<'_>, prev_offset: DVec2, frame: usize) -> DVec2 {
        let bbox = ctx.bounding_box(frame);
        let target = bbox.smooth_clamp(prev_offset + ctx.entry(frame).camera_offset);
        let (prev_len, prev_angle) = cartesian_to_polar(prev_offset);
        let (target_len, target_angle) = cartesian_to_polar(target);
        if target_len <= f64::EPSILON {
            return DVec2::ZERO;
        }

        let length = if target_len > prev_len {
            let swing = if prev_len > f64::EPSILON {
                normalize_angle(target_angle - prev_angle).abs() / PI
            } else {
                0.0
            };
            let damper = bbox.ratio() / MAX_CAM_RATIO - swing / 2.0;
            prev_len + ((target_len - prev_len) * self.push * damper).max(0.0)
        } else {
            target_len * (1.0 - self.pull)
        };
        polar_to_cartesian(length, target_angle)
    }
}
