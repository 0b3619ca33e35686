//! Hard clamp camera

use glam::DVec2;

use super::engine::{CameraContext, CameraStrategy};

/// Follows the rider's frame-to-frame movement, held inside the bounding box
#[derive(Debug, Clone, Copy, Default)]
pub struct ClampCamera;

impl CameraStrategy for ClampCamera {
    fn step(&self, ctx: &CameraContext<'_>, prev_offset: DVec2, frame: usize) -> DVec2 {
        ctx.bounding_box(frame)
            .clamp(prev_offset + ctx.entry(frame).camera_offset)
    }
}
