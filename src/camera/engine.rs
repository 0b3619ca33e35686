//! Camera recurrence engine
//!
//! Strategies advance an offset from the rider center one frame at a time.
//! [`Camera`] replays that recurrence from the nearest checkpoint (taken every
//! [`CAMERA_CHECKPOINT_INTERVAL`] frames) or from a one-frame memo, so
//! scrubbing and forward playback both stay cheap.

use std::collections::BTreeMap;
use std::fmt::Debug;

use glam::DVec2;

use super::bounding_box::CameraBoundingBox;
use crate::consts::CAMERA_CHECKPOINT_INTERVAL;
use crate::timeline::{CameraEntry, Timeline};

/// What a strategy may look at while stepping
#[derive(Debug, Clone, Copy)]
pub struct CameraContext<'a> {
    entries: &'a [CameraEntry],
    zoom: f64,
    smooth: bool,
}

impl<'a> CameraContext<'a> {
    /// `entries` must not be empty
    pub fn new(entries: &'a [CameraEntry], zoom: f64, smooth: bool) -> Self {
        Self {
            entries,
            zoom,
            smooth,
        }
    }

    /// Entry for `frame`, or the last known one past the end
    pub fn entry(&self, frame: usize) -> &CameraEntry {
        &self.entries[frame.min(self.entries.len() - 1)]
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Offset bounds for `frame`, sized by that frame's speed
    pub fn bounding_box(&self, frame: usize) -> CameraBoundingBox {
        CameraBoundingBox::for_speed(self.zoom, self.entry(frame).ppf, self.smooth)
    }
}

/// One-step camera recurrence over an offset from the rider center
pub trait CameraStrategy: Debug {
    /// Next offset from the previous one. Called for frames >= 1; frame 0 is
    /// always centered on the rider.
    fn step(&self, ctx: &CameraContext<'_>, prev_offset: DVec2, frame: usize) -> DVec2;

    /// Offset actually shown for `frame` given the recurrence state there
    fn present(&self, _ctx: &CameraContext<'_>, offset: DVec2, _frame: usize) -> DVec2 {
        offset
    }

    /// Frames past the requested one that `present` reads
    fn lookahead(&self) -> usize {
        0
    }
}

impl<S: CameraStrategy + ?Sized> CameraStrategy for Box<S> {
    fn step(&self, ctx: &CameraContext<'_>, prev_offset: DVec2, frame: usize) -> DVec2 {
        (**self).step(ctx, prev_offset, frame)
    }

    fn present(&self, ctx: &CameraContext<'_>, offset: DVec2, frame: usize) -> DVec2 {
        (**self).present(ctx, offset, frame)
    }

    fn lookahead(&self) -> usize {
        (**self).lookahead()
    }
}

/// World-space visible rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: DVec2,
    pub size: DVec2,
}

impl Viewport {
    pub fn center(&self) -> DVec2 {
        self.origin + self.size / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Memo {
    frame: usize,
    zoom: f64,
    offset: DVec2,
}

/// Per-timeline camera cache around a strategy
#[derive(Debug, Clone)]
pub struct Camera<S> {
    strategy: S,
    smooth: bool,
    /// Copied from the timeline, frame-indexed
    entries: Vec<CameraEntry>,
    stale_origin: bool,
    /// Timeline generation the cache was last synced to
    generation: Option<u64>,
    /// Recurrence state at multiples of the checkpoint interval, for `checkpoint_zoom`
    checkpoints: BTreeMap<usize, DVec2>,
    checkpoint_zoom: Option<f64>,
    memo: Option<Memo>,
}

impl<S: CameraStrategy> Camera<S> {
    pub fn new(strategy: S, smooth: bool) -> Self {
        Self {
            strategy,
            smooth,
            entries: Vec::new(),
            stale_origin: false,
            generation: None,
            checkpoints: BTreeMap::new(),
            checkpoint_zoom: None,
            memo: None,
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn smooth(&self) -> bool {
        self.smooth
    }

    /// Number of checkpoints currently held
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Camera center in world space for `frame` at `zoom`. `zoom` must be
    /// finite and positive.
    pub fn frame_camera(&mut self, timeline: &mut Timeline, frame: usize, zoom: f64) -> DVec2 {
        debug_assert!(zoom.is_finite() && zoom > 0.0, "invalid camera zoom {zoom}");
        self.sync(timeline);
        self.fill_entries(timeline, frame + self.strategy.lookahead());
        self.set_zoom(zoom);

        let offset = self.recurrence(frame, zoom);
        let ctx = CameraContext::new(&self.entries, zoom, self.smooth);
        ctx.entry(frame).rider_center + self.strategy.present(&ctx, offset, frame)
    }

    /// Visible world rectangle for a screen of `screen` pixels
    pub fn viewport(&mut self, timeline: &mut Timeline, frame: usize, zoom: f64, screen: DVec2) -> Viewport {
        let center = self.frame_camera(timeline, frame, zoom);
        let size = screen / zoom;
        Viewport {
            origin: center - size / 2.0,
            size,
        }
    }

    /// Forget everything derived from frames `>= frame`
    pub fn invalidate(&mut self, frame: usize) {
        let keep_below = frame.div_ceil(CAMERA_CHECKPOINT_INTERVAL) * CAMERA_CHECKPOINT_INTERVAL;
        self.checkpoints.retain(|&f, _| f < keep_below || f == 0);
        if self.memo.is_some_and(|m| m.frame >= frame) {
            self.memo = None;
        }
        self.entries.truncate(frame);
        self.stale_origin = true;
    }

    /// Drop all cached state
    pub fn reset(&mut self) {
        self.entries.clear();
        self.stale_origin = false;
        self.generation = None;
        self.checkpoints.clear();
        self.checkpoint_zoom = None;
        self.memo = None;
    }

    /// Catch up with edits made to `timeline` since the last read
    fn sync(&mut self, timeline: &Timeline) {
        if let Some(from) = self.generation.and_then(|seen| timeline.invalidated_since(seen)) {
            self.invalidate(from);
        }
        self.generation = Some(timeline.generation());
    }

    fn fill_entries(&mut self, timeline: &mut Timeline, through: usize) {
        if self.stale_origin {
            if let Some(origin) = self.entries.first_mut() {
                *origin = timeline.get_frame(0).camera;
            }
            self.stale_origin = false;
        }
        if self.entries.len() > through {
            return;
        }
        let start = self.entries.len();
        let frames = timeline.get_frames(start, through + 1 - start);
        self.entries.extend(frames.iter().map(|f| f.camera));
    }

    fn set_zoom(&mut self, zoom: f64) {
        if self.checkpoint_zoom != Some(zoom) {
            self.checkpoints.clear();
            self.checkpoint_zoom = Some(zoom);
            self.memo = None;
        }
        self.checkpoints.entry(0).or_insert(DVec2::ZERO);
    }

    fn recurrence(&mut self, frame: usize, zoom: f64) -> DVec2 {
        let ctx = CameraContext::new(&self.entries, zoom, self.smooth);

        let (start, mut offset) = match self.memo {
            Some(m) if m.zoom == zoom && m.frame == frame => return m.offset,
            Some(m) if m.zoom == zoom && m.frame + 1 == frame => (m.frame, m.offset),
            _ => self
                .checkpoints
                .range(..=frame)
                .next_back()
                .map(|(&f, &o)| (f, o))
                .unwrap_or((0, DVec2::ZERO)),
        };

        for f in start + 1..=frame {
            offset = self.strategy.step(&ctx, offset, f);
            if f % CAMERA_CHECKPOINT_INTERVAL == 0 {
                self.checkpoints.insert(f, offset);
            }
        }
        self.memo = Some(Memo {
            frame,
            zoom,
            offset,
        });
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ClampCamera;
    use crate::settings::PhysicsConfig;
    use crate::sim::{Line, LineId};
    use crate::track::Track;

    fn timeline() -> Timeline {
        Timeline::new(Track::demo(7, 30), PhysicsConfig::default()).unwrap()
    }

    /// Counts steps so replays can be observed
    #[derive(Debug, Default)]
    struct Counting {
        steps: std::cell::Cell<usize>,
    }

    impl CameraStrategy for Counting {
        fn step(&self, ctx: &CameraContext<'_>, prev_offset: DVec2, frame: usize) -> DVec2 {
            self.steps.set(self.steps.get() + 1);
            ctx.bounding_box(frame).clamp(prev_offset + ctx.entry(frame).camera_offset)
        }
    }

    #[test]
    fn test_frame_zero_is_rider_center() {
        let mut tl = timeline();
        let mut camera = Camera::new(ClampCamera, true);
        let center = tl.get_frame(0).camera.rider_center;
        assert_eq!(camera.frame_camera(&mut tl, 0, 1.0), center);
    }

    #[test]
    fn test_checkpoints_and_memo_avoid_replay() {
        let mut tl = timeline();
        let mut camera = Camera::new(Counting::default(), true);

        camera.frame_camera(&mut tl, 100, 1.0);
        assert_eq!(camera.strategy().steps.get(), 100);
        assert_eq!(camera.checkpoint_count(), 3); // 0, 40, 80

        // Next frame uses the memo
        camera.frame_camera(&mut tl, 101, 1.0);
        assert_eq!(camera.strategy().steps.get(), 101);

        // Scrubbing back replays from checkpoint 40
        camera.frame_camera(&mut tl, 45, 1.0);
        assert_eq!(camera.strategy().steps.get(), 106);
    }

    #[test]
    fn test_replay_matches_sequential() {
        let mut tl = timeline();
        let mut sequential = Camera::new(ClampCamera, true);
        let mut last = DVec2::ZERO;
        for frame in 0..=130 {
            last = sequential.frame_camera(&mut tl, frame, 1.5);
        }
        let mut jumping = Camera::new(ClampCamera, true);
        jumping.frame_camera(&mut tl, 60, 1.5);
        assert_eq!(jumping.frame_camera(&mut tl, 130, 1.5), last);
    }

    #[test]
    fn test_zoom_change_clears_offsets() {
        let mut tl = timeline();
        let mut camera = Camera::new(Counting::default(), true);
        camera.frame_camera(&mut tl, 90, 1.0);
        camera.frame_camera(&mut tl, 90, 2.0);
        // No memo or checkpoints at the new zoom: full replay
        assert_eq!(camera.strategy().steps.get(), 180);
    }

    #[test]
    fn test_track_edit_invalidates_camera() {
        let mut tl = timeline();
        let mut camera = Camera::new(ClampCamera, true);
        camera.frame_camera(&mut tl, 150, 1.0);
        assert_eq!(camera.checkpoint_count(), 4);

        let id = tl.track().next_id();
        tl.add_line(Line::standard(id.0, DVec2::new(200.0, 0.0), DVec2::new(260.0, 60.0)).unwrap())
            .unwrap();
        let edited = camera.frame_camera(&mut tl, 150, 1.0);

        let mut fresh_tl = tl.clone();
        let mut fresh = Camera::new(ClampCamera, true);
        assert_eq!(fresh.frame_camera(&mut fresh_tl, 150, 1.0), edited);
    }

    #[test]
    fn test_every_camera_sees_an_edit() {
        let mut tl = timeline();
        let mut a = Camera::new(ClampCamera, true);
        let mut b = Camera::new(ClampCamera, true);
        a.frame_camera(&mut tl, 150, 1.0);
        b.frame_camera(&mut tl, 150, 1.0);

        tl.remove_line(LineId(2)).unwrap();
        let seen_by_a = a.frame_camera(&mut tl, 150, 1.0);
        let seen_by_b = b.frame_camera(&mut tl, 150, 1.0);
        assert_eq!(seen_by_a, seen_by_b);

        let mut fresh_tl = tl.clone();
        let mut fresh = Camera::new(ClampCamera, true);
        assert_eq!(fresh.frame_camera(&mut fresh_tl, 150, 1.0), seen_by_b);
    }

    #[test]
    fn test_camera_catches_up_on_several_edits() {
        let mut tl = timeline();
        let mut camera = Camera::new(Counting::default(), true);
        camera.frame_camera(&mut tl, 130, 1.0);
        assert_eq!(camera.checkpoint_count(), 4);

        tl.invalidate(100);
        tl.invalidate(50);
        camera.frame_camera(&mut tl, 20, 1.0);
        // Lowest of the two edits: only 0 and 40 survive
        assert_eq!(camera.checkpoint_count(), 2);
    }

    #[test]
    #[should_panic(expected = "invalid camera zoom")]
    #[cfg(debug_assertions)]
    fn test_rejects_non_positive_zoom() {
        let mut tl = timeline();
        let mut camera = Camera::new(ClampCamera, true);
        camera.frame_camera(&mut tl, 10, 0.0);
    }

    #[test]
    fn test_invalidate_rounds_checkpoints_up() {
        let mut tl = timeline();
        let mut camera = Camera::new(Counting::default(), true);
        camera.frame_camera(&mut tl, 130, 1.0);
        camera.invalidate(41);
        // 0 and 40 survive, 80 and 120 are gone
        assert_eq!(camera.checkpoint_count(), 2);
        camera.reset();
        assert_eq!(camera.checkpoint_count(), 0);
    }

    #[test]
    fn test_viewport_size_follows_zoom() {
        let mut tl = timeline();
        let mut camera = Camera::new(ClampCamera, false);
        let vp = camera.viewport(&mut tl, 10, 2.0, DVec2::new(1280.0, 720.0));
        assert_eq!(vp.size, DVec2::new(640.0, 360.0));
        let center = camera.frame_camera(&mut tl, 10, 2.0);
        assert!((vp.center() - center).length() < 1e-9);
    }
}
