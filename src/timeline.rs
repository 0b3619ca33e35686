//! Frame cache
//!
//! A [`Timeline`] owns one track, its physics and the computed frames
//! `[0, len)`. Frames are filled lazily by stepping from the last cached frame;
//! edits truncate the cache before they touch the track. Frame 0 (the spawn
//! pose) is always present.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::DVec2;

use crate::error::{ConfigError, TrackError};
use crate::settings::PhysicsConfig;
use crate::sim::{Extension, Line, LineId, Rider, RiderBody, TriggerDescriptor, tick};
use crate::track::Track;

/// Per-frame data the camera needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraEntry {
    pub rider_center: DVec2,
    /// Previous center minus this center: how far a still camera drifts
    /// relative to the rider over this frame. Zero at frame 0.
    pub camera_offset: DVec2,
    /// Points per frame
    pub ppf: f64,
}

/// One cached frame
#[derive(Debug, Clone, PartialEq)]
pub struct RiderFrame {
    pub rider: Rider,
    pub camera: CameraEntry,
    /// Trigger lines that caught a point during this frame
    pub triggers: Vec<LineId>,
    /// Interaction-test lines a point entered during this frame
    pub diagnostics: Vec<LineId>,
}

/// Cooperative cancellation flag, checked between frames
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct Timeline {
    track: Track,
    physics: PhysicsConfig,
    body: RiderBody,
    frames: Vec<RiderFrame>,
    /// First invalidated frame of each edit; the generation is its length
    invalidations: Vec<usize>,
}

impl Timeline {
    /// Timeline for `track` with the default rider
    pub fn new(track: Track, physics: PhysicsConfig) -> Result<Self, ConfigError> {
        physics.validate()?;
        let body = RiderBody::default_rider(physics.endurance_factor, physics.scarf)?;
        Self::with_body(track, physics, body)
    }

    /// Timeline for a custom body. `physics.scarf` is ignored; the body
    /// carries its own scarf.
    pub fn with_body(track: Track, physics: PhysicsConfig, body: RiderBody) -> Result<Self, ConfigError> {
        physics.validate()?;
        let spawn = spawn_frame(&body, &physics);
        Ok(Self {
            track,
            physics,
            body,
            frames: vec![spawn],
            invalidations: Vec::new(),
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    pub fn body(&self) -> &RiderBody {
        &self.body
    }

    /// Number of cached frames, never zero
    pub fn cached_len(&self) -> usize {
        self.frames.len()
    }

    /// A frame if it is already cached
    pub fn cached(&self, frame: usize) -> Option<&RiderFrame> {
        self.frames.get(frame)
    }

    /// Frame `frame`, computing any missing frames before it
    pub fn get_frame(&mut self, frame: usize) -> &RiderFrame {
        self.fill_to(frame);
        &self.frames[frame]
    }

    /// Frames `[start, start + count)`, computing any missing ones
    pub fn get_frames(&mut self, start: usize, count: usize) -> &[RiderFrame] {
        if count == 0 {
            return &[];
        }
        let end = start + count;
        self.fill_to(end - 1);
        &self.frames[start..end]
    }

    /// Compute at most `max_frames` new frames; returns how many were added
    pub fn extend(&mut self, max_frames: usize) -> usize {
        for _ in 0..max_frames {
            self.step();
        }
        max_frames
    }

    /// Compute up to frame `frame`, stopping at a frame boundary if `cancel`
    /// is set. Returns whether `frame` was reached.
    pub fn compute_until(&mut self, frame: usize, cancel: &CancelToken) -> bool {
        while self.frames.len() <= frame {
            if cancel.is_cancelled() {
                log::debug!(
                    "Frame computation cancelled at {} of {}",
                    self.frames.len(),
                    frame
                );
                return false;
            }
            self.step();
        }
        true
    }

    /// Drop cached frames `[from, len)`. Frame 0 is kept.
    pub fn invalidate(&mut self, from: usize) {
        let from = from.max(1);
        if from < self.frames.len() {
            log::trace!("Invalidating frames {}..{}", from, self.frames.len());
            self.frames.truncate(from);
        }
        self.mark(from);
    }

    /// Bumped by every invalidation. Caches layered on top remember the
    /// generation they were built at.
    pub fn generation(&self) -> u64 {
        self.invalidations.len() as u64
    }

    /// Lowest frame invalidated after `generation`, if any
    pub fn invalidated_since(&self, generation: u64) -> Option<usize> {
        let seen = usize::try_from(generation).unwrap_or(usize::MAX);
        self.invalidations.get(seen..)?.iter().copied().min()
    }

    pub fn add_line(&mut self, line: Line) -> Result<(), TrackError> {
        let id = line.id();
        if !id.is_set() {
            return Err(TrackError::UnsetId);
        }
        if self.track.get(id).is_some() {
            return Err(TrackError::DuplicateId { id });
        }
        if line.is_collidable() {
            self.invalidate(1);
        }
        self.track.insert(line)
    }

    pub fn remove_line(&mut self, id: LineId) -> Result<Line, TrackError> {
        let collidable = self
            .track
            .get(id)
            .map(Line::is_collidable)
            .ok_or(TrackError::UnknownLine { id })?;
        if collidable {
            self.invalidate(1);
        }
        self.track.remove(id)
    }

    pub fn move_line(&mut self, id: LineId, start: DVec2, end: DVec2) -> Result<(), TrackError> {
        self.edit_line(id, |line| line.set_endpoints(start, end))
    }

    pub fn set_line_inverted(&mut self, id: LineId, inverted: bool) -> Result<(), TrackError> {
        self.edit_line(id, |line| {
            line.set_inverted(inverted);
            Ok(())
        })
    }

    pub fn set_line_extension(&mut self, id: LineId, extension: Extension) -> Result<(), TrackError> {
        self.edit_line(id, |line| {
            line.set_extension(extension);
            Ok(())
        })
    }

    pub fn set_line_multiplier(&mut self, id: LineId, multiplier: i32) -> Result<(), TrackError> {
        self.edit_line(id, |line| line.set_multiplier(multiplier))
    }

    pub fn set_line_trigger(
        &mut self,
        id: LineId,
        trigger: Option<TriggerDescriptor>,
    ) -> Result<(), TrackError> {
        self.edit_line(id, |line| line.set_trigger(trigger))
    }

    /// Swap the whole line set
    pub fn replace_lines(&mut self, track: Track) {
        self.invalidate(1);
        self.track = track;
    }

    /// Change physics; rebuilds the body and frame 0
    pub fn set_physics(&mut self, physics: PhysicsConfig) -> Result<(), ConfigError> {
        physics.validate()?;
        let body = RiderBody::default_rider(physics.endurance_factor, physics.scarf)?;
        log::debug!("Physics changed, dropping {} frames", self.frames.len());
        self.frames = vec![spawn_frame(&body, &physics)];
        self.mark(0);
        self.physics = physics;
        self.body = body;
        Ok(())
    }

    /// Apply `edit` to a copy of the line, then invalidate and commit. A
    /// failed edit changes nothing.
    fn edit_line(
        &mut self,
        id: LineId,
        edit: impl FnOnce(&mut Line) -> Result<(), TrackError>,
    ) -> Result<(), TrackError> {
        let mut line = self.track.get(id).cloned().ok_or(TrackError::UnknownLine { id })?;
        let was_collidable = line.is_collidable();
        edit(&mut line)?;
        if was_collidable || line.is_collidable() {
            self.invalidate(1);
        }
        *self.track.get_mut(id)? = line;
        Ok(())
    }

    fn mark(&mut self, from: usize) {
        self.invalidations.push(from);
    }

    fn fill_to(&mut self, frame: usize) {
        while self.frames.len() <= frame {
            self.step();
        }
    }

    fn step(&mut self) {
        let index = self.frames.len();
        let prev = &self.frames[index - 1];
        let lines = self.track.collidable();
        let out = tick(&self.body, &prev.rider, &lines, &self.physics, index);
        let center = out.rider.center();
        let camera = CameraEntry {
            rider_center: center,
            camera_offset: prev.camera.rider_center - center,
            ppf: out.rider.speed(),
        };
        self.frames.push(RiderFrame {
            rider: out.rider,
            camera,
            triggers: out.triggers,
            diagnostics: out.diagnostics,
        });
    }
}

fn spawn_frame(body: &RiderBody, physics: &PhysicsConfig) -> RiderFrame {
    let rider = body.spawn(physics.start_position, physics.start_velocity);
    let camera = CameraEntry {
        rider_center: rider.center(),
        camera_offset: DVec2::ZERO,
        ppf: rider.speed(),
    };
    RiderFrame {
        rider,
        camera,
        triggers: Vec::new(),
        diagnostics: Vec::new(),
    }
}
