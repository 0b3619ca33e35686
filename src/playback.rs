//! Forward playback cursor
//!
//! Trigger events and zoom animation only happen when playing forward one
//! frame at a time. Seeking jumps silently.

use std::collections::VecDeque;

use crate::sim::LineId;
use crate::timeline::{RiderFrame, Timeline};

/// A trigger line caught the rider during forward playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub line_id: LineId,
    pub frame: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ZoomAnimation {
    from: f64,
    to: f64,
    start: usize,
    frames: u32,
}

impl ZoomAnimation {
    fn zoom_at(&self, frame: usize) -> (f64, bool) {
        let elapsed = frame.saturating_sub(self.start) as f64;
        let t = (elapsed / self.frames.max(1) as f64).min(1.0);
        let zoom = self.from + (self.to - self.from) * t;
        (zoom, t >= 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct Playback {
    frame: usize,
    base_zoom: f64,
    zoom: f64,
    animation: Option<ZoomAnimation>,
    events: VecDeque<TriggerEvent>,
}

impl Playback {
    pub fn new(base_zoom: f64) -> Self {
        Self {
            frame: 0,
            base_zoom,
            zoom: base_zoom,
            animation: None,
            events: VecDeque::new(),
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Current zoom, including any running trigger animation
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_zooming(&self) -> bool {
        self.animation.is_some()
    }

    /// Step one frame forward, queueing trigger events for it
    pub fn advance<'a>(&mut self, timeline: &'a mut Timeline) -> &'a RiderFrame {
        self.frame += 1;
        let frame = self.frame;
        let triggers = timeline.get_frame(frame).triggers.clone();

        for line_id in triggers {
            self.events.push_back(TriggerEvent { line_id, frame });
            let Some(trigger) = timeline.track().get(line_id).and_then(|l| l.trigger()) else {
                continue;
            };
            if self.animation.is_some_and(|a| a.to == trigger.target_zoom) {
                continue;
            }
            log::debug!(
                "Trigger {} at frame {}: zoom {} -> {} over {} frames",
                line_id,
                frame,
                self.zoom,
                trigger.target_zoom,
                trigger.frame_count
            );
            self.animation = Some(ZoomAnimation {
                from: self.zoom,
                to: trigger.target_zoom,
                start: frame,
                frames: trigger.frame_count,
            });
        }

        if let Some(animation) = self.animation {
            let (zoom, done) = animation.zoom_at(frame);
            self.zoom = zoom;
            if done {
                self.animation = None;
            }
        }
        timeline.get_frame(frame)
    }

    /// Jump to `frame` without events; cancels any zoom animation
    pub fn seek(&mut self, frame: usize) {
        self.frame = frame;
        self.animation = None;
        self.zoom = self.base_zoom;
    }

    /// Queued events, oldest first
    pub fn drain_events(&mut self) -> Vec<TriggerEvent> {
        self.events.drain(..).collect()
    }
}
