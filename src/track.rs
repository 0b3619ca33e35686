//! Track line store
//!
//! Lines are kept in id order, which is also the order the stepper tests them
//! in. External stores exchange plain [`LineRecord`]s; converting a record
//! validates it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TrackError};
use crate::sim::{Extension, Line, LineId, LineKind, TriggerDescriptor, segment_intersection};

/// Record discriminants
pub mod kind {
    pub const STANDARD: u8 = 0;
    pub const ACCELERANT: u8 = 1;
    pub const SCENERY: u8 = 2;
    pub const INTERACTION_TEST: u8 = 3;
}

fn default_multiplier() -> i32 {
    1
}

fn default_width() -> f64 {
    1.0
}

/// Plain line record as exchanged with track stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub kind: u8,
    pub id: i64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default)]
    pub inverted: bool,
    /// Bit 0 = left, bit 1 = right
    #[serde(default)]
    pub extension: u8,
    #[serde(default = "default_multiplier")]
    pub multiplier: i32,
    #[serde(default)]
    pub trigger: Option<TriggerDescriptor>,
    #[serde(default = "default_width")]
    pub width: f64,
}

impl LineRecord {
    pub fn standard(id: i64, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            kind: kind::STANDARD,
            id,
            x1,
            y1,
            x2,
            y2,
            inverted: false,
            extension: 0,
            multiplier: 1,
            trigger: None,
            width: 1.0,
        }
    }
}

impl TryFrom<&LineRecord> for Line {
    type Error = TrackError;

    fn try_from(record: &LineRecord) -> Result<Self, Self::Error> {
        let id = LineId(record.id);
        let line_kind = match record.kind {
            kind::STANDARD => LineKind::Standard,
            kind::ACCELERANT => LineKind::Accelerant {
                multiplier: record.multiplier,
                trigger: record.trigger,
            },
            kind::SCENERY => LineKind::Scenery {
                width: record.width,
            },
            kind::INTERACTION_TEST => LineKind::InteractionTest,
            other => return Err(TrackError::UnknownKind { id, kind: other }),
        };
        let extension = Extension::from_bits(record.extension).ok_or(TrackError::InvalidExtension {
            id,
            flags: record.extension,
        })?;
        Line::new(
            id,
            line_kind,
            DVec2::new(record.x1, record.y1),
            DVec2::new(record.x2, record.y2),
            record.inverted,
            extension,
        )
    }
}

impl From<&Line> for LineRecord {
    fn from(line: &Line) -> Self {
        let (multiplier, trigger, width) = match *line.kind() {
            LineKind::Accelerant {
                multiplier,
                trigger,
            } => (multiplier, trigger, 1.0),
            LineKind::Scenery { width } => (1, None, width),
            LineKind::Standard | LineKind::InteractionTest => (1, None, 1.0),
        };
        Self {
            kind: line.kind().discriminant(),
            id: line.id().0,
            x1: line.start().x,
            y1: line.start().y,
            x2: line.end().x,
            y2: line.end().y,
            inverted: line.inverted(),
            extension: line.extension().bits(),
            multiplier,
            trigger,
            width,
        }
    }
}

/// Id-keyed, ordered line collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    lines: BTreeMap<LineId, Line>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a track, stopping at the first bad record
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a LineRecord>) -> Result<Self, TrackError> {
        let mut track = Self::new();
        for (index, record) in records.into_iter().enumerate() {
            Line::try_from(record)
                .and_then(|line| track.insert(line))
                .map_err(|e| TrackError::Record {
                    index,
                    source: Box::new(e),
                })?;
        }
        Ok(track)
    }

    /// Load a JSON array of line records
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<LineRecord> = serde_json::from_str(&json).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        let track = Self::from_records(&records)?;
        log::info!("Loaded {} lines from {}", track.len(), path.display());
        Ok(track)
    }

    pub fn records(&self) -> Vec<LineRecord> {
        self.lines.values().map(LineRecord::from).collect()
    }

    /// Insert a new line; ids must be unique
    pub fn insert(&mut self, line: Line) -> Result<(), TrackError> {
        let id = line.id();
        if !id.is_set() {
            return Err(TrackError::UnsetId);
        }
        if self.lines.contains_key(&id) {
            return Err(TrackError::DuplicateId { id });
        }
        self.lines.insert(id, line);
        Ok(())
    }

    pub fn remove(&mut self, id: LineId) -> Result<Line, TrackError> {
        self.lines.remove(&id).ok_or(TrackError::UnknownLine { id })
    }

    pub fn get(&self, id: LineId) -> Option<&Line> {
        self.lines.get(&id)
    }

    /// Mutable access for the timeline's edit path
    pub(crate) fn get_mut(&mut self, id: LineId) -> Result<&mut Line, TrackError> {
        self.lines.get_mut(&id).ok_or(TrackError::UnknownLine { id })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Smallest unused id above every existing one
    pub fn next_id(&self) -> LineId {
        LineId(self.lines.keys().next_back().map_or(0, |id| id.0 + 1))
    }

    /// All lines, id order
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }

    /// Lines the stepper tests, id order
    pub fn collidable(&self) -> Vec<&Line> {
        self.lines.values().filter(|l| l.is_collidable()).collect()
    }

    /// Lines crossed by the segment `a-b`, id order
    pub fn lines_crossing(&self, a: DVec2, b: DVec2) -> Vec<LineId> {
        self.lines
            .values()
            .filter(|l| segment_intersection(a, b, l.start(), l.end()).is_some())
            .map(|l| l.id())
            .collect()
    }

    /// Deterministic procedural downhill course: a chain of standard lines
    /// with an accelerant every few segments.
    pub fn demo(seed: u64, segments: usize) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut track = Self::new();
        let mut point = DVec2::new(-40.0, 20.0);
        for i in 0..segments {
            let run = rng.random_range(60.0..160.0);
            let drop = rng.random_range(-10.0..50.0);
            let next = point + DVec2::new(run, drop);
            let id = LineId(i as i64);
            let kind = if i % 5 == 4 {
                LineKind::Accelerant {
                    multiplier: rng.random_range(1..=3),
                    trigger: None,
                }
            } else {
                LineKind::Standard
            };
            // run > 0, so never zero length
            if let Ok(line) = Line::new(id, kind, point, next, false, Extension::None) {
                let _ = track.insert(line);
            }
            point = next;
        }
        track
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversion() {
        let mut record = LineRecord::standard(3, 0.0, 0.0, 10.0, 0.0);
        record.kind = kind::ACCELERANT;
        record.multiplier = 2;
        record.extension = 3;
        record.inverted = true;
        let line = Line::try_from(&record).unwrap();
        assert_eq!(line.id(), LineId(3));
        assert_eq!(line.extension(), Extension::Both);
        assert!(matches!(line.kind(), LineKind::Accelerant { multiplier: 2, .. }));
        assert_eq!(LineRecord::from(&line), record);
    }

    #[test]
    fn test_bad_records_rejected() {
        let mut unknown = LineRecord::standard(1, 0.0, 0.0, 1.0, 0.0);
        unknown.kind = 9;
        assert_eq!(
            Line::try_from(&unknown),
            Err(TrackError::UnknownKind { id: LineId(1), kind: 9 })
        );

        let mut flags = LineRecord::standard(1, 0.0, 0.0, 1.0, 0.0);
        flags.extension = 7;
        assert!(matches!(
            Line::try_from(&flags),
            Err(TrackError::InvalidExtension { flags: 7, .. })
        ));

        let degenerate = LineRecord::standard(2, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(
            Line::try_from(&degenerate),
            Err(TrackError::ZeroLength { id: LineId(2) })
        );
    }

    #[test]
    fn test_from_records_reports_failing_index() {
        let records = vec![
            LineRecord::standard(1, 0.0, 0.0, 10.0, 0.0),
            LineRecord::standard(2, 10.0, 0.0, 20.0, 5.0),
            LineRecord::standard(1, 20.0, 5.0, 30.0, 5.0),
        ];
        let err = Track::from_records(&records).unwrap_err();
        let TrackError::Record { index, source } = err else {
            panic!("expected a record error");
        };
        assert_eq!(index, 2);
        assert_eq!(*source, TrackError::DuplicateId { id: LineId(1) });
    }

    #[test]
    fn test_record_json_defaults() {
        let json = r#"[{ "kind": 0, "id": 5, "x1": 0, "y1": 0, "x2": 4, "y2": 3 }]"#;
        let records: Vec<LineRecord> = serde_json::from_str(json).unwrap();
        let track = Track::from_records(&records).unwrap();
        let line = track.get(LineId(5)).unwrap();
        assert_eq!(line.length(), 5.0);
        assert!(!line.inverted());
    }

    #[test]
    fn test_collidable_skips_scenery_in_id_order() {
        let mut track = Track::new();
        track.insert(Line::standard(5, DVec2::ZERO, DVec2::X).unwrap()).unwrap();
        track.insert(Line::scenery(2, DVec2::ZERO, DVec2::Y, 1.0).unwrap()).unwrap();
        track.insert(Line::accelerant(1, DVec2::ZERO, DVec2::ONE, 1).unwrap()).unwrap();
        let ids: Vec<LineId> = track.collidable().iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec![LineId(1), LineId(5)]);
        assert_eq!(track.len(), 3);
        assert_eq!(track.next_id(), LineId(6));
    }

    #[test]
    fn test_remove_unknown() {
        let mut track = Track::new();
        assert_eq!(
            track.remove(LineId(4)),
            Err(TrackError::UnknownLine { id: LineId(4) })
        );
    }

    #[test]
    fn test_lines_crossing() {
        let mut track = Track::new();
        track
            .insert(Line::standard(1, DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0)).unwrap())
            .unwrap();
        track
            .insert(Line::standard(2, DVec2::new(0.0, 5.0), DVec2::new(10.0, 5.0)).unwrap())
            .unwrap();
        let hits = track.lines_crossing(DVec2::new(5.0, -1.0), DVec2::new(5.0, 1.0));
        assert_eq!(hits, vec![LineId(1)]);
    }

    #[test]
    fn test_demo_is_deterministic() {
        let a = Track::demo(42, 20);
        let b = Track::demo(42, 20);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert_ne!(a, Track::demo(43, 20));
    }
}
