//! Unit detection: group selected clips into atomic render jobs.
//!
//! # Algorithm
//!
//! 1. **Partition** clips by owning track, keeping tracks in first-seen order.
//! 2. **Sort** each partition by start (then end, then handle for stability).
//! 3. **Scan** left to right, opening a new unit whenever the next clip starts
//!    strictly beyond the current unit's end plus one sample period.
//!
//! Touching clips land in the same unit, matching the downstream glue step
//! which joins contiguous regions into one clip.

use serde::Serialize;

use audiosweet_common::Timebase;
use audiosweet_project_model::{Clip, ClipId, TrackId};

/// Timeline extent of one clip, detached from the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClipSpan {
    pub id: ClipId,
    pub track: TrackId,
    pub start: f64,
    pub end: f64,
}

/// A maximal run of touching/overlapping clips on one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    /// Track every member sits on.
    pub track: TrackId,
    /// Members sorted by position.
    pub members: Vec<ClipSpan>,
    /// Earliest member start.
    pub start: f64,
    /// Latest member end.
    pub end: f64,
}

/// Groups clip spans into units.
#[derive(Debug, Clone, Copy)]
pub struct UnitDetector {
    timebase: Timebase,
}

impl ClipSpan {
    pub fn new(id: ClipId, track: TrackId, start: f64, end: f64) -> Self {
        Self {
            id,
            track,
            start,
            end,
        }
    }

    pub fn from_clip(clip: &Clip) -> Self {
        Self::new(clip.id, clip.track, clip.position, clip.end())
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl Unit {
    fn open(first: ClipSpan) -> Self {
        Self {
            track: first.track,
            members: vec![first],
            start: first.start,
            end: first.end,
        }
    }

    fn absorb(&mut self, clip: ClipSpan) {
        self.start = self.start.min(clip.start);
        self.end = self.end.max(clip.end);
        self.members.push(clip);
    }

    /// Handles of the members in position order.
    pub fn member_ids(&self) -> Vec<ClipId> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn contains(&self, id: ClipId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl UnitDetector {
    pub fn new(timebase: Timebase) -> Self {
        Self { timebase }
    }

    pub fn timebase(&self) -> &Timebase {
        &self.timebase
    }

    /// Detect units from a set of clip spans.
    ///
    /// Output order: tracks in first-seen order, units by position within a track.
    pub fn detect(&self, clips: &[ClipSpan]) -> Vec<Unit> {
        let mut tracks: Vec<TrackId> = vec![];
        for clip in clips {
            if !tracks.contains(&clip.track) {
                tracks.push(clip.track);
            }
        }

        let mut units = vec![];
        for track in tracks {
            let mut on_track: Vec<ClipSpan> =
                clips.iter().filter(|c| c.track == track).copied().collect();
            on_track.sort_by(|a, b| {
                a.start
                    .total_cmp(&b.start)
                    .then(a.end.total_cmp(&b.end))
                    .then(a.id.cmp(&b.id))
            });
            on_track.dedup_by_key(|c| c.id);

            let mut current: Option<Unit> = None;
            for clip in on_track {
                match current.as_mut() {
                    Some(unit) if !self.timebase.is_gap(unit.end, clip.start) => unit.absorb(clip),
                    _ => {
                        if let Some(done) = current.take() {
                            units.push(done);
                        }
                        current = Some(Unit::open(clip));
                    }
                }
            }
            if let Some(done) = current {
                units.push(done);
            }
        }

        tracing::debug!(clips = clips.len(), units = units.len(), "Detected units");
        units
    }

    /// Detect units directly from session clips.
    pub fn detect_clips<'a>(&self, clips: impl IntoIterator<Item = &'a Clip>) -> Vec<Unit> {
        let spans: Vec<ClipSpan> = clips.into_iter().map(ClipSpan::from_clip).collect();
        self.detect(&spans)
    }
}
