//! Session arena and session file persistence.
//!
//! A session is the top-level container: tracks, the clips on them, and the
//! live editing state (selection, active time window, focused effect).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clip::{Clip, ClipId, Take, TimeWindow};
use crate::track::{EffectTarget, Track, TrackId};

/// Current session file schema version.
pub const SESSION_FILE_VERSION: &str = "1.0";

/// Arena of tracks and clips plus the live editing state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Project sample rate, if known.
    #[serde(default)]
    pub sample_rate: Option<u32>,

    /// Tracks in display order.
    pub tracks: Vec<Track>,

    /// All clips, in insertion order.
    #[serde(default)]
    pub clips: Vec<Clip>,

    /// Active time window.
    #[serde(default)]
    pub time_window: Option<TimeWindow>,

    /// Effect the user last focused.
    #[serde(default)]
    pub focused_effect: Option<EffectTarget>,

    /// Next free clip handle.
    #[serde(default)]
    pub next_clip_id: u64,
}

/// On-disk session file (`*.session.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    /// Schema version.
    pub version: String,

    /// Human-readable session name.
    pub name: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    /// Session contents.
    pub session: Session,
}

/// A session file loaded into memory with its location.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    /// Filesystem path of the session file.
    pub path: PathBuf,

    /// File contents.
    pub file: SessionFile,
}

impl Session {
    pub fn new(sample_rate: Option<u32>) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Add a track; returns its handle.
    pub fn add_track(&mut self, name: impl Into<String>, channel_count: u32) -> TrackId {
        let id = TrackId(self.tracks.iter().map(|t| t.id.0 + 1).max().unwrap_or(1));
        self.tracks.push(Track::new(id, name, channel_count));
        id
    }

    /// Allocate a fresh clip handle.
    pub fn allocate_clip_id(&mut self) -> ClipId {
        let floor = self.clips.iter().map(|c| c.id.0 + 1).max().unwrap_or(1);
        let id = self.next_clip_id.max(floor);
        self.next_clip_id = id + 1;
        ClipId(id)
    }

    /// Add a clip on `track`; returns its handle.
    pub fn add_clip(
        &mut self,
        track: TrackId,
        name: impl Into<String>,
        position: f64,
        length: f64,
        take: Take,
    ) -> ClipId {
        let id = self.allocate_clip_id();
        self.clips.push(Clip {
            id,
            track,
            name: name.into(),
            position,
            length,
            offset: 0.0,
            selected: false,
            take,
            take_effects: vec![],
        });
        id
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn clip_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    /// Remove a clip from the arena, returning it.
    pub fn remove_clip(&mut self, id: ClipId) -> Option<Clip> {
        let idx = self.clips.iter().position(|c| c.id == id)?;
        Some(self.clips.remove(idx))
    }

    /// Position of a track in display order.
    pub fn track_index(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Clips on a track, sorted by position.
    pub fn clips_on_track(&self, track: TrackId) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.clips.iter().filter(|c| c.track == track).collect();
        clips.sort_by(|a, b| a.position.total_cmp(&b.position));
        clips
    }

    /// Selected clips in timeline order (track display order, then position).
    pub fn selected_clips(&self) -> Vec<ClipId> {
        let mut selected: Vec<&Clip> = self.clips.iter().filter(|c| c.selected).collect();
        selected.sort_by(|a, b| {
            let ta = self.track_index(a.track).unwrap_or(usize::MAX);
            let tb = self.track_index(b.track).unwrap_or(usize::MAX);
            ta.cmp(&tb)
                .then(a.position.total_cmp(&b.position))
                .then(a.id.cmp(&b.id))
        });
        selected.into_iter().map(|c| c.id).collect()
    }

    /// Select exactly the given clips.
    pub fn select_only(&mut self, ids: &[ClipId]) {
        for clip in &mut self.clips {
            clip.selected = ids.contains(&clip.id);
        }
    }

    /// Check referential integrity. Returns human-readable issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = vec![];

        for clip in &self.clips {
            if self.track(clip.track).is_none() {
                issues.push(format!("{} references missing {}", clip.id, clip.track));
            }
            if !(clip.length > 0.0) {
                issues.push(format!("{} has non-positive length {}", clip.id, clip.length));
            }
            if clip.take.source_channels == 0 {
                issues.push(format!("{} has a take with zero source channels", clip.id));
            }
        }

        let mut ids: Vec<ClipId> = self.clips.iter().map(|c| c.id).collect();
        ids.sort();
        ids.dedup();
        if ids.len() != self.clips.len() {
            issues.push("Duplicate clip handles".to_string());
        }

        if let Some(target) = self.focused_effect {
            match self.track(target.track) {
                None => issues.push(format!("Focused effect on missing {}", target.track)),
                Some(track) if target.index >= track.effects.len() => issues.push(format!(
                    "Focused effect index {} out of range on {} ({} effects)",
                    target.index,
                    target.track,
                    track.effects.len()
                )),
                Some(_) => {}
            }
        }

        if let Some(window) = self.time_window {
            if window.start > window.end {
                issues.push("Time window start is after its end".to_string());
            }
        }

        issues
    }
}

impl SessionFile {
    /// Wrap a session with fresh timestamps.
    pub fn new(name: impl Into<String>, session: Session) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: SESSION_FILE_VERSION.to_string(),
            name: name.into(),
            created_at: now.clone(),
            modified_at: now,
            session,
        }
    }

    /// Refresh the modification timestamp.
    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }
}

impl LoadedSession {
    /// Load a session file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref().to_path_buf();

        let json = std::fs::read_to_string(&path).map_err(|e| ProjectError::IoError {
            path: path.clone(),
            source: e,
        })?;

        let file: SessionFile =
            serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
                path: path.clone(),
                source: e,
            })?;

        if file.version != SESSION_FILE_VERSION {
            return Err(ProjectError::ValidationError {
                message: format!(
                    "Unsupported session version {} (expected {SESSION_FILE_VERSION})",
                    file.version
                ),
            });
        }

        Ok(Self { path, file })
    }

    /// Save the session to its path.
    pub fn save(&self) -> Result<(), ProjectError> {
        self.save_as(&self.path)
    }

    /// Save the session to another path.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProjectError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json =
            serde_json::to_string_pretty(&self.file).map_err(|e| ProjectError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })?;
        std::fs::write(path, json).map_err(|e| ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Create a new session file on disk.
    pub fn create(
        path: impl AsRef<Path>,
        name: impl Into<String>,
        session: Session,
    ) -> Result<Self, ProjectError> {
        let loaded = Self {
            path: path.as_ref().to_path_buf(),
            file: SessionFile::new(name, session),
        };
        loaded.save()?;
        Ok(loaded)
    }

    pub fn session(&self) -> &Session {
        &self.file.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.file.session
    }
}

/// Errors that can occur when working with session files.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid session: {message}")]
    ValidationError { message: String },
}
