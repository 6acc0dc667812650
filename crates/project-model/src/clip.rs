//! Clip, take, and time window types.
//!
//! A clip sits on exactly one track and plays its active take. The take's
//! channel mode decides how many channels the clip actually plays back,
//! which may differ from the channel count of the source file.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::track::{Effect, TrackId};

/// Opaque clip handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub u64);

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clip#{}", self.0)
    }
}

/// A clip on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,

    /// Owning track.
    pub track: TrackId,

    /// Display name (the active take's name).
    pub name: String,

    /// Start position on the timeline (seconds).
    pub position: f64,

    /// Visible length (seconds).
    pub length: f64,

    /// Offset into the source media where playback starts (seconds).
    #[serde(default)]
    pub offset: f64,

    /// Whether the clip is part of the current selection.
    #[serde(default)]
    pub selected: bool,

    /// Active take.
    pub take: Take,

    /// Effects attached to the active take.
    #[serde(default)]
    pub take_effects: Vec<Effect>,
}

/// The active take of a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Take {
    /// Source media reference.
    pub source: String,

    /// Channel count of the source media.
    pub source_channels: u32,

    /// How the take's channels are played back.
    #[serde(default)]
    pub channel_mode: TakeChannelMode,
}

/// Playback channel mode of a take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TakeChannelMode {
    #[default]
    Normal,
    MonoDownmix,
    LeftOnly,
    RightOnly,
    Multichannel,
}

/// An optional active editing range on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl Clip {
    /// End position on the timeline.
    pub fn end(&self) -> f64 {
        self.position + self.length
    }

    /// Channels the clip actually plays back.
    pub fn playback_channels(&self) -> u32 {
        self.take.playback_channels()
    }
}

impl Take {
    pub fn new(source: impl Into<String>, source_channels: u32) -> Self {
        Self {
            source: source.into(),
            source_channels,
            channel_mode: TakeChannelMode::Normal,
        }
    }

    /// 1 for the mono modes, otherwise the source channel count.
    pub fn playback_channels(&self) -> u32 {
        if self.channel_mode.is_mono() {
            1
        } else {
            self.source_channels
        }
    }
}

impl TakeChannelMode {
    /// Whether the take plays back a single channel.
    pub fn is_mono(&self) -> bool {
        matches!(self, Self::MonoDownmix | Self::LeftOnly | Self::RightOnly)
    }
}

impl TimeWindow {
    /// Create a window, ordering the bounds.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the window has no extent.
    pub fn is_empty(&self) -> bool {
        self.duration() <= 0.0
    }

    /// Intersection with `[start, end]`, if any.
    pub fn clamp(&self, start: f64, end: f64) -> Option<(f64, f64)> {
        let s = start.max(self.start);
        let e = end.min(self.end);
        (e > s).then_some((s, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_with_mode(mode: TakeChannelMode, source_channels: u32) -> Clip {
        Clip {
            id: ClipId(1),
            track: TrackId(1),
            name: "Drum".to_string(),
            position: 1.0,
            length: 2.5,
            offset: 0.0,
            selected: false,
            take: Take {
                source: "drum.wav".to_string(),
                source_channels,
                channel_mode: mode,
            },
            take_effects: vec![],
        }
    }

    #[test]
    fn test_clip_end() {
        let clip = clip_with_mode(TakeChannelMode::Normal, 2);
        assert!((clip.end() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_playback_channels_mono_modes() {
        for mode in [
            TakeChannelMode::MonoDownmix,
            TakeChannelMode::LeftOnly,
            TakeChannelMode::RightOnly,
        ] {
            assert_eq!(clip_with_mode(mode, 4).playback_channels(), 1);
        }
        assert_eq!(clip_with_mode(TakeChannelMode::Normal, 4).playback_channels(), 4);
        assert_eq!(
            clip_with_mode(TakeChannelMode::Multichannel, 6).playback_channels(),
            6
        );
    }

    #[test]
    fn test_time_window_orders_bounds() {
        let w = TimeWindow::new(5.0, 2.0);
        assert_eq!(w.start, 2.0);
        assert_eq!(w.end, 5.0);
        assert!((w.duration() - 3.0).abs() < 1e-12);
        assert!(!w.is_empty());
        assert!(TimeWindow::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn test_time_window_clamp() {
        let w = TimeWindow::new(2.0, 4.0);
        assert_eq!(w.clamp(1.0, 3.0), Some((2.0, 3.0)));
        assert_eq!(w.clamp(2.5, 3.5), Some((2.5, 3.5)));
        assert_eq!(w.clamp(4.0, 6.0), None);
    }

    #[test]
    fn test_take_channel_mode_json() {
        let json = serde_json::to_string(&TakeChannelMode::MonoDownmix).unwrap();
        assert_eq!(json, "\"mono_downmix\"");
    }

    mod props {
        use super::super::TimeWindow;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn window_bounds_are_ordered(a in -1000.0f64..1000.0, b in -1000.0f64..1000.0) {
                let w = TimeWindow::new(a, b);
                prop_assert!(w.start <= w.end);
                prop_assert!(w.duration() >= 0.0);
            }
        }
    }
}
