//! Track and effect types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque track handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// A timeline track. Tracks are never created or destroyed by a render run,
/// only read and temporarily mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,

    /// Display name.
    pub name: String,

    /// Number of channels the track processes (host-managed, mutable).
    pub channel_count: u32,

    /// Ordered effect chain.
    #[serde(default)]
    pub effects: Vec<Effect>,
}

/// One effect in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Full plugin name as reported by the host (e.g. `VST3: Pro-Q 3 (FabFilter)`).
    pub name: String,

    /// `false` means bypassed.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// The effect a focused render applies: a track and an index into its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectTarget {
    pub track: TrackId,
    pub index: usize,
}

fn default_enabled() -> bool {
    true
}

impl Track {
    pub fn new(id: TrackId, name: impl Into<String>, channel_count: u32) -> Self {
        Self {
            id,
            name: name.into(),
            channel_count,
            effects: vec![],
        }
    }

    /// Builder-style helper to append an effect.
    pub fn with_effect(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.effects.push(Effect::new(name, enabled));
        self
    }

    /// Enable flags in chain order.
    pub fn enable_states(&self) -> Vec<bool> {
        self.effects.iter().map(|fx| fx.enabled).collect()
    }
}

impl Effect {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

impl EffectTarget {
    pub fn new(track: TrackId, index: usize) -> Self {
        Self { track, index }
    }
}
