//! Channel policy resolution.
//!
//! Turns the configured [`ChannelPolicy`] and [`ChannelModeOverride`] into a
//! concrete decision for one render: mono or multichannel, and which channel
//! count (if any) the processing track must be set to for the call.

use serde::Serialize;

use audiosweet_common::{ChannelModeOverride, ChannelPolicy};

/// Channel mode passed to the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderChannelMode {
    Mono,
    Auto,
}

/// Channel facts gathered for one unit or clip before anything moves.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInputs {
    /// Playback channel count of each member.
    pub playback_channels: Vec<u32>,
    /// Originating track's channel count, read before any move.
    pub source_track_channels: u32,
    /// Processing track's current channel count.
    pub target_track_channels: u32,
}

/// Result of resolving the policy for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelDecision {
    pub render_mode: RenderChannelMode,
    /// Channel count to set on the processing track for the render, if any.
    pub track_channels: Option<u32>,
    /// Policy published through the transient handshake (`None` for mono renders).
    pub handshake_policy: Option<ChannelPolicy>,
    /// Originating track channel count published with the handshake.
    pub source_track_channels: u32,
}

/// Resolves the render channel count from policy and override.
#[derive(Debug, Clone, Copy)]
pub struct ChannelResolver {
    policy: ChannelPolicy,
    mode: ChannelModeOverride,
}

/// Round an odd count above 1 up to the next even number.
pub fn normalize_channels(count: u32) -> u32 {
    if count > 1 && count % 2 == 1 {
        count + 1
    } else {
        count
    }
}

impl ChannelResolver {
    pub fn new(policy: ChannelPolicy, mode: ChannelModeOverride) -> Self {
        Self { policy, mode }
    }

    pub fn policy(&self) -> ChannelPolicy {
        self.policy
    }

    /// Raw count the policy asks for, before normalization.
    pub fn policy_channels(&self, inputs: &ChannelInputs) -> u32 {
        match self.policy {
            ChannelPolicy::SourcePlayback => {
                inputs.playback_channels.iter().copied().max().unwrap_or(0)
            }
            ChannelPolicy::SourceTrack => inputs.source_track_channels,
            ChannelPolicy::TargetTrack => inputs.target_track_channels,
        }
    }

    /// Decide how the render is performed.
    pub fn resolve(&self, inputs: &ChannelInputs) -> ChannelDecision {
        let mono = ChannelDecision {
            render_mode: RenderChannelMode::Mono,
            track_channels: None,
            handshake_policy: None,
            source_track_channels: inputs.source_track_channels,
        };

        if self.mode == ChannelModeOverride::Mono {
            return mono;
        }

        let multi = |track_channels| ChannelDecision {
            render_mode: RenderChannelMode::Auto,
            track_channels,
            handshake_policy: Some(self.policy),
            source_track_channels: inputs.source_track_channels,
        };

        if self.policy == ChannelPolicy::TargetTrack {
            // The processing track is used as configured.
            return if self.mode == ChannelModeOverride::Auto && inputs.target_track_channels <= 1 {
                mono
            } else {
                multi(None)
            };
        }

        let count = normalize_channels(self.policy_channels(inputs));
        match self.mode {
            ChannelModeOverride::Multi => multi(Some(count.max(2))),
            _ if count <= 1 => mono,
            _ => multi(Some(count)),
        }
    }
}
