//! The host contract: everything the pipeline reads from or does to the
//! editing host, including the external render engine.

use serde::Serialize;

use audiosweet_common::{AudioSweetResult, ChannelPolicy};
use audiosweet_processing_core::RenderChannelMode;
use audiosweet_project_model::{Clip, ClipId, EffectTarget, TimeWindow, TrackId};

/// Operation the render engine performs on the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RenderOp {
    /// Glue the selection into one clip, rendering extra head/tail context.
    GlueWithHandles,
    /// Glue only the part of the selection inside the window, no handles.
    GlueInWindow { window: TimeWindow },
    /// Render the selected clip's effects into a new active take.
    RenderNewTake,
}

/// One call to the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderRequest {
    pub op: RenderOp,
    pub channel_mode: RenderChannelMode,
    /// Bake take-level effects.
    pub take_fx: bool,
    /// Bake track-level effects.
    pub track_fx: bool,
}

/// Transient key/value handshake read once by the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelHandshake {
    pub policy: Option<ChannelPolicy>,
    pub source_track_channels: u32,
}

/// Editing host and render engine, as seen by the pipeline.
///
/// Implementations run on the host's script thread; the pipeline holds the
/// host mutably for a whole run.
pub trait Host {
    /// Project sample rate, if the host knows it.
    fn sample_rate(&self) -> Option<u32>;

    /// Selected clips in timeline order.
    fn selected_clips(&self) -> Vec<ClipId>;

    /// Current state of a clip, `None` if it no longer exists.
    fn clip(&self, id: ClipId) -> Option<Clip>;

    /// Clips on a track in position order.
    fn clips_on_track(&self, track: TrackId) -> Vec<ClipId>;

    /// Active time window.
    fn time_window(&self) -> Option<TimeWindow>;

    /// Effect the user last focused.
    fn focused_effect(&self) -> Option<EffectTarget>;

    fn track_name(&self, track: TrackId) -> AudioSweetResult<String>;

    fn track_channel_count(&self, track: TrackId) -> AudioSweetResult<u32>;

    fn set_track_channel_count(&mut self, track: TrackId, count: u32) -> AudioSweetResult<()>;

    fn effect_count(&self, track: TrackId) -> AudioSweetResult<usize>;

    fn effect_name(&self, track: TrackId, index: usize) -> AudioSweetResult<String>;

    fn effect_enabled(&self, track: TrackId, index: usize) -> AudioSweetResult<bool>;

    fn set_effect_enabled(&mut self, track: TrackId, index: usize, enabled: bool)
        -> AudioSweetResult<()>;

    /// Replace the selection.
    fn select_only(&mut self, clips: &[ClipId]);

    fn set_clip_selected(&mut self, clip: ClipId, selected: bool) -> AudioSweetResult<()>;

    /// Split a clip at `at`; the left part keeps the handle, the right part's
    /// handle is returned.
    fn split_clip(&mut self, clip: ClipId, at: f64) -> AudioSweetResult<ClipId>;

    /// Move a clip to another track, keeping its position.
    fn move_clip(&mut self, clip: ClipId, track: TrackId) -> AudioSweetResult<()>;

    fn set_clip_name(&mut self, clip: ClipId, name: &str) -> AudioSweetResult<()>;

    /// Append a copy of a track effect to a clip's take chain.
    fn copy_effect_to_clip(&mut self, effect: EffectTarget, clip: ClipId) -> AudioSweetResult<()>;

    /// Make sure the render engine can be called.
    fn ensure_engine(&mut self) -> AudioSweetResult<()>;

    /// Blocking render call on the current selection. On success exactly one
    /// clip, the output, is left selected.
    fn render(&mut self, request: &RenderRequest) -> AudioSweetResult<()>;

    /// Publish (`Some`) or clear (`None`) the channel handshake.
    fn set_channel_handshake(&mut self, handshake: Option<ChannelHandshake>);

    fn begin_undo_scope(&mut self);

    fn end_undo_scope(&mut self, label: &str);
}

impl RenderRequest {
    /// A glue that bakes no effects, used to join clips before a per-clip render.
    pub fn plain_glue(window: TimeWindow) -> Self {
        Self {
            op: RenderOp::GlueInWindow { window },
            channel_mode: RenderChannelMode::Auto,
            take_fx: false,
            track_fx: false,
        }
    }

    /// Whether the call bakes any effect.
    pub fn applies_effects(&self) -> bool {
        self.take_fx || self.track_fx
    }
}
