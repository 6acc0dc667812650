//! In-memory host over a [`Session`], with a simulated render engine.
//!
//! Used by the CLI to run sessions from disk and by tests to observe every
//! call the pipeline makes. Render calls behave like the real engine's glue
//! and apply-as-new-take actions closely enough to exercise selection,
//! channel and naming behavior.

use serde::Serialize;

use audiosweet_common::{AudioSweetError, AudioSweetResult};
use audiosweet_processing_core::{normalize_channels, RenderChannelMode};
use audiosweet_project_model::{
    Clip, ClipId, Effect, EffectTarget, Session, Take, TakeChannelMode, TimeWindow, Track, TrackId,
};

use crate::host::{ChannelHandshake, Host, RenderOp, RenderRequest};

/// State observed at one render call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRecord {
    /// 1-based call number.
    pub call: usize,
    pub request: RenderRequest,
    /// Track of the first input clip.
    pub track: Option<TrackId>,
    pub track_channels: Option<u32>,
    /// Enable flags of that track's chain during the call.
    pub effect_states: Vec<bool>,
    pub handshake: Option<ChannelHandshake>,
    pub inputs: Vec<ClipId>,
}

/// Failure injection for the simulated engine.
#[derive(Debug, Clone, Default)]
struct EngineSim {
    offline: bool,
    fail_calls: Vec<usize>,
    omit_output_calls: Vec<usize>,
    calls: usize,
}

/// A [`Host`] backed by a session in memory.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    session: Session,
    engine: EngineSim,
    handshake: Option<ChannelHandshake>,
    handshake_log: Vec<Option<ChannelHandshake>>,
    render_log: Vec<RenderRecord>,
    undo_depth: usize,
    undo_log: Vec<String>,
    auto_adjust_channels: bool,
}

impl MemoryHost {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            engine: EngineSim::default(),
            handshake: None,
            handshake_log: vec![],
            render_log: vec![],
            undo_depth: 0,
            undo_log: vec![],
            auto_adjust_channels: true,
        }
    }

    /// Make `ensure_engine` fail.
    pub fn with_engine_offline(mut self) -> Self {
        self.engine.offline = true;
        self
    }

    /// Make the `n`th render call (1-based) fail.
    pub fn fail_render_call(mut self, n: usize) -> Self {
        self.engine.fail_calls.push(n);
        self
    }

    /// Make the `n`th render call succeed but leave nothing selected.
    pub fn omit_output_on_call(mut self, n: usize) -> Self {
        self.engine.omit_output_calls.push(n);
        self
    }

    /// Whether moving a multichannel clip onto a narrower track widens it,
    /// as hosts do. On by default.
    pub fn with_auto_adjust_channels(mut self, enabled: bool) -> Self {
        self.auto_adjust_channels = enabled;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn render_log(&self) -> &[RenderRecord] {
        &self.render_log
    }

    pub fn render_calls(&self) -> usize {
        self.engine.calls
    }

    /// Every handshake write, including clears.
    pub fn handshake_log(&self) -> &[Option<ChannelHandshake>] {
        &self.handshake_log
    }

    pub fn handshake(&self) -> Option<ChannelHandshake> {
        self.handshake
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_depth
    }

    /// Labels of closed undo scopes.
    pub fn undo_log(&self) -> &[String] {
        &self.undo_log
    }

    fn track_ref(&self, id: TrackId) -> AudioSweetResult<&Track> {
        self.session
            .track(id)
            .ok_or_else(|| AudioSweetError::host(format!("{id} does not exist")))
    }

    fn track_ref_mut(&mut self, id: TrackId) -> AudioSweetResult<&mut Track> {
        self.session
            .track_mut(id)
            .ok_or_else(|| AudioSweetError::host(format!("{id} does not exist")))
    }

    fn clip_ref_mut(&mut self, id: ClipId) -> AudioSweetResult<&mut Clip> {
        self.session
            .clip_mut(id)
            .ok_or_else(|| AudioSweetError::host(format!("{id} does not exist")))
    }

    fn effect_ref(&self, track: TrackId, index: usize) -> AudioSweetResult<&Effect> {
        let t = self.track_ref(track)?;
        t.effects.get(index).ok_or_else(|| {
            AudioSweetError::host(format!(
                "effect {index} out of range on {track} ({} effects)",
                t.effects.len()
            ))
        })
    }

    /// Glue the selected clips of each track into one clip.
    fn glue(&mut self, request: &RenderRequest, inputs: &[ClipId]) -> AudioSweetResult<Vec<ClipId>> {
        let window = match request.op {
            RenderOp::GlueInWindow { window } => Some(window),
            _ => None,
        };

        let mut by_track: Vec<(TrackId, Vec<Clip>)> = vec![];
        for &id in inputs {
            let Some(clip) = self.session.clip(id).cloned() else {
                continue;
            };
            match by_track.iter_mut().find(|(t, _)| *t == clip.track) {
                Some((_, clips)) => clips.push(clip),
                None => by_track.push((clip.track, vec![clip])),
            }
        }

        let mut outputs = vec![];
        for (track, mut clips) in by_track {
            clips.sort_by(|a, b| a.position.total_cmp(&b.position));
            let start = clips.iter().map(|c| c.position).fold(f64::INFINITY, f64::min);
            let end = clips.iter().map(Clip::end).fold(f64::NEG_INFINITY, f64::max);
            let (start, end) = match window {
                Some(w) => w.clamp(start, end).ok_or_else(|| {
                    AudioSweetError::engine_call("selection lies outside the time window")
                })?,
                None => (start, end),
            };

            let channels = match request.channel_mode {
                RenderChannelMode::Mono => 1,
                RenderChannelMode::Auto if request.applies_effects() => {
                    self.track_ref(track)?.channel_count
                }
                RenderChannelMode::Auto => clips.iter().map(Clip::playback_channels).max().unwrap_or(1),
            };

            let name = clips.first().map(|c| format!("{}-glued", c.name)).unwrap_or_default();
            let take_effects = if request.take_fx {
                vec![]
            } else {
                clips.iter().flat_map(|c| c.take_effects.clone()).collect()
            };

            for clip in &clips {
                self.session.remove_clip(clip.id);
                if let Some(w) = window {
                    self.keep_outside(clip, w);
                }
            }

            let id = self.session.allocate_clip_id();
            self.session.clips.push(Clip {
                id,
                track,
                name,
                position: start,
                length: end - start,
                offset: 0.0,
                selected: false,
                take: Take {
                    source: format!("render-{:03}.wav", self.engine.calls),
                    source_channels: channels,
                    channel_mode: TakeChannelMode::Normal,
                },
                take_effects,
            });
            outputs.push(id);
        }
        Ok(outputs)
    }

    /// Put back the parts of a glued clip that lie outside the window.
    fn keep_outside(&mut self, clip: &Clip, window: TimeWindow) {
        let mut pieces = vec![];
        if clip.position < window.start {
            pieces.push((clip.position, window.start.min(clip.end())));
        }
        if clip.end() > window.end {
            pieces.push((window.end.max(clip.position), clip.end()));
        }
        for (start, end) in pieces {
            let id = self.session.allocate_clip_id();
            self.session.clips.push(Clip {
                id,
                position: start,
                length: end - start,
                offset: clip.offset + (start - clip.position),
                selected: false,
                ..clip.clone()
            });
        }
    }

    /// Render each selected clip's effects into a new active take.
    fn render_takes(&mut self, request: &RenderRequest, inputs: &[ClipId]) -> AudioSweetResult<Vec<ClipId>> {
        let call = self.engine.calls;
        for &id in inputs {
            let track = self.clip_ref_mut(id)?.track;
            let channels = match request.channel_mode {
                RenderChannelMode::Mono => 1,
                RenderChannelMode::Auto => self.track_ref(track)?.channel_count,
            };
            let clip = self.clip_ref_mut(id)?;
            clip.take = Take {
                source: format!("render-{call:03}.wav"),
                source_channels: channels,
                channel_mode: TakeChannelMode::Normal,
            };
            if request.take_fx {
                clip.take_effects.clear();
            }
            clip.name = format!("{} render", clip.name);
        }
        Ok(inputs.to_vec())
    }
}

impl Host for MemoryHost {
    fn sample_rate(&self) -> Option<u32> {
        self.session.sample_rate
    }

    fn selected_clips(&self) -> Vec<ClipId> {
        self.session.selected_clips()
    }

    fn clip(&self, id: ClipId) -> Option<Clip> {
        self.session.clip(id).cloned()
    }

    fn clips_on_track(&self, track: TrackId) -> Vec<ClipId> {
        self.session
            .clips_on_track(track)
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    fn time_window(&self) -> Option<TimeWindow> {
        self.session.time_window
    }

    fn focused_effect(&self) -> Option<EffectTarget> {
        self.session.focused_effect
    }

    fn track_name(&self, track: TrackId) -> AudioSweetResult<String> {
        Ok(self.track_ref(track)?.name.clone())
    }

    fn track_channel_count(&self, track: TrackId) -> AudioSweetResult<u32> {
        Ok(self.track_ref(track)?.channel_count)
    }

    fn set_track_channel_count(&mut self, track: TrackId, count: u32) -> AudioSweetResult<()> {
        if count == 0 {
            return Err(AudioSweetError::host(format!("{track}: channel count must be positive")));
        }
        self.track_ref_mut(track)?.channel_count = count;
        Ok(())
    }

    fn effect_count(&self, track: TrackId) -> AudioSweetResult<usize> {
        Ok(self.track_ref(track)?.effects.len())
    }

    fn effect_name(&self, track: TrackId, index: usize) -> AudioSweetResult<String> {
        Ok(self.effect_ref(track, index)?.name.clone())
    }

    fn effect_enabled(&self, track: TrackId, index: usize) -> AudioSweetResult<bool> {
        Ok(self.effect_ref(track, index)?.enabled)
    }

    fn set_effect_enabled(&mut self, track: TrackId, index: usize, enabled: bool) -> AudioSweetResult<()> {
        self.effect_ref(track, index)?;
        if let Some(effect) = self.track_ref_mut(track)?.effects.get_mut(index) {
            effect.enabled = enabled;
        }
        Ok(())
    }

    fn select_only(&mut self, clips: &[ClipId]) {
        self.session.select_only(clips);
    }

    fn set_clip_selected(&mut self, clip: ClipId, selected: bool) -> AudioSweetResult<()> {
        self.clip_ref_mut(clip)?.selected = selected;
        Ok(())
    }

    fn split_clip(&mut self, clip: ClipId, at: f64) -> AudioSweetResult<ClipId> {
        let original = self.clip_ref_mut(clip)?.clone();
        if !(at > original.position && at < original.end()) {
            return Err(AudioSweetError::host(format!(
                "cannot split {clip} at {at:.6}s outside {:.6}s..{:.6}s",
                original.position,
                original.end()
            )));
        }

        let left_length = at - original.position;
        self.clip_ref_mut(clip)?.length = left_length;

        let id = self.session.allocate_clip_id();
        self.session.clips.push(Clip {
            id,
            position: at,
            length: original.end() - at,
            offset: original.offset + left_length,
            ..original
        });
        Ok(id)
    }

    fn move_clip(&mut self, clip: ClipId, track: TrackId) -> AudioSweetResult<()> {
        let playback = self.clip_ref_mut(clip)?.playback_channels();
        let auto_adjust = self.auto_adjust_channels;
        let dest = self.track_ref_mut(track)?;
        if auto_adjust {
            dest.channel_count = dest.channel_count.max(normalize_channels(playback));
        }
        self.clip_ref_mut(clip)?.track = track;
        Ok(())
    }

    fn set_clip_name(&mut self, clip: ClipId, name: &str) -> AudioSweetResult<()> {
        self.clip_ref_mut(clip)?.name = name.to_string();
        Ok(())
    }

    fn copy_effect_to_clip(&mut self, effect: EffectTarget, clip: ClipId) -> AudioSweetResult<()> {
        let copy = self.effect_ref(effect.track, effect.index)?.clone();
        self.clip_ref_mut(clip)?.take_effects.push(copy);
        Ok(())
    }

    fn ensure_engine(&mut self) -> AudioSweetResult<()> {
        if self.engine.offline {
            return Err(AudioSweetError::engine_load("render engine is not loaded"));
        }
        Ok(())
    }

    fn render(&mut self, request: &RenderRequest) -> AudioSweetResult<()> {
        self.engine.calls += 1;
        let call = self.engine.calls;
        let inputs = self.session.selected_clips();

        let track = inputs.first().and_then(|&id| self.session.clip(id)).map(|c| c.track);
        let (track_channels, effect_states) = match track.and_then(|t| self.session.track(t)) {
            Some(t) => (Some(t.channel_count), t.enable_states()),
            None => (None, vec![]),
        };
        self.render_log.push(RenderRecord {
            call,
            request: *request,
            track,
            track_channels,
            effect_states,
            handshake: self.handshake,
            inputs: inputs.clone(),
        });

        if self.engine.fail_calls.contains(&call) {
            return Err(AudioSweetError::engine_call(format!("simulated failure on call {call}")));
        }
        if inputs.is_empty() {
            return Err(AudioSweetError::engine_call("nothing selected"));
        }

        let outputs = match request.op {
            RenderOp::GlueWithHandles | RenderOp::GlueInWindow { .. } => self.glue(request, &inputs)?,
            RenderOp::RenderNewTake => self.render_takes(request, &inputs)?,
        };

        if self.engine.omit_output_calls.contains(&call) {
            self.session.select_only(&[]);
        } else {
            self.session.select_only(&outputs);
        }
        Ok(())
    }

    fn set_channel_handshake(&mut self, handshake: Option<ChannelHandshake>) {
        self.handshake = handshake;
        self.handshake_log.push(handshake);
    }

    fn begin_undo_scope(&mut self) {
        self.undo_depth += 1;
    }

    fn end_undo_scope(&mut self, label: &str) {
        self.undo_depth = self.undo_depth.saturating_sub(1);
        self.undo_log.push(label.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (Session, TrackId, ClipId) {
        let mut session = Session::new(Some(48_000));
        let track = session.add_track("Drums", 2);
        let clip = session.add_clip(track, "Kick", 0.0, 4.0, Take::new("kick.wav", 2));
        (session, track, clip)
    }

    #[test]
    fn test_split_keeps_left_handle() {
        let (session, track, clip) = session();
        let mut host = MemoryHost::new(session);

        let right = host.split_clip(clip, 1.5).unwrap();
        let left = host.clip(clip).unwrap();
        let right = host.clip(right).unwrap();
        assert_eq!(left.length, 1.5);
        assert_eq!(right.position, 1.5);
        assert_eq!(right.length, 2.5);
        assert_eq!(right.offset, 1.5);
        assert_eq!(right.track, track);

        assert!(host.split_clip(clip, 1.5).is_err());
        assert!(host.split_clip(clip, -1.0).is_err());
    }

    #[test]
    fn test_move_widens_destination_track() {
        let (mut session, _, clip) = session();
        let fx = session.add_track("FX", 2);
        let surround = session.add_clip(fx, "Amb", 10.0, 1.0, Take::new("amb.wav", 5));
        let mono = session.add_track("Mono", 1);
        let mut host = MemoryHost::new(session);

        host.move_clip(surround, mono).unwrap();
        assert_eq!(host.track_channel_count(mono).unwrap(), 6);

        host.move_clip(clip, fx).unwrap();
        assert_eq!(host.track_channel_count(fx).unwrap(), 2);
    }

    #[test]
    fn test_glue_in_window_keeps_outside_parts() {
        let (mut session, track, clip) = session();
        session.select_only(&[clip]);
        let mut host = MemoryHost::new(session);

        let request = RenderRequest::plain_glue(TimeWindow::new(1.0, 3.0));
        host.render(&request).unwrap();

        let selected = host.selected_clips();
        assert_eq!(selected.len(), 1);
        let output = host.clip(selected[0]).unwrap();
        assert_eq!((output.position, output.end()), (1.0, 3.0));
        assert_eq!(output.name, "Kick-glued");
        assert_eq!(host.clips_on_track(track).len(), 3);
        assert!(host.clip(clip).is_none());
    }

    #[test]
    fn test_failure_injection() {
        let (mut session, _, clip) = session();
        session.select_only(&[clip]);
        let mut host = MemoryHost::new(session).fail_render_call(1).omit_output_on_call(2);

        let request = RenderRequest::plain_glue(TimeWindow::new(0.0, 4.0));
        assert!(matches!(host.render(&request), Err(AudioSweetError::EngineCall { .. })));
        assert!(host.clip(clip).is_some());

        host.render(&request).unwrap();
        assert!(host.selected_clips().is_empty());
        assert_eq!(host.render_calls(), 2);
        assert_eq!(host.render_log().len(), 2);

        let mut offline = MemoryHost::new(Session::default()).with_engine_offline();
        assert!(matches!(offline.ensure_engine(), Err(AudioSweetError::EngineLoad { .. })));
    }
}
