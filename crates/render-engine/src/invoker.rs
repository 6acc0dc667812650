//! Render invoker: one engine call per request, no retry.

use audiosweet_common::{AudioSweetError, AudioSweetResult};
use audiosweet_processing_core::ChannelDecision;
use audiosweet_project_model::{ClipId, TimeWindow};

use crate::host::{ChannelHandshake, Host, RenderOp, RenderRequest};
use crate::scope::HandshakeScope;

/// Issues render calls and checks their output.
#[derive(Debug, Clone, Copy)]
pub struct RenderInvoker {
    take_fx: bool,
    track_fx: bool,
}

impl RenderInvoker {
    pub fn new(take_fx: bool, track_fx: bool) -> Self {
        Self { take_fx, track_fx }
    }

    /// Render the current selection with effects, per the channel decision.
    ///
    /// The channel handshake is published for the duration of the call only.
    /// Returns the single output clip.
    pub fn invoke<H: Host + ?Sized>(
        &self,
        host: &mut H,
        op: RenderOp,
        decision: &ChannelDecision,
    ) -> AudioSweetResult<ClipId> {
        let request = RenderRequest {
            op,
            channel_mode: decision.render_mode,
            take_fx: self.take_fx,
            track_fx: self.track_fx,
        };
        let handshake = ChannelHandshake {
            policy: decision.handshake_policy,
            source_track_channels: decision.source_track_channels,
        };
        call(host, &request, Some(handshake))
    }

    /// Glue the current selection inside `window` without baking effects.
    pub fn plain_glue<H: Host + ?Sized>(
        &self,
        host: &mut H,
        window: TimeWindow,
    ) -> AudioSweetResult<ClipId> {
        call(host, &RenderRequest::plain_glue(window), None)
    }
}

fn call<H: Host + ?Sized>(
    host: &mut H,
    request: &RenderRequest,
    handshake: Option<ChannelHandshake>,
) -> AudioSweetResult<ClipId> {
    host.ensure_engine()?;

    tracing::debug!(op = ?request.op, mode = ?request.channel_mode, "Calling render engine");
    let result = match handshake {
        // Guard drops at the end of the statement, before the output check.
        Some(handshake) => HandshakeScope::enter(&mut *host, handshake).render(request),
        None => host.render(request),
    };

    result.map_err(|e| match e {
        AudioSweetError::EngineLoad { .. } | AudioSweetError::EngineCall { .. } => e,
        other => AudioSweetError::engine_call(other.to_string()),
    })?;

    match host.selected_clips().as_slice() {
        [output] => Ok(*output),
        other => Err(AudioSweetError::MissingOutputSelection {
            selected: other.len(),
        }),
    }
}
