//! Run orchestration.
//!
//! A run reads the selection, compiles it into units, picks a render plan
//! from the time window, and renders each unit on the processing track
//! (the track holding the focused effect). Every host mutation a render
//! needs is made inside a guard that puts it back when the unit is done:
//!
//! ```text
//! UndoScope
//! └── SelectionScope
//!     └── per unit
//!         ├── ChannelScope (originating track)
//!         │   └── ChannelScope (processing track)
//!         │       ├── move members, apply channel count
//!         │       └── EffectScope (isolate focused effect)
//!         │           └── HandshakeScope ── render call
//!         ├── move output (and anything else left behind) back
//!         └── rename output
//! ```

use serde::Serialize;

use audiosweet_common::{
    Action, AudioSweetError, AudioSweetResult, OperatingMode, RenderSettings, Timebase,
    SPLIT_THRESHOLD_SECS,
};
use audiosweet_processing_core::{
    ChannelDecision, ChannelInputs, ChannelResolver, ClipSpan, OutputNamer, PlanKind, RenderPlan, Unit,
    UnitDetector, WindowClassifier,
};
use audiosweet_project_model::{ClipId, EffectTarget, TimeWindow, TrackId};

use crate::host::{Host, RenderOp};
use crate::invoker::RenderInvoker;
use crate::presplit::apply_presplit;
use crate::scope::{ChannelScope, EffectScope, SelectionScope, UndoScope};
use crate::token::{DefaultTokenFormatter, TokenFormatter};

/// Per-unit result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOutcome {
    pub track: TrackId,
    pub start: f64,
    pub end: f64,
    #[serde(flatten)]
    pub status: UnitStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum UnitStatus {
    /// Rendered into `clip`, now named `name`, on the unit's track.
    Rendered { clip: ClipId, name: String },
    /// Effects copied onto the take chains of `clips`.
    Copied { clips: Vec<ClipId> },
    Failed { error: String },
}

/// Summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub action: Action,
    /// Render plan; absent for copy runs, which ignore the time window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanKind>,
    pub tokens: Vec<String>,
    pub outcomes: Vec<UnitOutcome>,
}

impl RunReport {
    pub fn rendered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, UnitStatus::Rendered { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, UnitStatus::Failed { .. }))
            .count()
    }

    /// Output clips in processing order.
    pub fn outputs(&self) -> Vec<ClipId> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                UnitStatus::Rendered { clip, .. } => Some(*clip),
                _ => None,
            })
            .collect()
    }

    pub fn to_json(&self) -> AudioSweetResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl UnitOutcome {
    fn new(track: TrackId, start: f64, end: f64, status: UnitStatus) -> Self {
        Self {
            track,
            start,
            end,
            status,
        }
    }

    fn for_unit(unit: &Unit, status: UnitStatus) -> Self {
        Self::new(unit.track, unit.start, unit.end, status)
    }
}

/// One render call and the clips it consumes.
#[derive(Debug, Clone)]
struct RenderJob {
    /// Originating track; the output ends up here.
    track: TrackId,
    members: Vec<ClipId>,
    op: RenderOp,
    /// Name the output is derived from, read before anything was glued.
    base_name: String,
}

/// Compiles the selection and renders it through a [`Host`].
#[derive(Debug, Clone)]
pub struct RenderPipeline<F = DefaultTokenFormatter> {
    settings: RenderSettings,
    formatter: F,
}

impl RenderPipeline {
    /// Build a pipeline; rejects invalid settings.
    pub fn new(settings: RenderSettings) -> AudioSweetResult<Self> {
        Ok(Self {
            settings: settings.validated()?,
            formatter: DefaultTokenFormatter,
        })
    }
}

impl<F: TokenFormatter> RenderPipeline<F> {
    /// Swap the effect token formatter.
    pub fn with_formatter<G: TokenFormatter>(self, formatter: G) -> RenderPipeline<G> {
        RenderPipeline {
            settings: self.settings,
            formatter,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Run once against the host's current selection.
    ///
    /// Selection, focus and window problems are reported before anything is
    /// touched. Render failures are recorded per unit and the run goes on,
    /// except when the render engine cannot be loaded at all.
    pub fn run<H: Host + ?Sized>(&self, host: &mut H) -> AudioSweetResult<RunReport> {
        let timebase = Timebase::from_sample_rate(host.sample_rate());

        let selected = host.selected_clips();
        if selected.is_empty() {
            return Err(AudioSweetError::NoSelection);
        }

        let no_focus = AudioSweetError::NoFocusTarget {
            mode: self.settings.mode.as_str(),
        };
        let target = host.focused_effect().ok_or(no_focus)?;
        let effect_count = host.effect_count(target.track)?;
        if target.index >= effect_count {
            return Err(AudioSweetError::NoFocusTarget {
                mode: self.settings.mode.as_str(),
            });
        }

        let spans = selected_spans(&*host);
        let units = UnitDetector::new(timebase).detect(&spans);

        tracing::info!(
            clips = spans.len(),
            units = units.len(),
            mode = self.settings.mode.as_str(),
            action = ?self.settings.action,
            "Starting run"
        );

        if self.settings.action == Action::Copy {
            return self.copy_effects(host, target, effect_count, &units, timebase);
        }

        let plan = WindowClassifier::new(timebase).classify(units, host.time_window())?;
        let tokens = self.tokens(&*host, target, effect_count)?;
        tracing::info!(plan = plan.kind().as_str(), tokens = ?tokens, "Render plan chosen");

        let mut undo = UndoScope::enter(&mut *host, undo_label(&tokens), self.settings.external_undo_scope);
        let mut scoped = SelectionScope::enter(&mut *undo, timebase);

        let outcomes = match &plan {
            RenderPlan::Direct { units } => {
                let mut outcomes = Vec::with_capacity(units.len());
                for unit in units {
                    let job = RenderJob {
                        track: unit.track,
                        members: unit.member_ids(),
                        op: RenderOp::GlueWithHandles,
                        base_name: first_member_name(&*scoped, unit)?,
                    };
                    let status = self.finish(self.render_job(&mut *scoped, &job, target, &tokens))?;
                    outcomes.push(UnitOutcome::for_unit(unit, status));
                }
                outcomes
            }
            RenderPlan::WindowedSingle { window, .. } => {
                let hits = self.presplit_hits(&mut scoped, *window, timebase)?;
                let mut outcomes = Vec::with_capacity(hits.len());
                for unit in &hits {
                    let job = RenderJob {
                        track: unit.track,
                        members: unit.member_ids(),
                        op: RenderOp::GlueInWindow { window: *window },
                        base_name: first_member_name(&*scoped, unit)?,
                    };
                    let status = self.finish(self.render_job(&mut *scoped, &job, target, &tokens))?;
                    outcomes.push(UnitOutcome::for_unit(unit, status));
                }
                outcomes
            }
            RenderPlan::WindowedGlobal { window, .. } => {
                let hits = self.presplit_hits(&mut scoped, *window, timebase)?;
                self.render_global(&mut *scoped, &hits, *window, target, &tokens)?
            }
        };

        let report = RunReport {
            action: Action::Apply,
            plan: Some(plan.kind()),
            tokens,
            outcomes,
        };
        tracing::info!(
            rendered = report.rendered_count(),
            failed = report.failed_count(),
            "Run finished"
        );
        Ok(report)
    }

    /// Turn a job result into a status; an unloadable engine ends the run.
    fn finish(&self, result: AudioSweetResult<(ClipId, String)>) -> AudioSweetResult<UnitStatus> {
        match result {
            Ok((clip, name)) => Ok(UnitStatus::Rendered { clip, name }),
            Err(e) if e.is_fatal_for_run() => {
                tracing::error!(error = %e, "Render engine unavailable; stopping run");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unit failed; continuing");
                Ok(UnitStatus::Failed {
                    error: e.to_string(),
                })
            }
        }
    }

    /// Cut at the window edges, then recompile the remaining selection.
    ///
    /// The split-off outside parts are deselected and keep their handles, so
    /// the selection to restore is retaken once the cuts are made. Units
    /// that only touch a window edge have nothing inside it and are left
    /// alone.
    fn presplit_hits<H: Host + ?Sized>(
        &self,
        scoped: &mut SelectionScope<'_, H>,
        window: TimeWindow,
        timebase: Timebase,
    ) -> AudioSweetResult<Vec<Unit>> {
        apply_presplit(&mut **scoped, window, SPLIT_THRESHOLD_SECS)?;
        scoped.recapture();

        let units = UnitDetector::new(timebase).detect(&selected_spans(&**scoped));
        let hits = WindowClassifier::new(timebase).inside(&units, &window);
        if hits.len() < units.len() {
            tracing::info!(
                skipped = units.len() - hits.len(),
                "Units without material inside the window are left untouched"
            );
        }
        Ok(hits)
    }

    /// Glue the hit units of each track inside the window as one batch, then
    /// render every glued clip as a new take.
    fn render_global<H: Host + ?Sized>(
        &self,
        host: &mut H,
        hits: &[Unit],
        window: TimeWindow,
        target: EffectTarget,
        tokens: &[String],
    ) -> AudioSweetResult<Vec<UnitOutcome>> {
        let invoker = self.invoker();

        let mut batches: Vec<(TrackId, Vec<&Unit>)> = vec![];
        for unit in hits {
            match batches.iter_mut().find(|(track, _)| *track == unit.track) {
                Some((_, units)) => units.push(unit),
                None => batches.push((unit.track, vec![unit])),
            }
        }

        let mut glued = Vec::with_capacity(batches.len());
        for (track, units) in &batches {
            let members: Vec<ClipId> = units.iter().flat_map(|u| u.member_ids()).collect();
            let result = first_member_name(&*host, units[0]).and_then(|base_name| {
                host.select_only(&members);
                invoker
                    .plain_glue(&mut *host, window)
                    .map(|clip| (clip, base_name))
            });
            if let Err(e) = &result {
                tracing::warn!(track = %track, error = %e, "Glue inside window failed");
            }
            glued.push(result);
        }

        let mut outcomes = Vec::with_capacity(batches.len());
        for ((track, units), glue) in batches.iter().zip(glued) {
            let result = glue.and_then(|(clip, base_name)| {
                let job = RenderJob {
                    track: *track,
                    members: vec![clip],
                    op: RenderOp::RenderNewTake,
                    base_name,
                };
                self.render_job(host, &job, target, tokens)
            });
            let start = units.iter().map(|u| u.start).fold(f64::INFINITY, f64::min);
            let end = units.iter().map(|u| u.end).fold(f64::NEG_INFINITY, f64::max);
            outcomes.push(UnitOutcome::new(*track, start, end, self.finish(result)?));
        }
        Ok(outcomes)
    }

    /// Render one job on the processing track and bring the output home.
    fn render_job<H: Host + ?Sized>(
        &self,
        host: &mut H,
        job: &RenderJob,
        target: EffectTarget,
        tokens: &[String],
    ) -> AudioSweetResult<(ClipId, String)> {
        let fx_track = target.track;

        let playback_channels = job
            .members
            .iter()
            .filter_map(|&id| host.clip(id))
            .map(|clip| clip.playback_channels())
            .collect();
        let inputs = ChannelInputs {
            playback_channels,
            source_track_channels: host.track_channel_count(job.track)?,
            target_track_channels: host.track_channel_count(fx_track)?,
        };
        let decision =
            ChannelResolver::new(self.settings.channel_policy, self.settings.channel_mode).resolve(&inputs);

        tracing::debug!(
            track = %job.track,
            members = job.members.len(),
            op = ?job.op,
            decision = ?decision,
            "Rendering unit"
        );

        let mut source_channels = ChannelScope::enter(&mut *host, job.track)?;
        let mut fx_channels = ChannelScope::enter(&mut *source_channels, fx_track)?;
        let resident = fx_channels.clips_on_track(fx_track);

        let result = self.render_on_fx_track(&mut fx_channels, job, target, &decision);

        if job.track != fx_track {
            return_strays(&mut *fx_channels, fx_track, job.track, &resident);
        }

        let output = result?;
        let name = OutputNamer::new(self.settings.token_cap).apply(&job.base_name, tokens);
        fx_channels.set_clip_name(output, &name)?;
        tracing::info!(clip = %output, track = %job.track, name = %name, "Rendered unit");
        Ok((output, name))
    }

    fn render_on_fx_track<H: Host + ?Sized>(
        &self,
        fx_channels: &mut ChannelScope<'_, H>,
        job: &RenderJob,
        target: EffectTarget,
        decision: &ChannelDecision,
    ) -> AudioSweetResult<ClipId> {
        if job.track != target.track {
            for &clip in &job.members {
                fx_channels.move_clip(clip, target.track)?;
            }
        }

        if let Some(count) = decision.track_channels {
            fx_channels.apply(count)?;
        }

        let isolate = match self.settings.mode {
            OperatingMode::Focused => Some(target.index),
            OperatingMode::Chain => None,
        };
        let mut effects = EffectScope::enter(&mut **fx_channels, target.track, isolate)?;
        effects.select_only(&job.members);
        self.invoker().invoke(&mut *effects, job.op, decision)
    }

    fn invoker(&self) -> RenderInvoker {
        RenderInvoker::new(self.settings.take_fx, self.settings.track_fx)
    }

    /// Naming tokens for this run.
    fn tokens<H: Host + ?Sized>(
        &self,
        host: &H,
        target: EffectTarget,
        effect_count: usize,
    ) -> AudioSweetResult<Vec<String>> {
        let mut tokens = vec![];
        match self.settings.mode {
            OperatingMode::Focused => {
                let name = host.effect_name(target.track, target.index)?;
                tokens.push(self.formatter.token_for(&name));
            }
            OperatingMode::Chain => {
                for index in 0..effect_count {
                    if host.effect_enabled(target.track, index)? {
                        let name = host.effect_name(target.track, index)?;
                        tokens.push(self.formatter.token_for(&name));
                    }
                }
                if tokens.is_empty() {
                    tokens.push(host.track_name(target.track)?);
                }
            }
        }
        tokens.retain(|t| !t.trim().is_empty());
        Ok(tokens)
    }

    /// Copy the focused effect (or the whole chain) onto every selected take.
    fn copy_effects<H: Host + ?Sized>(
        &self,
        host: &mut H,
        target: EffectTarget,
        effect_count: usize,
        units: &[Unit],
        timebase: Timebase,
    ) -> AudioSweetResult<RunReport> {
        let indices: Vec<usize> = match self.settings.mode {
            OperatingMode::Focused => vec![target.index],
            OperatingMode::Chain => (0..effect_count).collect(),
        };
        let tokens = self.tokens(&*host, target, effect_count)?;

        let mut undo = UndoScope::enter(&mut *host, undo_label(&tokens), self.settings.external_undo_scope);
        let mut scoped = SelectionScope::enter(&mut *undo, timebase);

        let mut outcomes = Vec::with_capacity(units.len());
        for unit in units {
            let status = match copy_onto_unit(&mut *scoped, unit, target.track, &indices) {
                Ok(clips) => UnitStatus::Copied { clips },
                Err(e) => {
                    tracing::warn!(track = %unit.track, error = %e, "Copying effects failed");
                    UnitStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(UnitOutcome::for_unit(unit, status));
        }

        tracing::info!(units = outcomes.len(), effects = indices.len(), "Copied effects");
        Ok(RunReport {
            action: Action::Copy,
            plan: None,
            tokens,
            outcomes,
        })
    }
}

fn copy_onto_unit<H: Host + ?Sized>(
    host: &mut H,
    unit: &Unit,
    track: TrackId,
    indices: &[usize],
) -> AudioSweetResult<Vec<ClipId>> {
    let mut copied = Vec::with_capacity(unit.len());
    for member in &unit.members {
        for &index in indices {
            host.copy_effect_to_clip(EffectTarget::new(track, index), member.id)?;
        }
        copied.push(member.id);
    }
    Ok(copied)
}

/// Move everything that landed on the processing track during a job back
/// to the originating track.
fn return_strays<H: Host + ?Sized>(host: &mut H, fx_track: TrackId, home: TrackId, resident: &[ClipId]) {
    for clip in host.clips_on_track(fx_track) {
        if resident.contains(&clip) {
            continue;
        }
        if let Err(e) = host.move_clip(clip, home) {
            tracing::error!(clip = %clip, track = %home, error = %e, "Failed to move clip back");
        }
    }
}

fn selected_spans<H: Host + ?Sized>(host: &H) -> Vec<ClipSpan> {
    host.selected_clips()
        .into_iter()
        .filter_map(|id| host.clip(id))
        .map(|clip| ClipSpan::from_clip(&clip))
        .collect()
}

fn first_member_name<H: Host + ?Sized>(host: &H, unit: &Unit) -> AudioSweetResult<String> {
    let first = unit
        .members
        .first()
        .ok_or_else(|| AudioSweetError::host(format!("empty unit on {}", unit.track)))?;
    host.clip(first.id)
        .map(|clip| clip.name)
        .ok_or_else(|| AudioSweetError::host(format!("{} no longer exists", first.id)))
}

fn undo_label(tokens: &[String]) -> String {
    if tokens.is_empty() {
        "AudioSweet".to_string()
    } else {
        format!("AudioSweet: {}", tokens.join(" + "))
    }
}
