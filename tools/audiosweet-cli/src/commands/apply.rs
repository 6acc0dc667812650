//! Run the render pipeline against a session file.

use std::path::PathBuf;

use audiosweet_common::RenderSettings;
use audiosweet_project_model::LoadedSession;
use audiosweet_render_engine::{MemoryHost, RenderPipeline, UnitStatus};

/// Settings given on the command line; unset fields keep the configured value.
pub struct Overrides {
    pub mode: Option<String>,
    pub action: Option<String>,
    pub channel_mode: Option<String>,
    pub policy: Option<String>,
    pub cap: Option<usize>,
}

/// Render engine failure injection.
pub struct Simulation {
    pub fail_render: Vec<usize>,
    pub engine_offline: bool,
}

impl Overrides {
    fn apply_to(self, mut settings: RenderSettings) -> anyhow::Result<RenderSettings> {
        if let Some(mode) = self.mode {
            settings.mode = mode.parse()?;
        }
        if let Some(action) = self.action {
            settings.action = action.parse()?;
        }
        if let Some(channel_mode) = self.channel_mode {
            settings.channel_mode = channel_mode.parse()?;
        }
        if let Some(policy) = self.policy {
            settings.channel_policy = policy.parse()?;
        }
        if let Some(cap) = self.cap {
            settings.token_cap = cap;
        }
        Ok(settings)
    }
}

pub fn run(
    path: PathBuf,
    overrides: Overrides,
    defaults: RenderSettings,
    simulation: Simulation,
    output: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let mut loaded =
        LoadedSession::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;

    let settings = overrides.apply_to(defaults)?;
    let pipeline = RenderPipeline::new(settings)?;

    let mut host = MemoryHost::new(loaded.session().clone());
    if simulation.engine_offline {
        host = host.with_engine_offline();
    }
    for call in simulation.fail_render {
        host = host.fail_render_call(call);
    }

    tracing::info!(session = %path.display(), "Running pipeline");
    let report = pipeline.run(&mut host)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("Action: {:?}", report.action);
        if let Some(plan) = report.plan {
            println!("Plan: {}", plan.as_str());
        }
        println!("Tokens: {}", report.tokens.join(", "));
        println!("\nUnits ({}):", report.outcomes.len());
        for outcome in &report.outcomes {
            let span = format!("{} {:.3}s..{:.3}s", outcome.track, outcome.start, outcome.end);
            match &outcome.status {
                UnitStatus::Rendered { clip, name } => println!("  ok      {span} -> {clip} \"{name}\""),
                UnitStatus::Copied { clips } => println!("  copied  {span} ({} clip(s))", clips.len()),
                UnitStatus::Failed { error } => println!("  failed  {span}: {error}"),
            }
        }
        println!(
            "\n{} rendered, {} failed, {} render call(s)",
            report.rendered_count(),
            report.failed_count(),
            host.render_calls()
        );
    }

    *loaded.session_mut() = host.into_session();
    loaded.file.touch();
    let target = output.unwrap_or(path);
    loaded
        .save_as(&target)
        .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;
    if !json {
        println!("Saved: {}", target.display());
    }

    Ok(())
}
