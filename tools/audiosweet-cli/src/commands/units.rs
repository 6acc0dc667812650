//! Show how the current selection compiles into units.

use std::path::PathBuf;

use audiosweet_common::Timebase;
use audiosweet_processing_core::{RenderPlan, UnitDetector, WindowClassifier};
use audiosweet_project_model::LoadedSession;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let loaded =
        LoadedSession::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let session = loaded.session();

    let timebase = Timebase::from_sample_rate(session.sample_rate);
    let selected: Vec<_> = session
        .selected_clips()
        .into_iter()
        .filter_map(|id| session.clip(id))
        .collect();
    let units = UnitDetector::new(timebase).detect_clips(selected.iter().copied());

    println!("Session: {}", loaded.file.name);
    println!("  Selected clips: {}", selected.len());
    println!("  Epsilon: {:.9}s", timebase.epsilon());
    println!("\nUnits ({}):", units.len());
    for (i, unit) in units.iter().enumerate() {
        let track = session
            .track(unit.track)
            .map(|t| t.name.as_str())
            .unwrap_or("?");
        let members: Vec<String> = unit.members.iter().map(|m| m.id.to_string()).collect();
        println!(
            "  {:>2}. {} {:.3}s..{:.3}s  [{}]",
            i + 1,
            track,
            unit.start,
            unit.end,
            members.join(", ")
        );
    }

    match session.time_window {
        Some(w) => println!("\nTime window: {:.3}s..{:.3}s", w.start, w.end),
        None => println!("\nTime window: none"),
    }

    match WindowClassifier::new(timebase).classify(units, session.time_window) {
        Ok(plan) => {
            println!("Plan: {}", plan.kind().as_str());
            match &plan {
                RenderPlan::Direct { units } => println!("  {} unit(s) glued with handles", units.len()),
                RenderPlan::WindowedSingle { unit, .. } => {
                    println!("  1 unit glued inside the window ({} clip(s))", unit.len())
                }
                RenderPlan::WindowedGlobal { units, .. } => {
                    println!("  {} unit(s) glued inside the window, then rendered per clip", units.len())
                }
            }
        }
        Err(e) => println!("Plan: none ({e})"),
    }

    Ok(())
}
