use std::path::PathBuf;

use audiosweet_common::RenderSettings;
use audiosweet_processing_core::{PlanKind, RenderChannelMode};
use audiosweet_project_model::{LoadedSession, TrackId};
use audiosweet_render_engine::{Host, MemoryHost, RenderPipeline};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-session")
        .join("session.json")
}

fn load_fixture() -> LoadedSession {
    LoadedSession::load(fixture_path()).expect("fixture session should load")
}

#[test]
fn fixture_session_is_valid() {
    let loaded = load_fixture();
    assert_eq!(loaded.file.name, "sample-session");
    assert!(loaded.session().validate().is_empty());
    assert_eq!(loaded.session().selected_clips().len(), 4);
}

#[test]
fn fixture_session_renders_each_unit_once() {
    let loaded = load_fixture();
    let mut host = MemoryHost::new(loaded.session().clone());

    let report = RenderPipeline::new(RenderSettings::default())
        .unwrap()
        .run(&mut host)
        .unwrap();

    assert_eq!(report.plan, Some(PlanKind::Direct));
    assert_eq!(report.rendered_count(), 3);
    assert_eq!(host.render_calls(), 3);

    let names = |track: u64| -> Vec<String> {
        host.clips_on_track(TrackId(track))
            .into_iter()
            .filter_map(|id| host.clip(id))
            .map(|c| c.name)
            .collect()
    };
    assert_eq!(names(1), vec!["Kick-AS1-Pro-C 2", "Hat-AS1-Pro-C 2"]);
    assert_eq!(names(2), vec!["Bass DI-AS1-Pro-C 2", "Bass Amp"]);
    assert!(names(3).is_empty());

    // The left-only bass take plays one channel.
    let modes: Vec<RenderChannelMode> = host
        .render_log()
        .iter()
        .map(|r| r.request.channel_mode)
        .collect();
    assert_eq!(
        modes,
        vec![RenderChannelMode::Auto, RenderChannelMode::Auto, RenderChannelMode::Mono]
    );

    let fx = loaded.session().track(TrackId(3)).unwrap();
    assert_eq!(host.session().track(TrackId(3)).unwrap(), fx);
}

#[test]
fn rendered_session_round_trips_through_disk() {
    let mut loaded = load_fixture();
    let mut host = MemoryHost::new(loaded.session().clone());
    RenderPipeline::new(RenderSettings::default())
        .unwrap()
        .run(&mut host)
        .unwrap();

    *loaded.session_mut() = host.into_session();
    let dir = std::env::temp_dir().join(format!("audiosweet-fixture-{}", std::process::id()));
    let path = dir.join("rendered.session.json");
    loaded.save_as(&path).unwrap();

    let reloaded = LoadedSession::load(&path).unwrap();
    assert_eq!(reloaded.session(), loaded.session());

    let _ = std::fs::remove_dir_all(dir);
}
