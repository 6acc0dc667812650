use proptest::prelude::*;

use audiosweet_common::{AudioSweetError, OperatingMode, RenderSettings};
use audiosweet_project_model::{Effect, EffectTarget, Session, Take, TimeWindow};
use audiosweet_render_engine::{Host, MemoryHost, RenderPipeline};

#[derive(Debug, Clone)]
struct Case {
    flags: Vec<bool>,
    focus: usize,
    /// `(gap before, length, source channels)` per clip.
    clips: Vec<(f64, f64, u32)>,
    fail_calls: Vec<usize>,
    chain: bool,
    fx_channels: u32,
    /// `(start, length)` of the time window, if any.
    window: Option<(f64, f64)>,
}

fn case_strategy() -> impl Strategy<Value = Case> {
    (
        prop::collection::vec(any::<bool>(), 1..5),
        prop::collection::vec((prop_oneof![Just(0.0), 0.5f64..3.0], 0.25f64..4.0, 1u32..7), 1..6),
        prop::collection::vec(1usize..8, 0..4),
        any::<bool>(),
        1u32..5,
        any::<prop::sample::Index>(),
        prop::option::of((0.0f64..20.0, 0.1f64..6.0)),
    )
        .prop_map(|(flags, clips, fail_calls, chain, fx_channels, focus, window)| Case {
            focus: focus.index(flags.len()),
            flags,
            clips,
            fail_calls,
            chain,
            fx_channels,
            window,
        })
}

fn build(case: &Case) -> Session {
    let mut session = Session::new(Some(48_000));
    let source = session.add_track("Source", 2);
    let fx = session.add_track("FX", case.fx_channels);
    if let Some(track) = session.track_mut(fx) {
        track.effects = case
            .flags
            .iter()
            .enumerate()
            .map(|(i, &enabled)| Effect::new(format!("FX {i}"), enabled))
            .collect();
    }

    let mut cursor = 0.0;
    let mut ids = vec![];
    for (i, &(gap, len, channels)) in case.clips.iter().enumerate() {
        cursor += gap;
        ids.push(session.add_clip(source, format!("Clip {i}"), cursor, len, Take::new("src.wav", channels)));
        cursor += len;
    }
    session.select_only(&ids);
    session.focused_effect = Some(EffectTarget::new(fx, case.focus));
    session.time_window = case.window.map(|(start, len)| TimeWindow::new(start, start + len));
    session
}

proptest! {
    #[test]
    fn tracks_are_restored_whatever_the_render_outcome_or_window(case in case_strategy()) {
        let session = build(&case);
        let tracks_before = session.tracks.clone();
        let fx = session.tracks[1].id;

        let mut host = MemoryHost::new(session);
        for &call in &case.fail_calls {
            host = host.fail_render_call(call);
        }
        let settings = RenderSettings {
            mode: if case.chain { OperatingMode::Chain } else { OperatingMode::Focused },
            ..RenderSettings::default()
        };

        // Failing calls hit plain glues as well as effect renders.
        let result = RenderPipeline::new(settings).unwrap().run(&mut host);

        prop_assert_eq!(&host.session().tracks, &tracks_before);
        prop_assert!(host.clips_on_track(fx).is_empty());
        prop_assert_eq!(host.handshake(), None);
        prop_assert_eq!(host.undo_depth(), 0);
        match result {
            Ok(report) => {
                prop_assert_eq!(report.rendered_count() + report.failed_count(), report.outcomes.len());
                prop_assert_eq!(report.outputs().len(), report.rendered_count());
            }
            Err(e) => {
                prop_assert!(matches!(e, AudioSweetError::WindowMissesSelection { .. }), "{}", e);
                prop_assert_eq!(host.render_calls(), 0);
            }
        }
    }
}
