use std::collections::BTreeSet;

use proptest::prelude::*;

use audiosweet_common::Timebase;
use audiosweet_processing_core::units::{ClipSpan, UnitDetector};
use audiosweet_processing_core::window::{PlanKind, WindowClassifier};
use audiosweet_project_model::{ClipId, TimeWindow, TrackId};

const SAMPLE_RATE: u32 = 48_000;

fn detector() -> UnitDetector {
    UnitDetector::new(Timebase::from_sample_rate(Some(SAMPLE_RATE)))
}

fn clip_strategy() -> impl Strategy<Value = Vec<ClipSpan>> {
    prop::collection::vec((0u64..3, 0.0f64..60.0, 0.01f64..5.0), 0..24).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (track, start, len))| {
                ClipSpan::new(ClipId(i as u64 + 1), TrackId(track + 1), start, start + len)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn units_partition_the_selection(clips in clip_strategy()) {
        let units = detector().detect(&clips);

        let mut seen = BTreeSet::new();
        for unit in &units {
            for member in &unit.members {
                prop_assert!(seen.insert(member.id), "clip {:?} in two units", member.id);
                prop_assert_eq!(member.track, unit.track);
            }
        }
        let input: BTreeSet<ClipId> = clips.iter().map(|c| c.id).collect();
        prop_assert_eq!(seen, input);
    }

    #[test]
    fn unit_span_covers_members(clips in clip_strategy()) {
        for unit in detector().detect(&clips) {
            let min = unit.members.iter().map(|m| m.start).fold(f64::INFINITY, f64::min);
            let max = unit.members.iter().map(|m| m.end).fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(unit.start, min);
            prop_assert_eq!(unit.end, max);
            for pair in unit.members.windows(2) {
                prop_assert!(pair[0].start <= pair[1].start);
            }
        }
    }

    #[test]
    fn units_on_one_track_are_separated_by_gaps(clips in clip_strategy()) {
        let eps = 1.0 / SAMPLE_RATE as f64;
        let units = detector().detect(&clips);
        for (i, a) in units.iter().enumerate() {
            for b in units.iter().skip(i + 1).filter(|b| b.track == a.track) {
                prop_assert!(b.start > a.end + eps || a.start > b.end + eps);
            }
        }
    }

    #[test]
    fn sub_sample_gap_always_merges(start in 0.0f64..100.0, len in 0.01f64..10.0, frac in 0.0f64..1.0) {
        let eps = 1.0 / SAMPLE_RATE as f64;
        let a = ClipSpan::new(ClipId(1), TrackId(1), start, start + len);
        let b_start = start + len + eps * frac * 0.99;
        let b = ClipSpan::new(ClipId(2), TrackId(1), b_start, b_start + len);
        prop_assert_eq!(detector().detect(&[a, b]).len(), 1);
    }

    #[test]
    fn gap_beyond_one_sample_always_splits(start in 0.0f64..100.0, len in 0.01f64..10.0, extra in 2.0f64..1000.0) {
        let eps = 1.0 / SAMPLE_RATE as f64;
        let a = ClipSpan::new(ClipId(1), TrackId(1), start, start + len);
        let b_start = start + len + eps * extra;
        let b = ClipSpan::new(ClipId(2), TrackId(1), b_start, b_start + len);
        prop_assert_eq!(detector().detect(&[a, b]).len(), 2);
    }

    #[test]
    fn window_equal_to_any_unit_is_direct(clips in clip_strategy(), pick in any::<prop::sample::Index>()) {
        let units = detector().detect(&clips);
        prop_assume!(!units.is_empty());
        let chosen = &units[pick.index(units.len())];
        let window = TimeWindow::new(chosen.start, chosen.end);

        let classifier = WindowClassifier::new(Timebase::from_sample_rate(Some(SAMPLE_RATE)));
        let plan = classifier.classify(units.clone(), Some(window)).unwrap();
        prop_assert_eq!(plan.kind(), PlanKind::Direct);
    }
}
