//! Time-window classification: pick a render strategy for the detected units.
//!
//! | Window | Hit units | Plan |
//! |---|---|---|
//! | none | – | `Direct` (glue with handles) |
//! | equals a hit unit's span | any | `Direct` |
//! | set | exactly one | `WindowedSingle` (pre-split, glue inside the window) |
//! | set | two or more | `WindowedGlobal` (batch glue inside the window, then per clip) |
//! | set | none | error: the window misses the selection |
//!
//! Equality is checked first, so it wins even when several units are hit.

use serde::Serialize;

use audiosweet_common::{AudioSweetError, AudioSweetResult, Timebase};
use audiosweet_project_model::TimeWindow;

use crate::units::Unit;

/// The render strategy chosen for a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPlan {
    /// Render every unit whole, with handles.
    Direct { units: Vec<Unit> },
    /// Render the single hit unit inside the window, no handles.
    WindowedSingle { unit: Unit, window: TimeWindow },
    /// Glue every hit unit inside the window, then render each resulting clip.
    WindowedGlobal { units: Vec<Unit>, window: TimeWindow },
}

/// Discriminant of a [`RenderPlan`], for reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanKind {
    Direct,
    WindowedSingle,
    WindowedGlobal,
}

/// Classifies units against an optional time window.
#[derive(Debug, Clone, Copy)]
pub struct WindowClassifier {
    timebase: Timebase,
}

impl RenderPlan {
    pub fn kind(&self) -> PlanKind {
        match self {
            Self::Direct { .. } => PlanKind::Direct,
            Self::WindowedSingle { .. } => PlanKind::WindowedSingle,
            Self::WindowedGlobal { .. } => PlanKind::WindowedGlobal,
        }
    }

    /// The window the plan is constrained to, if any.
    pub fn window(&self) -> Option<TimeWindow> {
        match self {
            Self::Direct { .. } => None,
            Self::WindowedSingle { window, .. } | Self::WindowedGlobal { window, .. } => {
                Some(*window)
            }
        }
    }

    /// Whether clips must be cut at the window edges before rendering.
    pub fn needs_presplit(&self) -> bool {
        !matches!(self, Self::Direct { .. })
    }
}

impl PlanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::WindowedSingle => "windowed-single",
            Self::WindowedGlobal => "windowed-global",
        }
    }
}

impl WindowClassifier {
    pub fn new(timebase: Timebase) -> Self {
        Self { timebase }
    }

    /// Whether a unit overlaps or touches the window.
    pub fn overlaps(&self, unit: &Unit, window: &TimeWindow) -> bool {
        self.timebase
            .intervals_touch(unit.start, unit.end, window.start, window.end)
    }

    /// Whether the window equals the unit's span within one sample period.
    pub fn matches_span(&self, unit: &Unit, window: &TimeWindow) -> bool {
        self.timebase.nearly_equal(unit.start, window.start)
            && self.timebase.nearly_equal(unit.end, window.end)
    }

    /// Units the window overlaps, in input order.
    pub fn hits(&self, units: &[Unit], window: &TimeWindow) -> Vec<Unit> {
        units
            .iter()
            .filter(|u| self.overlaps(u, window))
            .cloned()
            .collect()
    }

    /// Units sharing more than one sample period with the window.
    ///
    /// After pre-splitting, a unit that only touches a window edge has
    /// nothing inside the window to render.
    pub fn inside(&self, units: &[Unit], window: &TimeWindow) -> Vec<Unit> {
        units
            .iter()
            .filter(|u| {
                self.timebase
                    .overlaps_beyond(u.start, u.end, window.start, window.end)
            })
            .cloned()
            .collect()
    }

    /// Choose the render plan.
    pub fn classify(&self, units: Vec<Unit>, window: Option<TimeWindow>) -> AudioSweetResult<RenderPlan> {
        let Some(window) = window.filter(|w| !w.is_empty()) else {
            return Ok(RenderPlan::Direct { units });
        };

        let mut hits = self.hits(&units, &window);

        if hits.iter().any(|u| self.matches_span(u, &window)) {
            tracing::debug!(
                start = window.start,
                end = window.end,
                "Window equals a unit span; rendering units whole"
            );
            return Ok(RenderPlan::Direct { units });
        }

        match hits.len() {
            0 => Err(AudioSweetError::WindowMissesSelection {
                start: window.start,
                end: window.end,
            }),
            1 => Ok(RenderPlan::WindowedSingle {
                unit: hits.remove(0),
                window,
            }),
            _ => Ok(RenderPlan::WindowedGlobal {
                units: hits,
                window,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{ClipSpan, UnitDetector};
    use audiosweet_project_model::{ClipId, TrackId};

    fn timebase() -> Timebase {
        Timebase::from_sample_rate(Some(48_000))
    }

    fn units(spans: &[(u64, u64, f64, f64)]) -> Vec<Unit> {
        let spans: Vec<ClipSpan> = spans
            .iter()
            .map(|&(id, track, s, e)| ClipSpan::new(ClipId(id), TrackId(track), s, e))
            .collect();
        UnitDetector::new(timebase()).detect(&spans)
    }

    #[test]
    fn test_no_window_is_direct() {
        let plan = WindowClassifier::new(timebase())
            .classify(units(&[(1, 1, 0.0, 2.0), (2, 1, 5.0, 6.0)]), None)
            .unwrap();
        assert_eq!(plan.kind(), PlanKind::Direct);
        assert!(!plan.needs_presplit());
        match plan {
            RenderPlan::Direct { units } => assert_eq!(units.len(), 2),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_empty_window_is_treated_as_absent() {
        let plan = WindowClassifier::new(timebase())
            .classify(units(&[(1, 1, 0.0, 2.0)]), Some(TimeWindow::new(1.0, 1.0)))
            .unwrap();
        assert_eq!(plan.kind(), PlanKind::Direct);
    }

    #[test]
    fn test_window_equal_to_unit_is_direct() {
        let eps = 1.0 / 48_000.0;
        let plan = WindowClassifier::new(timebase())
            .classify(
                units(&[(1, 1, 1.0, 3.0)]),
                Some(TimeWindow::new(1.0 + eps * 0.5, 3.0 - eps * 0.5)),
            )
            .unwrap();
        assert_eq!(plan.kind(), PlanKind::Direct);
    }

    #[test]
    fn test_window_inside_single_unit() {
        let plan = WindowClassifier::new(timebase())
            .classify(
                units(&[(1, 1, 0.0, 4.0), (2, 1, 10.0, 12.0)]),
                Some(TimeWindow::new(1.0, 2.0)),
            )
            .unwrap();
        assert_eq!(plan.kind(), PlanKind::WindowedSingle);
        assert!(plan.needs_presplit());
        match plan {
            RenderPlan::WindowedSingle { unit, window } => {
                assert_eq!(unit.member_ids(), vec![ClipId(1)]);
                assert_eq!(window, TimeWindow::new(1.0, 2.0));
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_window_across_units_is_global() {
        let plan = WindowClassifier::new(timebase())
            .classify(
                units(&[(1, 1, 0.0, 4.0), (2, 2, 1.0, 5.0), (3, 1, 20.0, 21.0)]),
                Some(TimeWindow::new(2.0, 3.0)),
            )
            .unwrap();
        match plan {
            RenderPlan::WindowedGlobal { units, .. } => {
                assert_eq!(units.len(), 2);
                assert!(units.iter().all(|u| !u.contains(ClipId(3))));
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_equality_beats_multiple_hits() {
        // Unit A equals the window; unit B on another track also overlaps it.
        let plan = WindowClassifier::new(timebase())
            .classify(
                units(&[(1, 1, 2.0, 4.0), (2, 2, 0.0, 10.0)]),
                Some(TimeWindow::new(2.0, 4.0)),
            )
            .unwrap();
        assert_eq!(plan.kind(), PlanKind::Direct);
    }

    #[test]
    fn test_window_missing_selection_errors() {
        let result = WindowClassifier::new(timebase())
            .classify(units(&[(1, 1, 0.0, 1.0)]), Some(TimeWindow::new(5.0, 6.0)));
        assert!(matches!(
            result,
            Err(AudioSweetError::WindowMissesSelection { .. })
        ));
    }

    #[test]
    fn test_touching_window_counts_as_hit() {
        let classifier = WindowClassifier::new(timebase());
        let u = units(&[(1, 1, 0.0, 2.0)]);
        assert!(classifier.overlaps(&u[0], &TimeWindow::new(2.0, 3.0)));
        assert!(!classifier.overlaps(&u[0], &TimeWindow::new(2.1, 3.0)));
    }

    #[test]
    fn test_inside_drops_units_that_only_touch_the_window() {
        let classifier = WindowClassifier::new(timebase());
        let window = TimeWindow::new(2.0, 4.0);
        let u = units(&[(1, 1, 0.0, 2.0), (2, 2, 1.0, 3.0), (3, 3, 4.0, 6.0)]);

        assert_eq!(classifier.hits(&u, &window).len(), 3);
        let inside = classifier.inside(&u, &window);
        assert_eq!(inside.len(), 1);
        assert!(inside[0].contains(ClipId(2)));
    }

    #[test]
    fn test_plan_kind_serializes_kebab_case() {
        let kind = PlanKind::WindowedSingle;
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"windowed-single\"");
        assert_eq!(kind.as_str(), "windowed-single");
    }
}
