//! Pre-split planning at time-window edges.
//!
//! A clip that straddles a window edge by more than the split threshold is
//! cut there, and only the in-window portion stays selected. Without the cut,
//! the whole original clip would be moved to the processing track while only
//! the in-window slice is glued back, losing the material outside the window.

use audiosweet_project_model::{ClipId, TimeWindow};

use crate::units::ClipSpan;

/// Cuts to apply to one clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlan {
    pub clip: ClipId,
    /// Cut at the window start; the left part leaves the selection.
    pub cut_start: Option<f64>,
    /// Cut at the window end; the right part leaves the selection.
    pub cut_end: Option<f64>,
}

impl SplitPlan {
    pub fn cut_count(&self) -> usize {
        self.cut_start.is_some() as usize + self.cut_end.is_some() as usize
    }
}

/// Plan the cuts for `clips` against `window`.
///
/// A clip is cut at an edge only when material extends more than `threshold`
/// past the edge on both sides of it. Clips needing no cut are omitted.
pub fn plan_splits(clips: &[ClipSpan], window: TimeWindow, threshold: f64) -> Vec<SplitPlan> {
    let straddles = |clip: &ClipSpan, edge: f64| {
        clip.start < edge - threshold && clip.end > edge + threshold
    };

    clips
        .iter()
        .filter_map(|clip| {
            let plan = SplitPlan {
                clip: clip.id,
                cut_start: straddles(clip, window.start).then_some(window.start),
                cut_end: straddles(clip, window.end).then_some(window.end),
            };
            (plan.cut_count() > 0).then_some(plan)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiosweet_common::SPLIT_THRESHOLD_SECS;
    use audiosweet_project_model::TrackId;

    fn span(id: u64, start: f64, end: f64) -> ClipSpan {
        ClipSpan::new(ClipId(id), TrackId(1), start, end)
    }

    #[test]
    fn test_clip_covering_window_is_cut_twice() {
        let plans = plan_splits(&[span(1, 0.0, 10.0)], TimeWindow::new(2.0, 4.0), SPLIT_THRESHOLD_SECS);
        assert_eq!(
            plans,
            vec![SplitPlan {
                clip: ClipId(1),
                cut_start: Some(2.0),
                cut_end: Some(4.0),
            }]
        );
    }

    #[test]
    fn test_clip_straddling_one_edge() {
        let plans = plan_splits(
            &[span(1, 0.0, 3.0), span(2, 3.0, 6.0)],
            TimeWindow::new(2.0, 5.0),
            SPLIT_THRESHOLD_SECS,
        );
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].cut_start, Some(2.0));
        assert_eq!(plans[0].cut_end, None);
        assert_eq!(plans[1].cut_start, None);
        assert_eq!(plans[1].cut_end, Some(5.0));
    }

    #[test]
    fn test_overhang_within_threshold_is_not_cut() {
        let plans = plan_splits(
            &[span(1, 1.999, 4.001)],
            TimeWindow::new(2.0, 4.0),
            SPLIT_THRESHOLD_SECS,
        );
        assert!(plans.is_empty());
    }

    #[test]
    fn test_clips_inside_or_outside_are_untouched() {
        let plans = plan_splits(
            &[span(1, 2.5, 3.5), span(2, 8.0, 9.0)],
            TimeWindow::new(2.0, 4.0),
            SPLIT_THRESHOLD_SECS,
        );
        assert!(plans.is_empty());
    }
}
