//! Apply window-edge cuts through the host.

use audiosweet_common::AudioSweetResult;
use audiosweet_processing_core::{plan_splits, ClipSpan};
use audiosweet_project_model::{ClipId, TimeWindow};

use crate::host::Host;

/// Cut every selected clip straddling a window edge by more than `threshold`.
///
/// Parts outside the window are deselected and stay where they are. Returns
/// the selection afterwards.
pub fn apply_presplit<H: Host + ?Sized>(
    host: &mut H,
    window: TimeWindow,
    threshold: f64,
) -> AudioSweetResult<Vec<ClipId>> {
    let spans: Vec<ClipSpan> = host
        .selected_clips()
        .into_iter()
        .filter_map(|id| host.clip(id))
        .map(|clip| ClipSpan::from_clip(&clip))
        .collect();

    let plans = plan_splits(&spans, window, threshold);
    let mut cuts = 0;

    for plan in &plans {
        let mut inside = plan.clip;

        if let Some(at) = plan.cut_start {
            let right = host.split_clip(inside, at)?;
            host.set_clip_selected(inside, false)?;
            host.set_clip_selected(right, true)?;
            inside = right;
            cuts += 1;
        }

        if let Some(at) = plan.cut_end {
            let right = host.split_clip(inside, at)?;
            host.set_clip_selected(right, false)?;
            host.set_clip_selected(inside, true)?;
            cuts += 1;
        }
    }

    if cuts > 0 {
        tracing::info!(
            clips = plans.len(),
            cuts,
            start = window.start,
            end = window.end,
            "Split clips at window edges"
        );
    }

    Ok(host.selected_clips())
}
