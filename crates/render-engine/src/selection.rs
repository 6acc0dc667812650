//! Selection snapshot and restore.

use audiosweet_common::Timebase;
use audiosweet_project_model::{ClipId, TrackId};

use crate::host::Host;

/// One selected clip as it was when the snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionEntry {
    pub clip: ClipId,
    pub track: TrackId,
    pub start: f64,
    pub end: f64,
}

/// The clip selection at the start of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSnapshot {
    entries: Vec<SelectionEntry>,
}

impl SelectionSnapshot {
    /// Capture the host's current selection.
    pub fn capture<H: Host + ?Sized>(host: &H) -> Self {
        let entries = host
            .selected_clips()
            .into_iter()
            .filter_map(|id| host.clip(id))
            .map(|clip| SelectionEntry {
                clip: clip.id,
                track: clip.track,
                start: clip.position,
                end: clip.end(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reselect what was selected.
    ///
    /// Clips that still exist are selected by handle. For clips that were
    /// consumed (glued, rendered into a replacement), every clip on the same
    /// track overlapping the remembered span is selected instead, so outputs
    /// take the place of their inputs. Returns the new selection.
    pub fn restore<H: Host + ?Sized>(&self, host: &mut H, timebase: &Timebase) -> Vec<ClipId> {
        let eps = timebase.epsilon();
        let mut selection: Vec<ClipId> = vec![];

        for entry in &self.entries {
            if host.clip(entry.clip).is_some() {
                if !selection.contains(&entry.clip) {
                    selection.push(entry.clip);
                }
                continue;
            }

            for id in host.clips_on_track(entry.track) {
                let Some(clip) = host.clip(id) else { continue };
                let overlaps = clip.position < entry.end - eps && clip.end() > entry.start + eps;
                if overlaps && !selection.contains(&id) {
                    selection.push(id);
                }
            }
        }

        host.select_only(&selection);
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use audiosweet_project_model::{Session, Take};

    #[test]
    fn test_restore_selects_replacements_of_consumed_clips() {
        let mut session = Session::new(Some(48_000));
        let drums = session.add_track("Drums", 2);
        let a = session.add_clip(drums, "A", 0.0, 2.0, Take::new("a.wav", 2));
        let b = session.add_clip(drums, "B", 2.0, 2.0, Take::new("b.wav", 2));
        let far = session.add_clip(drums, "Far", 10.0, 1.0, Take::new("far.wav", 2));
        session.select_only(&[a, b]);
        let mut host = MemoryHost::new(session);
        let timebase = Timebase::from_sample_rate(host.sample_rate());

        let snapshot = SelectionSnapshot::capture(&host);
        assert_eq!(snapshot.entries().len(), 2);

        // Replace both clips with one spanning clip.
        host.session_mut().remove_clip(a);
        host.session_mut().remove_clip(b);
        let glued = host
            .session_mut()
            .add_clip(drums, "A-glued", 0.0, 4.0, Take::new("g.wav", 2));
        host.select_only(&[far]);

        let restored = snapshot.restore(&mut host, &timebase);
        assert_eq!(restored, vec![glued]);
        assert_eq!(host.selected_clips(), vec![glued]);
    }

    #[test]
    fn test_touching_neighbour_is_not_reselected() {
        let mut session = Session::new(Some(48_000));
        let drums = session.add_track("Drums", 2);
        let a = session.add_clip(drums, "A", 0.0, 2.0, Take::new("a.wav", 2));
        let next = session.add_clip(drums, "Next", 2.0, 2.0, Take::new("n.wav", 2));
        session.select_only(&[a]);
        let mut host = MemoryHost::new(session);

        let snapshot = SelectionSnapshot::capture(&host);
        host.session_mut().remove_clip(a);

        let restored = snapshot.restore(&mut host, &Timebase::default());
        assert!(restored.is_empty());
        assert!(!host.clip(next).unwrap().selected);
    }
}
