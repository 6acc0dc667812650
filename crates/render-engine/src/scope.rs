//! Snapshot/restore guards for host side effects.
//!
//! Every guard borrows the host mutably and dereferences to it, so work
//! inside the scope goes through the guard. Restoring happens in `Drop`,
//! which runs on the success path, on early `?` returns, and while unwinding.
//! Guards nest by reborrowing: `EffectScope::enter(&mut *channels, ..)`.

use std::ops::{Deref, DerefMut};

use audiosweet_common::{AudioSweetError, AudioSweetResult, Timebase};
use audiosweet_project_model::{ClipId, TrackId};

use crate::host::{ChannelHandshake, Host};
use crate::selection::SelectionSnapshot;

/// Channel count of one track, captured before anything moves onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub track: TrackId,
    pub channel_count: u32,
}

/// Enable flags of a track's effects, aligned to chain position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectEnableSnapshot {
    pub track: TrackId,
    pub enabled: Vec<bool>,
}

impl ChannelSnapshot {
    pub fn capture<H: Host + ?Sized>(host: &H, track: TrackId) -> AudioSweetResult<Self> {
        Ok(Self {
            track,
            channel_count: host.track_channel_count(track)?,
        })
    }

    pub fn restore<H: Host + ?Sized>(&self, host: &mut H) -> AudioSweetResult<()> {
        if host.track_channel_count(self.track)? != self.channel_count {
            host.set_track_channel_count(self.track, self.channel_count)?;
        }
        Ok(())
    }
}

impl EffectEnableSnapshot {
    pub fn capture<H: Host + ?Sized>(host: &H, track: TrackId) -> AudioSweetResult<Self> {
        let count = host.effect_count(track)?;
        let enabled = (0..count)
            .map(|i| host.effect_enabled(track, i))
            .collect::<AudioSweetResult<Vec<bool>>>()?;
        Ok(Self { track, enabled })
    }

    /// Restore every flag; keeps going past individual failures and reports the first.
    pub fn restore<H: Host + ?Sized>(&self, host: &mut H) -> AudioSweetResult<()> {
        let mut first_error = None;
        for (index, &enabled) in self.enabled.iter().enumerate() {
            let result = match host.effect_enabled(self.track, index) {
                Ok(current) if current == enabled => Ok(()),
                _ => host.set_effect_enabled(self.track, index, enabled),
            };
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Restores a track's channel count on drop.
pub struct ChannelScope<'h, H: Host + ?Sized> {
    host: &'h mut H,
    snapshot: ChannelSnapshot,
}

impl<'h, H: Host + ?Sized> ChannelScope<'h, H> {
    pub fn enter(host: &'h mut H, track: TrackId) -> AudioSweetResult<Self> {
        let snapshot = ChannelSnapshot::capture(&*host, track)?;
        Ok(Self { host, snapshot })
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        self.snapshot
    }

    /// Set the track's channel count for the rest of the scope.
    pub fn apply(&mut self, count: u32) -> AudioSweetResult<()> {
        tracing::debug!(
            track = %self.snapshot.track,
            from = self.snapshot.channel_count,
            to = count,
            "Setting processing channel count"
        );
        self.host.set_track_channel_count(self.snapshot.track, count)
    }
}

impl<H: Host + ?Sized> Drop for ChannelScope<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.snapshot.restore(&mut *self.host) {
            tracing::error!(track = %self.snapshot.track, error = %e, "Failed to restore channel count");
        }
    }
}

/// Isolates one effect (or leaves the chain as is) and restores all enable flags on drop.
pub struct EffectScope<'h, H: Host + ?Sized> {
    host: &'h mut H,
    snapshot: EffectEnableSnapshot,
}

impl<'h, H: Host + ?Sized> EffectScope<'h, H> {
    /// Snapshot the chain on `track`. With `isolate = Some(i)`, enable only effect `i`.
    pub fn enter(host: &'h mut H, track: TrackId, isolate: Option<usize>) -> AudioSweetResult<Self> {
        let snapshot = EffectEnableSnapshot::capture(&*host, track)?;
        if let Some(target) = isolate {
            if target >= snapshot.enabled.len() {
                return Err(AudioSweetError::host(format!(
                    "effect index {target} out of range on {track} ({} effects)",
                    snapshot.enabled.len()
                )));
            }
        }

        let scope = Self { host, snapshot };
        if let Some(target) = isolate {
            // Flags changed so far are put back by Drop if this fails midway.
            for index in 0..scope.snapshot.enabled.len() {
                let want = index == target;
                if scope.snapshot.enabled[index] != want {
                    scope.host.set_effect_enabled(track, index, want)?;
                }
            }
        }
        Ok(scope)
    }

    pub fn snapshot(&self) -> &EffectEnableSnapshot {
        &self.snapshot
    }
}

impl<H: Host + ?Sized> Drop for EffectScope<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.snapshot.restore(&mut *self.host) {
            tracing::error!(track = %self.snapshot.track, error = %e, "Failed to restore effect states");
        }
    }
}

/// Publishes the channel handshake and clears it on drop.
pub struct HandshakeScope<'h, H: Host + ?Sized> {
    host: &'h mut H,
}

impl<'h, H: Host + ?Sized> HandshakeScope<'h, H> {
    pub fn enter(host: &'h mut H, handshake: ChannelHandshake) -> Self {
        host.set_channel_handshake(Some(handshake));
        Self { host }
    }
}

impl<H: Host + ?Sized> Drop for HandshakeScope<'_, H> {
    fn drop(&mut self) {
        self.host.set_channel_handshake(None);
    }
}

/// Opens an undo scope unless the caller manages one, and closes it on drop.
pub struct UndoScope<'h, H: Host + ?Sized> {
    host: &'h mut H,
    label: String,
    owned: bool,
}

impl<'h, H: Host + ?Sized> UndoScope<'h, H> {
    pub fn enter(host: &'h mut H, label: impl Into<String>, external: bool) -> Self {
        if !external {
            host.begin_undo_scope();
        }
        Self {
            host,
            label: label.into(),
            owned: !external,
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }
}

impl<H: Host + ?Sized> Drop for UndoScope<'_, H> {
    fn drop(&mut self) {
        if self.owned {
            self.host.end_undo_scope(&self.label);
        }
    }
}

/// Restores the clip selection captured on entry.
pub struct SelectionScope<'h, H: Host + ?Sized> {
    host: &'h mut H,
    snapshot: SelectionSnapshot,
    timebase: Timebase,
}

impl<'h, H: Host + ?Sized> SelectionScope<'h, H> {
    pub fn enter(host: &'h mut H, timebase: Timebase) -> Self {
        let snapshot = SelectionSnapshot::capture(&*host);
        Self {
            host,
            snapshot,
            timebase,
        }
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        &self.snapshot
    }

    /// Take the current selection as the one to restore.
    ///
    /// Used after pre-splitting: the deselected outside parts keep the
    /// original handles and must not be reselected.
    pub fn recapture(&mut self) {
        self.snapshot = SelectionSnapshot::capture(&*self.host);
    }
}

impl<H: Host + ?Sized> Drop for SelectionScope<'_, H> {
    fn drop(&mut self) {
        let restored: Vec<ClipId> = self.snapshot.restore(&mut *self.host, &self.timebase);
        tracing::debug!(clips = restored.len(), "Restored selection");
    }
}

macro_rules! deref_to_host {
    ($($scope:ident),*) => {$(
        impl<H: Host + ?Sized> Deref for $scope<'_, H> {
            type Target = H;

            fn deref(&self) -> &H {
                &*self.host
            }
        }

        impl<H: Host + ?Sized> DerefMut for $scope<'_, H> {
            fn deref_mut(&mut self) -> &mut H {
                &mut *self.host
            }
        }
    )*};
}

deref_to_host!(ChannelScope, EffectScope, HandshakeScope, UndoScope, SelectionScope);
