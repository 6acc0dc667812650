//! Create a demo AudioSweet session file.

use std::path::PathBuf;

use audiosweet_project_model::{Effect, EffectTarget, LoadedSession, Session, Take, TakeChannelMode};

pub fn run(path: PathBuf, name: String) -> anyhow::Result<()> {
    println!("Creating session '{}' at {}", name, path.display());

    let session = demo_session();
    let loaded = LoadedSession::create(&path, &name, session)
        .map_err(|e| anyhow::anyhow!("Failed to create session: {e}"))?;

    let session = loaded.session();
    println!("Session created successfully:");
    println!("  File: {}", loaded.path.display());
    println!("  Tracks: {}", session.tracks.len());
    println!("  Clips: {} ({} selected)", session.clips.len(), session.selected_clips().len());
    println!();
    println!("Try:");
    println!("  audiosweet units {}", path.display());
    println!("  audiosweet apply {}", path.display());

    Ok(())
}

/// Two touching drum clips, a mono-downmixed vocal, and an FX track whose
/// compressor is focused.
pub fn demo_session() -> Session {
    let mut session = Session::new(Some(48_000));

    let drums = session.add_track("Drums", 2);
    let vocals = session.add_track("Vocals", 2);
    let fx = session.add_track("FX", 2);
    if let Some(track) = session.track_mut(fx) {
        track.effects.push(Effect::new("VST3: Pro-C 2 (FabFilter)", true));
        track.effects.push(Effect::new("VST3: Pro-Q 3 (FabFilter)", false));
    }

    let kick = session.add_clip(drums, "Drum Loop A.wav", 0.0, 2.0, Take::new("drums_a.wav", 2));
    let fill = session.add_clip(drums, "Drum Loop B.wav", 2.0, 2.0, Take::new("drums_b.wav", 2));
    let vox = session.add_clip(
        vocals,
        "Lead Vox - Take 3",
        1.0,
        3.0,
        Take {
            source: "vox_take3.wav".to_string(),
            source_channels: 4,
            channel_mode: TakeChannelMode::MonoDownmix,
        },
    );

    session.select_only(&[kick, fill, vox]);
    session.focused_effect = Some(EffectTarget::new(fx, 0));
    session
}
