//! Validate an AudioSweet session file.

use std::path::PathBuf;

use audiosweet_project_model::LoadedSession;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating session at: {}", path.display());

    let loaded =
        LoadedSession::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let session = loaded.session();

    println!("  Name: {}", loaded.file.name);
    println!("  Version: {}", loaded.file.version);
    match session.sample_rate {
        Some(rate) => println!("  Sample rate: {rate} Hz"),
        None => println!("  Sample rate: unknown"),
    }
    println!("  Tracks: {}", session.tracks.len());
    println!("  Clips: {} ({} selected)", session.clips.len(), session.selected_clips().len());

    let issues = session.validate();
    if issues.is_empty() {
        println!("\nSession is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!("\n{} issue(s) found. Runs may fail.", issues.len());
    }

    Ok(())
}
