//! Show or save the effective configuration.

use audiosweet_common::AppConfig;

pub fn run(config: &AppConfig, write: bool) -> anyhow::Result<()> {
    let path = AppConfig::path();

    if write {
        config
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to write config to {}: {e}", path.display()))?;
        println!("Config written to {}", path.display());
    } else if path.exists() {
        println!("Config file: {}", path.display());
    } else {
        println!("Config file: {} (not found, using defaults)", path.display());
    }

    println!("Sessions: {}", config.sessions_dir.display());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
