//! Application configuration and per-run render settings.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AudioSweetError, AudioSweetResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where session files are stored.
    pub sessions_dir: PathBuf,

    /// Default render settings.
    #[serde(default)]
    pub render: RenderSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings read once at the top of a run and passed by reference
/// through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Focused single effect, or the whole chain.
    pub mode: OperatingMode,

    /// Render the effect into the clips, or only copy it onto their takes.
    pub action: Action,

    /// Explicit channel mode override.
    pub channel_mode: ChannelModeOverride,

    /// How the render channel count is decided for multichannel renders.
    pub channel_policy: ChannelPolicy,

    /// Maximum number of effect tokens kept in an output clip name.
    pub token_cap: usize,

    /// The caller owns the undo scope; the pipeline must not open one.
    pub external_undo_scope: bool,

    /// Include take-level effects in renders.
    pub take_fx: bool,

    /// Include track-level effects in renders.
    pub track_fx: bool,
}

/// Which effects on the processing track take part in a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OperatingMode {
    /// Only the focused effect is enabled during the render.
    #[default]
    Focused,
    /// Every effect keeps its current enable state.
    Chain,
}

/// What the run does with the selected clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Render the effect into new output clips.
    #[default]
    Apply,
    /// Copy the effect onto each clip's take chain without rendering.
    Copy,
}

/// Explicit channel mode requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelModeOverride {
    /// Mono when the resolved count is 1, multichannel otherwise.
    #[default]
    Auto,
    /// Always render a mono downmix.
    Mono,
    /// Always render multichannel, at least stereo.
    Multi,
}

/// Rule for deciding the output channel count of a multichannel render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelPolicy {
    /// Playback channel count of the clips being rendered.
    #[default]
    SourcePlayback,
    /// Channel count of the track the clips came from.
    SourceTrack,
    /// Channel count of the processing track, left as is.
    TargetTrack,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "audiosweet=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sessions_dir: dirs_default_sessions(),
            render: RenderSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            mode: OperatingMode::Focused,
            action: Action::Apply,
            channel_mode: ChannelModeOverride::Auto,
            channel_policy: ChannelPolicy::SourcePlayback,
            token_cap: 8,
            external_undo_scope: false,
            take_fx: true,
            track_fx: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RenderSettings {
    /// Reject settings the pipeline cannot honor.
    pub fn validate(&self) -> AudioSweetResult<()> {
        if self.token_cap == 0 {
            return Err(AudioSweetError::config("token_cap must be at least 1"));
        }
        if self.action == Action::Apply && !self.take_fx && !self.track_fx {
            return Err(AudioSweetError::config(
                "apply needs take_fx or track_fx enabled, otherwise nothing is rendered",
            ));
        }
        Ok(())
    }

    /// Validated copy, the only form handed to the pipeline.
    pub fn validated(self) -> AudioSweetResult<Self> {
        self.validate()?;
        Ok(self)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Standard config file location.
    pub fn path() -> PathBuf {
        config_file_path()
    }

    /// Where a session path given on the command line lives.
    ///
    /// A bare file name that does not exist in the working directory is
    /// taken from `sessions_dir`; anything else is used as given.
    pub fn resolve_session_path(&self, path: &Path) -> PathBuf {
        let bare = path.components().count() == 1 && !path.is_absolute();
        if bare && !path.exists() {
            self.sessions_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

impl OperatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Focused => "focused",
            Self::Chain => "chain",
        }
    }
}

impl FromStr for OperatingMode {
    type Err = AudioSweetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focused" | "focus" => Ok(Self::Focused),
            "chain" => Ok(Self::Chain),
            other => Err(AudioSweetError::config(format!(
                "Unknown mode: {other}. Use: focused, chain"
            ))),
        }
    }
}

impl FromStr for Action {
    type Err = AudioSweetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apply" => Ok(Self::Apply),
            "copy" | "copy-only" => Ok(Self::Copy),
            other => Err(AudioSweetError::config(format!(
                "Unknown action: {other}. Use: apply, copy"
            ))),
        }
    }
}

impl FromStr for ChannelModeOverride {
    type Err = AudioSweetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "mono" => Ok(Self::Mono),
            "multi" | "multichannel" => Ok(Self::Multi),
            other => Err(AudioSweetError::config(format!(
                "Unknown channel mode: {other}. Use: auto, mono, multi"
            ))),
        }
    }
}

impl FromStr for ChannelPolicy {
    type Err = AudioSweetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "source-playback" => Ok(Self::SourcePlayback),
            "source-track" => Ok(Self::SourceTrack),
            "target-track" => Ok(Self::TargetTrack),
            other => Err(AudioSweetError::config(format!(
                "Unknown channel policy: {other}. Use: source-playback, source-track, target-track"
            ))),
        }
    }
}

impl fmt::Display for ChannelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SourcePlayback => "source-playback",
            Self::SourceTrack => "source-track",
            Self::TargetTrack => "target-track",
        })
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("audiosweet").join("config.json")
}

/// Default sessions directory.
fn dirs_default_sessions() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("audiosweet").join("sessions")
}
