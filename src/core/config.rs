use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the save dialog starts; updated after every successful save.
    pub output_directory: PathBuf,
    /// Where the video picker starts; updated after every accepted file.
    pub last_browse_directory: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,  // None = resolve from PATH
    pub ffprobe_path: Option<PathBuf>, // None = resolve from PATH
}

impl Default for AppConfig {
    fn default() -> Self {
        let output_directory = dirs::picture_dir()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            output_directory,
            last_browse_directory: None,
            ffmpeg_path: None,
            ffprobe_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))?;

            // Try to parse the config, but if it fails, start over with defaults
            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config)
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                    let new_config = Self::default();
                    new_config.save()
                        .map_err(|save_err| anyhow::anyhow!("Failed to save new config: {}", save_err))?;
                    log::info!("Created new config file at {}", config_path.display());
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save()
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("last-frame")
            .join("config.json")
    }

    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Err(e) = std::fs::create_dir_all(&self.output_directory) {
            log::error!("Failed to create output directory {}: {}", self.output_directory.display(), e);
            return Err(anyhow::anyhow!("Failed to create output directory {}: {}", self.output_directory.display(), e));
        }
        log::debug!("Output directory ensured: {}", self.output_directory.display());
        Ok(())
    }

    /// Path of the ffmpeg binary to launch.
    pub fn ffmpeg(&self) -> PathBuf {
        self.ffmpeg_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffmpeg"))
    }

    /// Path of the ffprobe binary to launch.
    pub fn ffprobe(&self) -> PathBuf {
        self.ffprobe_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffprobe"))
    }
}
