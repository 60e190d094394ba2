use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Transcript acquisition settings
    pub transcripts: TranscriptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Language codes tried in order before falling back to any auto-generated track
    pub preferred_languages: Vec<String>,

    /// Extra attempts after the first one fails transiently
    pub max_retries: u32,

    /// Flat pause between attempts, in milliseconds
    pub retry_delay_ms: u64,

    /// Timeout for each upstream HTTP request, in seconds
    pub request_timeout_secs: u64,

    /// User agent sent upstream
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5678,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            preferred_languages: ["en", "en-US", "en-GB", "ar"]
                .iter()
                .map(|lang| lang.to_string())
                .collect(),
            max_retries: 2,
            retry_delay_ms: 1000,
            request_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4183.83 Safari/537.36".to_string(),
        }
    }
}

impl TranscriptConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = Self::config_path(explicit_path)?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            tracing::debug!("Loaded configuration from {}", config_path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path).await?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit_path {
            return Ok(path.to_path_buf());
        }

        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-api").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be non-zero");
        }

        if let Some(blank) = self
            .transcripts
            .preferred_languages
            .iter()
            .position(|lang| lang.trim().is_empty())
        {
            anyhow::bail!("preferred_languages entry {} is blank", blank);
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Listen: {}:{}", self.server.host, self.server.port);
        println!(
            "  Preferred Languages: {}",
            self.transcripts.preferred_languages.join(", ")
        );
        println!("  Max Retries: {}", self.transcripts.max_retries);
        println!("  Retry Delay: {}ms", self.transcripts.retry_delay_ms);
        println!("  Request Timeout: {}s", self.transcripts.request_timeout_secs);
    }
}
