use crate::config::constants::files::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use crate::config::{LoggingConfig, RenderConfig, StreamConfig, TextConfig, UiConfig};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for bidichat
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BidiChatConfig {
    /// Upstream endpoint and streaming limits
    #[serde(default)]
    pub stream: StreamConfig,

    /// Text pipeline tuning
    #[serde(default)]
    pub text: TextConfig,

    /// Renderer settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Viewport behavior
    #[serde(default)]
    pub ui: UiConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BidiChatConfig {
    /// Write a default bidichat.toml into the workspace. Returns the created file names.
    pub fn bootstrap<P: AsRef<Path>>(workspace: P, force: bool) -> Result<Vec<String>> {
        let config_path = workspace.as_ref().join(CONFIG_FILE_NAME);
        let mut created_files = Vec::new();

        if !config_path.exists() || force {
            Self::create_sample_config(&config_path)?;
            created_files.push(CONFIG_FILE_NAME.to_string());
        }

        Ok(created_files)
    }

    /// Create sample configuration file
    pub fn create_sample_config<P: AsRef<Path>>(output: P) -> Result<()> {
        let output = output.as_ref();
        let config_content = toml::to_string_pretty(&BidiChatConfig::default())
            .context("Failed to serialize default configuration")?;

        fs::write(output, config_content)
            .with_context(|| format!("Failed to write config file: {}", output.display()))?;

        Ok(())
    }

    /// Reject values the runtime cannot honor
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.stream.endpoint.trim().is_empty(),
            "stream.endpoint must not be empty"
        );
        ensure!(
            (0.0..=1.0).contains(&self.text.rtl_threshold),
            "text.rtl_threshold must be between 0.0 and 1.0, got {}",
            self.text.rtl_threshold
        );
        ensure!(
            self.stream.chunk_timeout_secs > 0 && self.stream.first_chunk_timeout_secs > 0,
            "stream timeouts must be greater than zero"
        );
        Ok(())
    }
}

/// Configuration manager for loading and validating configurations
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: BidiChatConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        Self::load_from_workspace(std::env::current_dir()?)
    }

    /// Load configuration from a specific workspace
    pub fn load_from_workspace(workspace: impl AsRef<Path>) -> Result<Self> {
        let workspace = workspace.as_ref();

        // Try bidichat.toml in workspace root first
        let config_path = workspace.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Self::load_from_file(&config_path);
        }

        // Try .bidichat/bidichat.toml in workspace
        let fallback_path = workspace.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if fallback_path.exists() {
            return Self::load_from_file(&fallback_path);
        }

        // Try ~/.bidichat/bidichat.toml in user home directory
        if let Some(home_dir) = dirs::home_dir() {
            let home_config_path = home_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            if home_config_path.exists() {
                return Self::load_from_file(&home_config_path);
            }
        }

        Ok(Self {
            config: BidiChatConfig::default(),
            config_path: None,
        })
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: BidiChatConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &BidiChatConfig {
        &self.config
    }

    /// Consume the manager, keeping only the configuration
    pub fn into_config(self) -> BidiChatConfig {
        self.config
    }

    /// Get the configuration file path (if loaded from file)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
