//! Configuration management for arbor.
//!
//! Handles:
//! - Generation defaults for new trees
//! - UI preferences
//! - Provider endpoints and credentials
//! - Data-directory layout and the saved cursor position

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::engine::ProviderEndpoint;
use crate::error::{ArborError, Result};
use crate::forest::NodeId;
use crate::util::atomic_write;

/// System prompt used when a new tree does not specify one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Generation defaults.
    #[serde(default)]
    pub generation: GenerationConfig,
    /// UI preferences.
    #[serde(default)]
    pub ui: UiConfig,
    /// Provider endpoints keyed by name.
    #[serde(default = "default_providers")]
    pub providers: IndexMap<String, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            ui: UiConfig::default(),
            providers: default_providers(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        let config_path = default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArborError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| ArborError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Save configuration to a specific path.
    ///
    /// Written atomically so a crash mid-save cannot corrupt the file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ArborError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;

        atomic_write(path, content.as_bytes())?;
        Ok(())
    }

    /// Resolve provider entries into usable endpoints.
    ///
    /// API keys are read from the environment variable each provider names;
    /// a missing variable leaves the endpoint unauthenticated rather than
    /// failing, since local providers often need no key.
    pub fn resolve_providers(&self) -> HashMap<String, ProviderEndpoint> {
        self.providers
            .iter()
            .map(|(name, provider)| {
                let api_key = provider
                    .api_key_env
                    .as_ref()
                    .and_then(|var| std::env::var(var).ok());
                (
                    name.clone(),
                    ProviderEndpoint {
                        base_url: provider.base_url.clone(),
                        api_key,
                    },
                )
            })
            .collect()
    }
}

/// Generation defaults, applied to new trees and bare generation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Provider name for new trees.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier for new trees.
    #[serde(default = "default_model")]
    pub model: String,
    /// Candidates per generation request.
    #[serde(default = "default_count")]
    pub count: usize,
    /// Sampling temperature, if set.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Token cap per completion, if set.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            count: default_count(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// UI preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Theme name.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Visible rows in the child list.
    #[serde(default = "default_child_rows")]
    pub child_rows: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            child_rows: default_child_rows(),
        }
    }
}

/// One provider endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL up to the API root.
    pub base_url: String,
    /// Environment variable holding the API key, if the provider needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

// Default value functions for serde

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_count() -> usize {
    3
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_child_rows() -> usize {
    8
}

fn default_providers() -> IndexMap<String, ProviderConfig> {
    let mut providers = IndexMap::new();
    providers.insert(
        "openai".to_string(),
        ProviderConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
        },
    );
    providers
}

/// Get the default configuration path.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| ArborError::Unsupported {
        feature: "config directory discovery".to_string(),
    })?;

    Ok(config_dir.join("arbor").join("config.toml"))
}

/// Get the default data directory.
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| ArborError::Unsupported {
        feature: "data directory discovery".to_string(),
    })?;

    Ok(data_dir.join("arbor"))
}

/// Forest storage file inside a data directory.
pub fn forest_path(data_dir: &Path) -> PathBuf {
    data_dir.join("forest.json")
}

/// Bookmark storage file inside a data directory.
pub fn bookmarks_path(data_dir: &Path) -> PathBuf {
    data_dir.join("bookmarks.json")
}

/// Saved cursor-position file inside a data directory.
pub fn current_path(data_dir: &Path) -> PathBuf {
    data_dir.join("current")
}

/// Read the saved cursor position, if one exists.
pub fn read_current(path: &Path) -> Result<Option<NodeId>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ArborError::io(format!("Failed to read cursor file: {}", path.display()), e)
    })?;

    let id = content.trim();
    if id.is_empty() {
        Ok(None)
    } else {
        Ok(Some(NodeId::from(id)))
    }
}

/// Persist the cursor position. Plain text, identifier only.
pub fn write_current(path: &Path, id: &NodeId) -> Result<()> {
    atomic_write(path, id.as_str().as_bytes())
}
