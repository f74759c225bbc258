//! CLI configuration loader for switchboard
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./switchboard.json or ./.switchboard/config.json
//! 3. Git repository root: <repo_root>/.switchboard/config.json
//! 4. User config dir: $XDG_CONFIG_HOME/switchboard/config.json (via `dirs`)
//! 5. Environment variables only (no files)

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use switchboard_core::{ModelParams, Protocol, ResolvedLlmConfig};

const CONFIG_FILE: &str = "switchboard.json";
const CONFIG_DIR: &str = ".switchboard";
const APP_DIR: &str = "switchboard";

/// Raw configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    /// Protocol to use (`anthropic` or `openai`)
    pub protocol: String,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: String,
    /// Base URL (optional, uses protocol default if not specified)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model name (optional, uses protocol default if not specified)
    #[serde(default)]
    pub model: Option<String>,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers (optional)
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// CLI configuration loader
#[derive(Debug, Clone, Default)]
pub struct CliConfigLoader {
    config_override: Option<PathBuf>,
    protocol_override: Option<String>,
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
}

impl CliConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    pub fn with_protocol_override(mut self, protocol: String) -> Self {
        self.protocol_override = Some(protocol);
        self
    }

    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<ResolvedLlmConfig> {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        // Step 1: Find and load base configuration
        let mut config = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else if let Some(config) = self.search_files().await? {
            config
        } else {
            self.env_only_config(env)?
        };

        // Step 2: Apply flag overrides
        if let Some(protocol) = &self.protocol_override {
            config.protocol = protocol.clone();
        }
        if let Some(api_key) = &self.api_key_override {
            config.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url_override {
            config.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            config.model = Some(model.clone());
        }

        // Step 3: Resolve to final LLM config
        resolve_config(config, env)
    }

    /// Search config files in priority order
    async fn search_files(&self) -> Result<Option<RawConfig>> {
        let cwd = std::env::current_dir()?;
        let mut candidates = vec![
            cwd.join(CONFIG_FILE),
            cwd.join(CONFIG_DIR).join("config.json"),
        ];
        if let Some(git_root) = find_git_root(&cwd) {
            candidates.push(git_root.join(CONFIG_DIR).join("config.json"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(APP_DIR).join("config.json"));
        }

        for path in candidates {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "using config file");
                return Ok(Some(load_file(&path).await?));
            }
        }
        Ok(None)
    }

    /// Build a config from environment variables only
    fn env_only_config(&self, env: impl Fn(&str) -> Option<String>) -> Result<RawConfig> {
        let available: Vec<Protocol> = [Protocol::Anthropic, Protocol::OpenAICompat]
            .into_iter()
            .filter(|p| env(p.api_key_env()).is_some())
            .collect();
        let names = || {
            available
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let preference = self
            .protocol_override
            .clone()
            .or_else(|| env("SWITCHBOARD_PROTOCOL"));

        let protocol = match preference {
            Some(preferred) => {
                let protocol: Protocol = preferred.parse()?;
                if !available.contains(&protocol) && self.api_key_override.is_none() {
                    bail!(
                        "Protocol '{}' specified but {} is not set. Available keys: {}",
                        preferred,
                        protocol.api_key_env(),
                        names()
                    );
                }
                protocol
            }
            None => match available.as_slice() {
                [] if self.api_key_override.is_some() => Protocol::Anthropic,
                [] => bail!(
                    "No configuration found. Create a {} file or set ANTHROPIC_API_KEY / OPENAI_API_KEY",
                    CONFIG_FILE
                ),
                [only] => *only,
                _ => bail!(
                    "Multiple API keys detected: {}. Choose one with SWITCHBOARD_PROTOCOL or --protocol",
                    names()
                ),
            },
        };

        let prefix = match protocol {
            Protocol::Anthropic => "ANTHROPIC",
            Protocol::OpenAICompat => "OPENAI",
        };

        Ok(RawConfig {
            protocol: protocol.as_str().to_string(),
            api_key: env(protocol.api_key_env()).unwrap_or_default(),
            base_url: env(&format!("{}_BASE_URL", prefix)).or_else(|| env("SWITCHBOARD_BASE_URL")),
            model: env(&format!("{}_MODEL", prefix)).or_else(|| env("SWITCHBOARD_MODEL")),
            params: ModelParams::default(),
            headers: HashMap::new(),
        })
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }
}

async fn load_file(path: &Path) -> Result<RawConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Resolve raw config to ResolvedLlmConfig
fn resolve_config(
    config: RawConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedLlmConfig> {
    let protocol: Protocol = config.protocol.parse()?;

    let api_key = match config.api_key.strip_prefix("env:") {
        Some(var_name) => {
            env(var_name).with_context(|| format!("Environment variable not found: {}", var_name))?
        }
        None => config.api_key,
    };

    let base_url = config
        .base_url
        .unwrap_or_else(|| protocol.default_base_url().to_string());
    let model = config
        .model
        .unwrap_or_else(|| protocol.default_model().to_string());

    let resolved = ResolvedLlmConfig::new(protocol, base_url, api_key, model)
        .with_params(config.params)
        .with_headers(config.headers);

    resolved
        .validate()
        .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

    tracing::debug!(
        protocol = %resolved.protocol,
        model = %resolved.model,
        base_url = %resolved.base_url,
        "resolved LLM configuration"
    );
    Ok(resolved)
}
