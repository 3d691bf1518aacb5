use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Hq4lConfig {
    #[serde(default)]
    pub canister: CanisterConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// How to reach the shop canister through `dfx`.
#[derive(Debug, Clone, Deserialize)]
pub struct CanisterConfig {
    #[serde(default = "default_dfx_path")]
    pub dfx_path: String,
    #[serde(default = "default_canister_id")]
    pub canister_id: String,
    #[serde(default = "default_shop_method")]
    pub method: String,
    #[serde(default)]
    pub network: Option<String>,
    /// Run dfx inside WSL (`wsl <dfx_path> ...`), for Windows hosts.
    #[serde(default)]
    pub use_wsl: bool,
    /// Informational line printed by dfx before the Candid value. Empty disables stripping.
    #[serde(default = "default_strip_marker")]
    pub strip_marker: String,
    #[serde(default = "default_command_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CanisterConfig {
    fn default() -> Self {
        Self {
            dfx_path: default_dfx_path(),
            canister_id: default_canister_id(),
            method: default_shop_method(),
            network: None,
            use_wsl: false,
            strip_marker: default_strip_marker(),
            timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: default_gemini_api_base(),
            model: default_gemini_model(),
            timeout_secs: default_gemini_timeout_secs(),
        }
    }
}

impl CanisterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Program and arguments for the `getShop` query.
    pub fn command_line(&self) -> (String, Vec<String>) {
        let mut args = Vec::new();
        let program = if self.use_wsl {
            args.push(self.dfx_path.clone());
            "wsl".to_string()
        } else {
            self.dfx_path.clone()
        };
        args.push("canister".to_string());
        args.push("call".to_string());
        if let Some(network) = self.network.as_ref() {
            args.push("--network".to_string());
            args.push(network.clone());
        }
        args.push(self.canister_id.clone());
        args.push(self.method.clone());
        (program, args)
    }

    fn normalize(&mut self) {
        self.dfx_path = non_empty_or(&self.dfx_path, default_dfx_path);
        self.canister_id = non_empty_or(&self.canister_id, default_canister_id);
        self.method = non_empty_or(&self.method, default_shop_method);
        self.network = self
            .network
            .as_ref()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        self.strip_marker = self.strip_marker.trim().to_string();
    }
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    fn normalize(&mut self) {
        self.api_base = non_empty_or(&self.api_base, default_gemini_api_base)
            .trim_end_matches('/')
            .to_string();
        self.model = non_empty_or(&self.model, default_gemini_model);
    }
}

impl Hq4lConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config at {}: {}", path.display(), e))?;
        let mut config: Hq4lConfig = serde_json::from_str(&data)
            .map_err(|e| anyhow!("Failed to parse config JSON at {}: {}", path.display(), e))?;
        config.canister.normalize();
        config.gemini.normalize();
        Ok(config)
    }

    /// Load the resolved config file, or defaults when it does not exist.
    pub fn load_default() -> Result<(Self, PathBuf)> {
        let path = resolve_config_path();
        if !path.exists() {
            info!(
                "No config found at {}, using built-in defaults",
                path.display()
            );
            return Ok((Self::default(), path));
        }
        let config = Self::load_from_path(&path)?;
        Ok((config, path))
    }
}

fn non_empty_or(value: &str, fallback: fn() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

fn default_dfx_path() -> String {
    "dfx".to_string()
}

fn default_canister_id() -> String {
    "backend".to_string()
}

fn default_shop_method() -> String {
    "getShop".to_string()
}

fn default_strip_marker() -> String {
    "Decryption complete.".to_string()
}

fn default_command_timeout_secs() -> u64 {
    30
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_timeout_secs() -> u64 {
    60
}

pub fn resolve_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("HQ4L_CONFIG_PATH") {
        return expand_path(path);
    }

    default_config_path()
}

fn expand_path(input: String) -> PathBuf {
    if let Some(stripped) = input.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    } else if let Some(stripped) = input.strip_prefix("~\\") {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(input)
}

fn default_config_path() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hq4l")
        .join("hq4l.json")
}

fn home_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    } else {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}
