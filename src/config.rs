use crate::error::{AppError, AppResult};
use anyhow::anyhow;
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Models the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Model {
    #[default]
    #[serde(rename = "deepseek-r1")]
    DeepseekR1,
    #[serde(rename = "deepseek-coder")]
    DeepseekCoder,
    #[serde(rename = "deepseek-chat")]
    DeepseekChat,
}

impl Model {
    pub const NAMES: [&'static str; 3] = ["deepseek-r1", "deepseek-coder", "deepseek-chat"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::DeepseekR1 => "deepseek-r1",
            Model::DeepseekCoder => "deepseek-coder",
            Model::DeepseekChat => "deepseek-chat",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "deepseek-r1" => Ok(Model::DeepseekR1),
            "deepseek-coder" => Ok(Model::DeepseekCoder),
            "deepseek-chat" => Ok(Model::DeepseekChat),
            other => Err(AppError::validation(format!(
                "Unknown model '{}'. Expected one of: {}",
                other,
                Model::NAMES.join(", ")
            ))),
        }
    }
}

/// The persisted configuration record.
///
/// Fields are private so `temperature` and `max_tokens` can only change
/// through the validating setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    api_key: String,
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default)]
    model: Model,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

impl Credentials {
    /// Creates a record with the default endpoint, model and generation parameters.
    pub fn new(api_key: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key.into().trim().to_string();
        validate_api_key(&api_key)?;
        Ok(Self {
            api_key,
            base_url: default_base_url(),
            model: Model::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> AppResult<()> {
        let api_key = api_key.into().trim().to_string();
        validate_api_key(&api_key)?;
        self.api_key = api_key;
        Ok(())
    }

    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    pub fn set_temperature(&mut self, temperature: f64) -> AppResult<()> {
        validate_temperature(temperature)?;
        self.temperature = temperature;
        Ok(())
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> AppResult<()> {
        validate_max_tokens(max_tokens)?;
        self.max_tokens = max_tokens;
        Ok(())
    }

    /// Checks every invariant; used before save and after load.
    pub fn validate(&self) -> AppResult<()> {
        validate_api_key(&self.api_key)?;
        validate_temperature(self.temperature)?;
        validate_max_tokens(self.max_tokens)
    }

    /// Key shortened for display: first ten and last four characters.
    pub fn masked_key(&self) -> String {
        mask_key(&self.api_key)
    }
}

fn validate_api_key(api_key: &str) -> AppResult<()> {
    if api_key.trim().is_empty() {
        return Err(AppError::validation("API key cannot be empty"));
    }
    Ok(())
}

fn validate_temperature(temperature: f64) -> AppResult<()> {
    if !(0.0..=1.0).contains(&temperature) {
        return Err(AppError::validation("Temperature must be between 0 and 1"));
    }
    Ok(())
}

fn validate_max_tokens(max_tokens: u32) -> AppResult<()> {
    if max_tokens < 1 {
        return Err(AppError::validation("Max tokens must be at least 1"));
    }
    Ok(())
}

pub fn mask_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 14 {
        return "*".repeat(chars.len().max(4));
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Where the key in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    ConfigFile,
    Environment,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::ConfigFile => f.write_str("config file"),
            KeySource::Environment => write!(f, "environment ({})", API_KEY_ENV),
        }
    }
}

/// Loads and saves [`Credentials`] at a per-user location.
///
/// An environment key is layered over the stored record when reading for
/// use. It is never written back: [`CredentialStore::save`] callers start
/// from [`CredentialStore::load_stored`].
pub struct CredentialStore {
    path: PathBuf,
    env_key: Option<String>,
}

impl CredentialStore {
    /// Store at `~/.deepseek-code/config.toml`, honouring `DEEPSEEK_API_KEY`.
    pub fn new() -> anyhow::Result<Self> {
        let env_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Ok(Self {
            path: Self::get_config_dir()?.join("config.toml"),
            env_key,
        })
    }

    /// Store at an explicit path. The environment is ignored.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_key: None,
        }
    }

    /// Layers `key` over the stored record, as `DEEPSEEK_API_KEY` does for [`CredentialStore::new`].
    pub fn with_env_key(mut self, key: impl Into<String>) -> Self {
        self.env_key = Some(key.into()).filter(|key| !key.trim().is_empty());
        self
    }

    pub fn get_config_dir() -> anyhow::Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".deepseek-code"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source of the key [`CredentialStore::load`] would return.
    pub fn key_source(&self) -> Option<KeySource> {
        if self.env_key.is_some() {
            Some(KeySource::Environment)
        } else if self.load_stored().is_some() {
            Some(KeySource::ConfigFile)
        } else {
            None
        }
    }

    /// The record to use: the stored one with any environment key applied.
    /// `None` when there is neither a usable record nor an environment key.
    pub fn load(&self) -> Option<Credentials> {
        let stored = self.load_stored();

        let Some(key) = &self.env_key else {
            return stored;
        };

        info!("Using API key from {}", API_KEY_ENV);
        match stored {
            Some(mut credentials) => {
                credentials.set_api_key(key.as_str()).ok()?;
                Some(credentials)
            }
            None => Credentials::new(key.as_str()).ok(),
        }
    }

    /// The record exactly as persisted, ignoring the environment.
    pub fn load_stored(&self) -> Option<Credentials> {
        if !self.path.exists() {
            info!("No config file at {}", self.path.display());
            return None;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read config {}: {}", self.path.display(), e);
                return None;
            }
        };

        let credentials: Credentials = match toml::from_str(&content) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("Failed to parse config {}: {}", self.path.display(), e);
                return None;
            }
        };

        if let Err(e) = credentials.validate() {
            warn!("Ignoring invalid config {}: {}", self.path.display(), e);
            return None;
        }

        info!("Loaded config from: {}", self.path.display());
        Some(credentials)
    }

    /// Validates and writes the record, replacing whatever was there.
    pub fn save(&self, credentials: &Credentials) -> AppResult<()> {
        credentials.validate()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::write_failed(parent, e))?;
        }

        let content = toml::to_string_pretty(credentials)
            .map_err(|e| AppError::write_failed(&self.path, io::Error::other(e)))?;
        fs::write(&self.path, content).map_err(|e| AppError::write_failed(&self.path, e))?;
        info!("Saved config to: {}", self.path.display());
        Ok(())
    }

    /// Reports the config path, whether a record is stored, and the settings in use.
    pub fn describe<W: Write>(&self, output: &mut W) -> io::Result<()> {
        writeln!(output, "Configuration file: {}", self.path.display())?;
        let status = if self.load_stored().is_some() { "Found" } else { "Not found" };
        writeln!(output, "Status: {}", status)?;

        match (self.load(), self.key_source()) {
            (Some(credentials), Some(source)) => {
                writeln!(output, "API Key: {}", credentials.masked_key())?;
                writeln!(output, "Key source: {}", source)?;
                writeln!(output, "Base URL: {}", credentials.base_url())?;
                writeln!(output, "Model: {}", credentials.model())?;
                writeln!(output, "Temperature: {}", credentials.temperature())?;
                writeln!(output, "Max tokens: {}", credentials.max_tokens())?;
            }
            _ => {
                writeln!(output, "\nTo set API key:")?;
                writeln!(output, "  deepseek config <your-key>")?;
                writeln!(output, "\nOr set environment variable:")?;
                writeln!(output, "  export {}=<your-key>", API_KEY_ENV)?;
            }
        }

        Ok(())
    }
}
