use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::search::native::DEFAULT_MODULE_PATH;
use crate::search::{DEFAULT_ALPHA, DEFAULT_MAX_TAGS, DEFAULT_TOP};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub tags: TagsConfig,
    #[serde(default)]
    pub native: NativeConfig,
}

impl Config {
    /// Load defaults, then the explicit or global config file, then
    /// `PSEARCH_*` environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("PSEARCH_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                SearchError::MissingConfig(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        } else if let Some(global) = Self::load_global()? {
            config.merge_patch(global);
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document over the defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| SearchError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match dirs::config_dir() {
            Some(dir) => Self::load_patch(&dir.join("psearch/config.toml")),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SearchError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| SearchError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.tags {
            self.tags.merge(patch);
        }
        if let Some(patch) = patch.native {
            self.native.merge(patch);
        }
    }

    /// Apply `PSEARCH_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_env::<usize>(&lookup, "PSEARCH_SEARCH_TOP")? {
            self.search.default_top = value;
        }
        if let Some(value) = parse_env::<f32>(&lookup, "PSEARCH_SEARCH_ALPHA")? {
            self.search.alpha = value;
        }
        if let Some(value) = parse_env::<usize>(&lookup, "PSEARCH_TAGS_MAX")? {
            self.tags.default_max = value;
        }
        if let Some(value) = lookup("PSEARCH_NATIVE_ENABLED") {
            self.native.enabled = parse_bool(&value);
        }
        if let Some(value) = lookup("PSEARCH_NATIVE_SOURCE") {
            self.native.source = value;
        }
        if let Some(value) = parse_env::<u64>(&lookup, "PSEARCH_NATIVE_WAIT_MS")? {
            self.native.wait = Duration::from_millis(value);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.search.alpha) {
            return Err(SearchError::Config(format!(
                "search.alpha must be within [0, 1], got {}",
                self.search.alpha
            )));
        }
        if self.search.default_top == 0 {
            return Err(SearchError::Config(
                "search.default_top must be greater than 0".to_string(),
            ));
        }
        if self.tags.default_max == 0 {
            return Err(SearchError::Config(
                "tags.default_max must be greater than 0".to_string(),
            ));
        }
        if self.native.enabled && self.native.source.trim().is_empty() {
            return Err(SearchError::Config(
                "native.source must be set when native.enabled = true".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results returned when a request omits `top`.
    pub default_top: usize,
    /// Lexical weight for hybrid search.
    pub alpha: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top: DEFAULT_TOP,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.default_top {
            self.default_top = value;
        }
        if let Some(value) = patch.alpha {
            self.alpha = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    pub default_max: usize,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            default_max: DEFAULT_MAX_TAGS,
        }
    }
}

impl TagsConfig {
    fn merge(&mut self, patch: TagsPatch) {
        if let Some(value) = patch.default_max {
            self.default_max = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    pub enabled: bool,
    /// File path or http(s) URL of the wasm hasher.
    pub source: String,
    /// How long hybrid queries in the worker wait for the module.
    #[serde(with = "humantime_serde")]
    pub wait: Duration,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source: DEFAULT_MODULE_PATH.to_string(),
            wait: Duration::ZERO,
        }
    }
}

impl NativeConfig {
    fn merge(&mut self, patch: NativePatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.source {
            self.source = value;
        }
        if let Some(value) = patch.wait {
            self.wait = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub search: Option<SearchPatch>,
    pub tags: Option<TagsPatch>,
    pub native: Option<NativePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub default_top: Option<usize>,
    pub alpha: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TagsPatch {
    pub default_max: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NativePatch {
    pub enabled: Option<bool>,
    pub source: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub wait: Option<Duration>,
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|err| SearchError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}
