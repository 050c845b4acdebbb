//! Configuration loading and path helpers.
//!
//! Figment merges built-in defaults, `config.toml`, `config.<env>.toml` and
//! `APP_*` env vars into [`Settings`]. Paths in settings may use `~` and
//! `${VAR}`; relative paths resolve against a caller-chosen base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{IndexBackend, ReconciliationPolicy};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let config = Self::from_figment(Self::figment_for_env(&env_name));
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Defaults, then `config.toml`, then `config.<env>.toml`, then env vars.
    ///
    /// `APP_RETRIEVAL__TOP_K=5` sets `retrieval.top_k`; `OLLAMA_HOST` sets
    /// `generation.host`.
    pub fn figment_for_env(env_name: &str) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment
            .merge(Env::raw().only(&["OLLAMA_HOST"]).map(|_| "generation.host".into()))
            .merge(Env::prefixed("APP_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        if matches!(env, "prod" | "production") {
            let use_fake: bool = self.get("embedding.use_fake")?;
            anyhow::ensure!(!use_fake, "fake embeddings are not allowed in production");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub relevance: RelevanceSettings,
    pub generation: GenerationSettings,
}

impl Settings {
    fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if self.retrieval.candidate_multiplier == 0 {
            return Err(Error::InvalidConfig("retrieval.candidate_multiplier must be at least 1".into()));
        }
        if self.retrieval.timeout_ms == 0 {
            return Err(Error::InvalidConfig("retrieval.timeout_ms must be positive".into()));
        }
        if self.embedding.use_fake && self.embedding.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.fake_dim must be positive".into()));
        }
        Ok(())
    }
}

/// Locations of the precomputed artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    pub metadata_path: String,
    pub graph_path: String,
    pub index_dir: String,
    pub index_table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            metadata_path: "curriculum_metadata.json".to_string(),
            graph_path: "curriculum_graph.json".to_string(),
            index_dir: "indexes/lancedb".to_string(),
            index_table: "curriculum".to_string(),
        }
    }
}

impl DataSettings {
    pub fn metadata_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.metadata_path)
    }

    pub fn graph_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.graph_path)
    }

    pub fn index_dir(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.index_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Directory holding `config.json`, `tokenizer.json` and the weights.
    pub model_dir: Option<String>,
    pub use_fake: bool,
    pub fake_dim: usize,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, use_fake: false, fake_dim: 384, max_len: 256 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSettings {
    pub backend: IndexBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub policy: ReconciliationPolicy,
    /// Global index over-fetch factor under `global_post_filter`.
    pub candidate_multiplier: usize,
    pub timeout_ms: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3, policy: ReconciliationPolicy::PerCallIndex, candidate_multiplier: 1, timeout_ms: 30_000 }
    }
}

/// Keyword overrides; an empty table means the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelevanceSettings {
    pub keywords: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub host: String,
    /// Empty means the first model the service lists.
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { host: "localhost:11434".to_string(), model: String::new(), timeout_secs: 300 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
