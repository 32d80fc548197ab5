//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`APP_INDEX__ROOT_DIR` maps to `index.root_dir`). The `[index]` section is
//! read into [`IndexSettings`].
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::FailurePolicy;

/// Smallest writer heap tantivy accepts for a single indexing thread.
pub const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.index_settings()?;
        Ok(config)
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

    /// The `[index]` section, falling back to defaults when it is absent.
    pub fn index_settings(&self) -> Result<IndexSettings> {
        let settings = if self.figment.find_value("index").is_ok() {
            self.figment
                .extract_inner::<IndexSettings>("index")
                .map_err(|e| Error::InvalidConfig(format!("index: {}", e)))?
        } else {
            IndexSettings::default()
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexSettings {
    pub root_dir: String,
    pub writer_heap_bytes: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            root_dir: "./data/index".to_string(),
            writer_heap_bytes: 50_000_000,
            failure_policy: FailurePolicy::Suppress,
        }
    }
}

impl IndexSettings {
    pub fn validate(&self) -> Result<()> {
        if self.root_dir.trim().is_empty() {
            return Err(Error::InvalidConfig("index.root_dir must not be empty".into()));
        }
        if self.writer_heap_bytes < MIN_WRITER_HEAP_BYTES {
            return Err(Error::InvalidConfig(format!(
                "index.writer_heap_bytes must be at least {} (got {})",
                MIN_WRITER_HEAP_BYTES, self.writer_heap_bytes
            )));
        }
        Ok(())
    }

    /// Root directory with `~`/`$VAR` expanded and relative paths anchored at `base`.
    pub fn root_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.root_dir)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
