//! Configuration and catalog files.
//!
//! Files are read as layers on top of each other: the format comes from the
//! extension, `${VAR}` / `$VAR` references are expanded from the environment
//! before parsing, and a `PREFIX__FIELD` environment layer can go on top.

use config::{ConfigBuilder, Environment, File, builder::DefaultState};
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub use config::FileFormat;

use super::ModalOrchestrationConfig;

/// Environment prefix of [`load_orchestration_config`].
pub const ENV_PREFIX: &str = "MODAL";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot tell the format of {}", path.display())]
    UnknownFormat { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)\b")
        .unwrap_or_else(|e| unreachable!("env reference pattern: {e}"))
});

/// File format implied by the extension of `path`.
pub fn format_of(path: impl AsRef<Path>) -> ConfigResult<FileFormat> {
    let path = path.as_ref();
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| match ext.as_str() {
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "toml" => Some(FileFormat::Toml),
            "json" => Some(FileFormat::Json),
            "json5" => Some(FileFormat::Json5),
            "ini" => Some(FileFormat::Ini),
            "ron" => Some(FileFormat::Ron),
            _ => None,
        });
    format.ok_or_else(|| ConfigError::UnknownFormat {
        path: path.to_path_buf(),
    })
}

/// Expand `${VAR}` and `$VAR` from the environment. Unset variables stay
/// as written.
pub fn expand_env(content: &str) -> String {
    ENV_REFERENCE
        .replace_all(content, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Stack of configuration sources; later layers override earlier ones.
#[derive(Debug, Default)]
pub struct LayeredConfig {
    builder: ConfigBuilder<DefaultState>,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file layer.
    pub fn file(self, path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.text(&content, format))
    }

    /// Add an in-memory layer.
    pub fn text(self, content: &str, format: FileFormat) -> Self {
        let expanded = expand_env(content);
        Self {
            builder: self.builder.add_source(File::from_str(&expanded, format)),
        }
    }

    /// Add `PREFIX__FIELD` environment variables as the top layer.
    pub fn env(self, prefix: &str) -> Self {
        Self {
            builder: self
                .builder
                .add_source(Environment::with_prefix(prefix).separator("__")),
        }
    }

    pub fn build<T: DeserializeOwned>(self) -> ConfigResult<T> {
        self.builder
            .build()
            .and_then(|config| config.try_deserialize::<T>())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Load any serde type from a single file.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> ConfigResult<T> {
    LayeredConfig::new().file(path)?.build()
}

/// Parse any serde type from text in an explicit format.
pub fn from_str<T: DeserializeOwned>(content: &str, format: FileFormat) -> ConfigResult<T> {
    LayeredConfig::new().text(content, format).build()
}

/// Merge in-memory sources in order.
pub fn merge_configs<T: DeserializeOwned>(sources: &[(&str, FileFormat)]) -> ConfigResult<T> {
    sources
        .iter()
        .fold(LayeredConfig::new(), |layers, (content, format)| layers.text(content, *format))
        .build()
}

/// Engine configuration from `path`, with `MODAL__*` overrides on top.
pub fn load_orchestration_config(path: impl AsRef<Path>) -> ConfigResult<ModalOrchestrationConfig> {
    LayeredConfig::new().file(path)?.env(ENV_PREFIX).build()
}
