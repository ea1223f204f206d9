//! Configuration file support.
//!
//! ```toml
//! database_url = "mysql://root@localhost/shop"
//! schema = "shop"
//! tables = ["users", "orders"]
//! exclude = ["schema_migrations"]
//! output = "src/models"
//! derives = ["Debug", "Clone"]
//! serde = true
//! range_queries = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::codegen::GenOptions;
use crate::error::{GenError, GenResult};

/// File looked up in the working directory.
pub const LOCAL_CONFIG: &str = "tablegen.toml";

/// Settings read from `tablegen.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database_url: Option<String>,
    pub schema: Option<String>,
    pub tables: Vec<String>,
    pub exclude: Vec<String>,
    pub output: Option<PathBuf>,
    pub derives: Option<Vec<String>>,
    pub serde: Option<bool>,
    pub range_queries: Option<bool>,
}

impl Config {
    /// Parse configuration text.
    pub fn from_toml(content: &str) -> GenResult<Self> {
        toml::from_str(content).map_err(|e| GenError::Config(e.to_string()))
    }

    /// Read a configuration file.
    pub fn from_file(path: &Path) -> GenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GenError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| GenError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `explicit` if given, else the first of `./tablegen.toml` and
    /// `<config dir>/tablegen/config.toml` that exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> GenResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for path in Self::search_paths() {
            if path.is_file() {
                debug!(path = %path.display(), "loading config");
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("tablegen").join("config.toml"));
        }
        paths
    }

    /// Code generation options, falling back to [`GenOptions::default`].
    pub fn gen_options(&self) -> GenOptions {
        let defaults = GenOptions::default();
        GenOptions {
            derives: self.derives.clone().unwrap_or(defaults.derives),
            serde: self.serde.unwrap_or(defaults.serde),
            range_queries: self.range_queries.unwrap_or(defaults.range_queries),
            generated_at: None,
        }
    }
}
