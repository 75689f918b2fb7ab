//! `typeroute.toml` loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tr_core::{debug, Error, Result};
use tr_jsonschema::SchemaOptions;
use tr_transform::TransformOptions;
use tr_typescript::EmitTarget;

pub const CONFIG_FILE_NAME: &str = "typeroute.toml";

/// Tool configuration. Every key is optional; relative paths are resolved
/// against the directory holding the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Entry source file of the program.
    pub entry: Option<PathBuf>,
    /// Type configuration, `tsconfig.json` by default.
    pub tsconfig: Option<PathBuf>,
    pub transform: TransformOptions,
    pub schema: SchemaOptions,
    pub emit: EmitConfig,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    pub target: EmitTarget,
    pub minify: bool,
}

impl ToolConfig {
    /// Loads `path` when given, otherwise `typeroute.toml` from the working
    /// directory if there is one, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load_from_file(local)
                } else {
                    debug!("no {CONFIG_FILE_NAME} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| {
            Error::config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Entry file from the configuration, resolved against its directory.
    pub fn entry_path(&self) -> Option<PathBuf> {
        self.entry.as_deref().map(|path| self.resolve(path))
    }

    pub fn tsconfig_path(&self) -> Option<PathBuf> {
        self.tsconfig.as_deref().map(|path| self.resolve(path))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() && !base.as_os_str().is_empty() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
