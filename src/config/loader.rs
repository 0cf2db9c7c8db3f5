use crate::config::schema::{UpdatesFile, ValidationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read updates file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse updates file TOML{}: {source}", fmt_path(.path))]
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },

    #[error("invalid updates file{}: {source}", fmt_path(.path))]
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

fn fmt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" ({})", path.display()),
        None => String::new(),
    }
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<UpdatesFile, ConfigError> {
    let file: UpdatesFile =
        toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml { path: None, source })?;
    file.validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(file)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<UpdatesFile, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}
