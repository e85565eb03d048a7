use inkjar_engine::OptionsPatch;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid pattern for editor.{field}: {source}")]
    InvalidPattern {
        field: &'static str,
        source: regex::Error,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub editor: EditorConfig,
}

/// The `[editor]` table. Unset keys keep the engine defaults.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_to_new_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spellcheck: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catch_tab: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline_tab: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_indent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_closing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<bool>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/inkjar");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Expand `~` and environment variables, e.g. in a file argument.
    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }

    /// Engine options for the `[editor]` table, with patterns compiled.
    pub fn options_patch(&self) -> Result<OptionsPatch, ConfigError> {
        let editor = &self.editor;
        Ok(OptionsPatch {
            tab: editor.tab.clone(),
            indent_on: compile("indent_on", editor.indent_on.as_deref())?,
            move_to_new_line: compile("move_to_new_line", editor.move_to_new_line.as_deref())?,
            spellcheck: editor.spellcheck,
            catch_tab: editor.catch_tab,
            multiline_tab: editor.multiline_tab,
            preserve_indent: editor.preserve_indent,
            add_closing: editor.add_closing,
            history: editor.history,
            host: None,
        })
    }
}

fn compile(field: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
    pattern
        .map(|p| Regex::new(p).map_err(|source| ConfigError::InvalidPattern { field, source }))
        .transpose()
}
