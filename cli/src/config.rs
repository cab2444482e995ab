use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CliError;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "folio.toml";

/// Contents of a `folio.toml` file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderSettings,
}

/// How a document is rendered. Every field is optional; unset fields fall
/// back to what the document itself says, then to the schema defaults.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RenderSettings {
    /// Container element for the root section.
    #[serde(default, rename = "as")]
    pub element: Option<String>,

    /// Heading depth of the root section.
    #[serde(default)]
    pub level: Option<u32>,

    /// Style class for the root container.
    #[serde(default)]
    pub class_name: Option<String>,

    /// Report unknown fields instead of ignoring them.
    #[serde(default)]
    pub strict: bool,

    /// Render as the document's `main` section (depth 1).
    #[serde(default)]
    pub main: bool,
}

impl Config {
    /// Load `path` if given, else `folio.toml` if present, else defaults.
    pub fn discover(path: Option<&str>) -> Result<Config, CliError> {
        match path {
            Some(path) => Config::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Config::load(DEFAULT_CONFIG_FILE),
            None => Ok(Config::default()),
        }
    }

    pub fn load(path: &str) -> Result<Config, CliError> {
        let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_string(),
            source,
        })?;
        let config = Config::parse(&source).map_err(|source| CliError::Config {
            path: path.to_string(),
            source,
        })?;
        log::debug!("loaded config from {}", path);
        Ok(config)
    }

    pub fn parse(source: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(source)
    }
}

impl RenderSettings {
    /// Apply command-line values on top of these settings.
    pub fn merge(
        mut self,
        element: Option<String>,
        level: Option<u32>,
        class_name: Option<String>,
        strict: bool,
        main: bool,
    ) -> Self {
        self.element = element.or(self.element);
        self.level = level.or(self.level);
        self.class_name = class_name.or(self.class_name);
        self.strict |= strict;
        self.main |= main;
        self
    }

    /// Configuration fields to force onto the root section's props.
    /// `main` wins over `as` and `level`.
    pub fn overrides(&self) -> Map<String, Value> {
        let mut overrides = Map::new();
        if let Some(class_name) = &self.class_name {
            overrides.insert("className".to_string(), Value::from(class_name.as_str()));
        }
        if self.main {
            overrides.insert("as".to_string(), Value::from(folio_render::section::MAIN_ELEMENT));
            overrides.insert("level".to_string(), Value::from(folio_render::section::MAIN_LEVEL));
            return overrides;
        }
        if let Some(element) = &self.element {
            overrides.insert("as".to_string(), Value::from(element.as_str()));
        }
        if let Some(level) = self.level {
            overrides.insert("level".to_string(), Value::from(level));
        }
        overrides
    }
}
