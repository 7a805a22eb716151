//! Layered configuration for the CLI.
//!
//! `defaults/plato.default.toml` is embedded into the binary. A user file and
//! `PLATO__SECTION__KEY` environment variables are layered on top with
//! [`Loader`] before deserializing into [`PlatoConfig`].

use std::collections::BTreeMap;
use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, ValueKind};
use plato_serializer_core::{DialogueConfig, LlmSettings, MachineConfig};
use serde::Deserialize;

const DEFAULT_TOML: &str = include_str!("../defaults/plato.default.toml");

/// Top-level configuration consumed by the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatoConfig {
    pub machine: MachineSection,
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MachineSection {
    pub name: String,
    pub work: String,
}

impl PlatoConfig {
    /// Role inference configuration; a blank machine name means no assistant.
    pub fn dialogue(&self) -> DialogueConfig {
        let name = self.machine.name.trim();
        if name.is_empty() {
            DialogueConfig::default()
        } else {
            DialogueConfig::with_assistant_name(name)
        }
    }

    pub fn machine(&self) -> MachineConfig {
        MachineConfig {
            name: self.machine.name.trim().to_string(),
            work: self.machine.work.clone(),
        }
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings::from_query_pairs(self.settings.iter().map(|(k, v)| (k.clone(), v)))
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `PLATO__SECTION__KEY` environment variables.
    pub fn with_env(mut self) -> Self {
        self.builder = self
            .builder
            .add_source(Environment::with_prefix("PLATO").prefix_separator("__").separator("__"));
        self
    }

    /// Apply a single key/value override (used for CLI flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<PlatoConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
