//! Declarative build matrix, keyed by platform and Python version.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use tokio::fs;

use crate::{Error, build::PythonVersion};

/// Matrix shipped with the binary
const EMBEDDED: &str = include_str!("../config/wheels.yaml");

/// Full build matrix for both tools
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Primary build with cibuildwheel
    pub cibuildwheel: CibuildwheelConfig,
    /// Secondary WebAssembly build
    pub wasm: WasmConfig,
}

/// Option name to value
pub type Options = BTreeMap<String, String>;

/// How cibuildwheel is invoked and which `CIBW_*` variables it receives
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CibuildwheelConfig {
    /// Shell command prefix, before extra options and output arguments
    pub command: String,
    /// Options for all platforms and versions
    #[serde(default)]
    pub options: Options,
    /// Platform options for all versions
    #[serde(default)]
    pub platforms: BTreeMap<Platform, Options>,
    /// Per-version layers, applied after the defaults
    #[serde(default)]
    pub versions: BTreeMap<PythonVersion, Layer>,
}

impl CibuildwheelConfig {
    /// Option layers for `python_version`, in the order they apply
    pub fn layers<'a>(
        &'a self,
        python_version: &PythonVersion,
    ) -> impl Iterator<Item = (&'a Options, &'a BTreeMap<Platform, Options>)> {
        std::iter::once((&self.options, &self.platforms)).chain(
            self.versions
                .get(python_version)
                .map(|layer| (&layer.options, &layer.platforms)),
        )
    }
}

/// Options that only apply to one Python version
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layer {
    /// Options for all platforms, becoming `CIBW_<OPTION>`
    #[serde(default)]
    pub options: Options,
    /// Options for one platform, becoming `CIBW_<OPTION>_<PLATFORM>`
    #[serde(default)]
    pub platforms: BTreeMap<Platform, Options>,
}

/// Platforms cibuildwheel accepts platform-specific options for
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Platform {
    /// manylinux and musllinux containers
    Linux,
    /// macOS, including universal2
    Macos,
    /// Windows
    Windows,
}

/// The pyodide build that only runs for a single Python version
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WasmConfig {
    /// Version that triggers the build
    pub python_version: PythonVersion,
    /// Shell command run inside the mypy checkout
    pub command: String,
    /// Where the tool writes its wheel, relative to the checkout
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
    /// File name pattern of the produced wheel
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// Added on top of the inherited environment
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Shell command checking the built wheel, run in the current directory
    #[serde(default)]
    pub smoke_test: Option<String>,
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_pattern() -> String {
    "*.whl".to_owned()
}

impl Config {
    /// The matrix compiled into the binary
    ///
    /// # Errors
    /// If the embedded document is invalid.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::parse(EMBEDDED).context("embedded build matrix")
    }

    /// Read a matrix from a YAML file
    ///
    /// # Errors
    /// If the file cannot be read or is not a valid matrix.
    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read build matrix: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("failed to parse build matrix: {}", path.display()))
    }

    /// Read `path` if given, otherwise use the embedded matrix
    ///
    /// # Errors
    /// If the selected matrix is invalid.
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path).await,
            None => Self::embedded(),
        }
    }

    /// Parse and validate a YAML document
    ///
    /// # Errors
    /// If the document does not deserialize or an option name is invalid.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        let layers = std::iter::once((&self.cibuildwheel.options, &self.cibuildwheel.platforms))
            .chain(
                self.cibuildwheel
                    .versions
                    .values()
                    .map(|layer| (&layer.options, &layer.platforms)),
            );
        for (options, platforms) in layers {
            let names = options
                .keys()
                .chain(platforms.values().flat_map(BTreeMap::keys));
            for name in names {
                let valid = !name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
                if !valid {
                    return Err(Error::InvalidConfig(format!(
                        "option name `{name}` must only contain a-z, 0-9 and _"
                    )));
                }
            }
        }

        if self.cibuildwheel.command.trim().is_empty() {
            return Err(Error::InvalidConfig("empty cibuildwheel command".to_owned()));
        }
        if self.wasm.command.trim().is_empty() {
            return Err(Error::InvalidConfig("empty wasm command".to_owned()));
        }
        if self
            .wasm
            .smoke_test
            .as_ref()
            .is_some_and(|command| command.trim().is_empty())
        {
            return Err(Error::InvalidConfig("empty wasm smoke test".to_owned()));
        }
        Ok(())
    }
}
