//! Translate the build matrix into the environment cibuildwheel runs with.

use std::{
    collections::BTreeMap,
    ffi::{OsStr, OsString},
};

use itertools::Itertools;

use crate::{CibuildwheelConfig, PythonVersion};

/// Placeholder replaced with the requested version tag
const PYTHON_VERSION_PLACEHOLDER: &str = "{{python_version}}";

/// Environment a subprocess runs with, ordered for reproducible logging
pub type Environment = BTreeMap<OsString, OsString>;

/// The `CIBW_*` variables for a given Python version
///
/// Later layers win: default options, default platform options, then the
/// version's options and platform options.
#[must_use]
pub fn cibuildwheel_variables(
    config: &CibuildwheelConfig,
    python_version: &PythonVersion,
) -> BTreeMap<String, String> {
    let mut variables = BTreeMap::new();

    for (options, platforms) in config.layers(python_version) {
        for (option, value) in options {
            variables.insert(
                format!("CIBW_{}", option.to_uppercase()),
                render(value, python_version),
            );
        }
        for (platform, options) in platforms {
            for (option, value) in options {
                variables.insert(
                    format!("CIBW_{}_{platform}", option.to_uppercase()),
                    render(value, python_version),
                );
            }
        }
    }

    variables
}

/// Merge the `CIBW_*` variables over an inherited environment
///
/// Inherited variables are kept unless one of the generated names replaces them.
pub fn assemble_environment<I, K, V>(
    config: &CibuildwheelConfig,
    python_version: &PythonVersion,
    inherited: I,
) -> Environment
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    let mut environment: Environment = inherited
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect();

    environment.extend(
        cibuildwheel_variables(config, python_version)
            .into_iter()
            .map(|(key, value)| (key.into(), value.into())),
    );

    environment
}

/// Substitute the version and fold the value onto a single line
fn render(value: &str, python_version: &PythonVersion) -> String {
    value
        .replace(PYTHON_VERSION_PLACEHOLDER, python_version.as_str())
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .join(" ")
}

/// Whether `key` is one of the variables generated for cibuildwheel
pub(crate) fn is_cibuildwheel_variable(key: &OsStr) -> bool {
    key.to_str().is_some_and(|key| key.starts_with("CIBW_"))
}
