use std::path::Path;

use itertools::Itertools;

use crate::{CibuildwheelConfig, run, shell};

use super::environment::Environment;

/// Shell script invoking cibuildwheel
///
/// Extra options are inserted verbatim, directly before `--output-dir`.
#[must_use]
pub fn script(command: &str, extra_opts: &str, output_dir: &Path, mypy_root_dir: &Path) -> String {
    let output_dir = quote(output_dir);
    let mypy_root_dir = quote(mypy_root_dir);
    [
        command.trim(),
        extra_opts,
        "--output-dir",
        output_dir.as_str(),
        mypy_root_dir.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .join(" ")
}

/// Run cibuildwheel with exactly the given environment
///
/// # Errors
/// If cibuildwheel cannot be started or exits unsuccessfully.
pub async fn build(
    config: &CibuildwheelConfig,
    extra_opts: &str,
    output_dir: &Path,
    mypy_root_dir: &Path,
    environment: Environment,
) -> anyhow::Result<()> {
    let script = script(&config.command, extra_opts, output_dir, mypy_root_dir);
    tracing::info!(%script, "running cibuildwheel");

    run(shell(&script).env_clear().envs(environment)).await
}

/// Quote a path for the host shell if it contains anything but plain path characters
fn quote(path: &Path) -> String {
    let path = path.to_string_lossy();
    let plain = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/\\:._-+,=@~".contains(c));
    if plain {
        path.into_owned()
    } else if cfg!(windows) {
        format!("\"{path}\"")
    } else {
        format!("'{}'", path.replace('\'', r"'\''"))
    }
}
