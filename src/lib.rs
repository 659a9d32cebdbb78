//! Tooling to build mypyc-compiled mypy wheels with cibuildwheel, plus a WebAssembly wheel with pyodide.

use std::iter;

use anyhow::Context;
use tokio::process::Command;

mod build;
mod config;
mod error;

pub use build::{
    BuildOptions, PythonVersion, Wheel, build_wheels,
    cibuildwheel::script as cibuildwheel_script,
    environment::{Environment, assemble_environment, cibuildwheel_variables},
    wheels::inventory,
};
pub use config::{CibuildwheelConfig, Config, Layer, Options, Platform, WasmConfig};
pub use error::Error;

/// Run a given command with common error handling behavior
///
/// # Errors
///
/// Returns error if the command cannot be spawned, or [`Error::CommandFailed`]
/// carrying the child's exit code if it exits unsuccessfully.
pub async fn run(command: &mut Command) -> anyhow::Result<()> {
    let command_string = iter::once(command.as_std().get_program())
        .chain(command.as_std().get_args())
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");

    let status = command.status().await.with_context({
        let command_string = command_string.clone();
        move || command_string
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            command: command_string,
            code: status.code(),
        }
        .into())
    }
}

/// Wrap a script so it is interpreted by the host shell
#[must_use]
pub fn shell(script: &str) -> Command {
    #[cfg(windows)]
    {
        let mut command = Command::new("cmd");
        command.arg("/C").raw_arg(script);
        command
    }
    #[cfg(not(windows))]
    {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }
}
