use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use glob::Pattern;
use tokio::fs;

use crate::{Error, WasmConfig, run, shell};

/// Builds the WebAssembly wheel, smoke tests it if configured, and copies it into `output_dir`
///
/// Returns the path of the copied wheel. The wheel is left in the checkout's
/// dist directory as well.
///
/// # Errors
/// If the tool or the smoke test fails, no wheel is produced, or the wheel
/// cannot be copied.
pub async fn build(
    config: &WasmConfig,
    mypy_root_dir: &Path,
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let dist = mypy_root_dir.join(&config.dist_dir);
    remove_dir(&dist).await?;

    tracing::info!(command = %config.command, dir = %mypy_root_dir.display(), "running wasm build");
    run(shell(&config.command)
        .current_dir(mypy_root_dir)
        .envs(&config.environment))
    .await?;

    let wheel = find_artifact(&dist, &config.pattern)?;
    let file_name = wheel
        .file_name()
        .with_context(|| format!("artifact has no file name: {}", wheel.display()))?;

    if let Some(smoke_test) = &config.smoke_test {
        tracing::info!(command = %smoke_test, wheel = %wheel.display(), "smoke testing wasm wheel");
        run(&mut shell(smoke_test)).await?;
    }

    fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let destination = output_dir.join(file_name);
    fs::copy(&wheel, &destination).await.with_context(|| {
        format!(
            "failed to copy {} to {}",
            wheel.display(),
            destination.display()
        )
    })?;
    tracing::info!(wheel = %destination.display(), "copied wasm wheel");

    Ok(destination)
}

/// Remove a stale output directory, if there is one
async fn remove_dir(dir: &Path) -> anyhow::Result<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {
            tracing::debug!(dir = %dir.display(), "removed previous wasm output");
            Ok(())
        }
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => {
            Err(error).with_context(|| format!("failed to remove {}", dir.display()))
        }
    }
}

/// First file in `dir` matching `pattern`, by name
fn find_artifact(dir: &Path, pattern: &str) -> anyhow::Result<PathBuf> {
    let full_pattern = format!("{}/{pattern}", Pattern::escape(&dir.to_string_lossy()));

    let mut matches = glob::glob(&full_pattern)?
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    matches.sort();

    matches.into_iter().next().ok_or_else(|| {
        Error::MissingArtifact {
            pattern: dir.join(pattern),
        }
        .into()
    })
}
