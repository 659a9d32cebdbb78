use std::path::{Path, PathBuf};

use anyhow::Context;
use glob::Pattern;
use sha2::{Digest, Sha256};
use tokio::fs;

/// A wheel in the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wheel {
    /// Location of the wheel
    pub path: PathBuf,
    /// Hex encoded SHA-256 of the contents
    pub sha256: String,
}

/// All wheels in `output_dir`, sorted by file name
///
/// # Errors
/// If a wheel cannot be read.
pub async fn inventory(output_dir: &Path) -> anyhow::Result<Vec<Wheel>> {
    let pattern = format!("{}/*.whl", Pattern::escape(&output_dir.to_string_lossy()));
    let mut paths = glob::glob(&pattern)?
        .filter_map(Result::ok)
        .collect::<Vec<_>>();
    paths.sort();

    let mut wheels = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let sha256 = hex::encode(Sha256::digest(&content));
        wheels.push(Wheel { path, sha256 });
    }

    Ok(wheels)
}
