use std::{env, path::PathBuf};

use crate::Config;

pub mod cibuildwheel;
pub mod environment;
mod pyodide;
mod python_version;
pub mod wheels;

pub use python_version::PythonVersion;
pub use wheels::Wheel;

use environment::{assemble_environment, is_cibuildwheel_variable};

/// What to build and where
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Location of the mypy checkout
    pub mypy_root_dir: PathBuf,
    /// Python version to build wheels for
    pub python_version: PythonVersion,
    /// Where the wheels end up
    pub output_dir: PathBuf,
    /// Passed to cibuildwheel verbatim
    pub extra_opts: String,
    /// Log what would run without running anything
    pub dry_run: bool,
}

/// Build the cibuildwheel wheels, and the WebAssembly wheel if `python_version` asks for it.
///
/// Returns every wheel in the output directory, including ones from earlier runs.
///
/// # Errors
/// If either tool or the WebAssembly smoke test fails, in which case nothing
/// after it runs, or the WebAssembly build produces no wheel.
pub async fn build_wheels(options: &BuildOptions, config: &Config) -> anyhow::Result<Vec<Wheel>> {
    let environment =
        assemble_environment(&config.cibuildwheel, &options.python_version, env::vars_os());
    for (key, value) in environment
        .iter()
        .filter(|(key, _)| is_cibuildwheel_variable(key))
    {
        tracing::debug!("{}={}", key.to_string_lossy(), value.to_string_lossy());
    }

    let build_wasm = options.python_version == config.wasm.python_version;

    if options.dry_run {
        let script = cibuildwheel::script(
            &config.cibuildwheel.command,
            &options.extra_opts,
            &options.output_dir,
            &options.mypy_root_dir,
        );
        tracing::info!(%script, "dry run: would run cibuildwheel");
        if build_wasm {
            tracing::info!(command = %config.wasm.command, "dry run: would run wasm build");
            if let Some(smoke_test) = &config.wasm.smoke_test {
                tracing::info!(command = %smoke_test, "dry run: would smoke test wasm wheel");
            }
        }
        return Ok(vec![]);
    }

    cibuildwheel::build(
        &config.cibuildwheel,
        &options.extra_opts,
        &options.output_dir,
        &options.mypy_root_dir,
        environment,
    )
    .await?;

    if build_wasm {
        pyodide::build(&config.wasm, &options.mypy_root_dir, &options.output_dir).await?;
    } else {
        tracing::debug!(
            python_version = %options.python_version,
            "skipping wasm build, only done for {}",
            config.wasm.python_version
        );
    }

    let wheels = wheels::inventory(&options.output_dir).await?;
    for wheel in &wheels {
        tracing::info!(sha256 = %wheel.sha256, "wheel in output dir: {}", wheel.path.display());
    }

    Ok(wheels)
}

#[cfg(all(test, unix))]
mod tests {
    use std::{collections::BTreeMap, path::Path};

    use tokio::fs;

    use super::*;
    use crate::{CibuildwheelConfig, Error, WasmConfig};

    /// Primary writes a wheel into the output dir, wasm writes into dist and leaves a marker
    fn config(primary: &str, wasm_version: &str) -> Config {
        Config {
            cibuildwheel: CibuildwheelConfig {
                command: primary.to_owned(),
                options: BTreeMap::from([(
                    "build".to_owned(),
                    "cp{{python_version}}-*".to_owned(),
                )]),
                platforms: BTreeMap::new(),
                versions: BTreeMap::new(),
            },
            wasm: WasmConfig {
                python_version: wasm_version.parse().unwrap(),
                command: "touch wasm-ran && mkdir dist && touch dist/mypy-1.0-cp312-cp312-pyodide_2024_0_wasm32.whl".to_owned(),
                dist_dir: PathBuf::from("dist"),
                pattern: "*.whl".to_owned(),
                environment: BTreeMap::new(),
                smoke_test: None,
            },
        }
    }

    /// Writes `mypy-1.0-cp<ver>-native.whl` into the `--output-dir`
    const WRITE_WHEEL: &str =
        r#"sh -c 'mkdir -p "$2" && touch "$2/mypy-1.0-$(echo "$CIBW_BUILD" | cut -c1-5)-native.whl"' cibuildwheel"#;

    fn options(root: &Path, output: &Path, python_version: &str) -> BuildOptions {
        BuildOptions {
            mypy_root_dir: root.to_owned(),
            python_version: python_version.parse().unwrap(),
            output_dir: output.to_owned(),
            extra_opts: String::new(),
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn trigger_version_builds_both_wheels() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let output = root.path().join("wheelhouse");

        let wheels = build_wheels(
            &options(root.path(), &output, "312"),
            &config(WRITE_WHEEL, "312"),
        )
        .await?;

        let names = wheels
            .iter()
            .map(|wheel| wheel.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "mypy-1.0-cp312-cp312-pyodide_2024_0_wasm32.whl",
                "mypy-1.0-cp312-native.whl"
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn other_versions_skip_wasm_build() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let output = root.path().join("wheelhouse");

        let wheels = build_wheels(
            &options(root.path(), &output, "311"),
            &config(WRITE_WHEEL, "312"),
        )
        .await?;

        assert!(!root.path().join("wasm-ran").exists());
        assert_eq!(wheels.len(), 1);
        assert!(wheels[0].path.ends_with("mypy-1.0-cp311-native.whl"));
        Ok(())
    }

    #[tokio::test]
    async fn primary_failure_stops_the_pipeline() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let output = root.path().join("wheelhouse");

        let error = build_wheels(
            &options(root.path(), &output, "312"),
            &config("sh -c 'exit 1' cibuildwheel", "312"),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::CommandFailed { code: Some(1), .. })
        ));
        assert!(!root.path().join("wasm-ran").exists());
        Ok(())
    }

    #[tokio::test]
    async fn dry_run_runs_nothing() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let output = root.path().join("wheelhouse");
        let mut options = options(root.path(), &output, "312");
        options.dry_run = true;

        let wheels = build_wheels(&options, &config("touch primary-ran", "312")).await?;

        assert!(wheels.is_empty());
        assert!(!Path::new("primary-ran").exists());
        assert!(!root.path().join("wasm-ran").exists());
        assert!(fs::metadata(&output).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn earlier_wheels_are_listed_too() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let output = root.path().join("wheelhouse");
        fs::create_dir_all(&output).await?;
        fs::write(output.join("mypy-0.9-cp310-native.whl"), "").await?;

        let wheels = build_wheels(
            &options(root.path(), &output, "311"),
            &config(WRITE_WHEEL, "312"),
        )
        .await?;

        let names = wheels
            .iter()
            .map(|wheel| wheel.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            ["mypy-0.9-cp310-native.whl", "mypy-1.0-cp311-native.whl"]
        );
        Ok(())
    }
}
