//! Build compiled mypy wheels for one Python version.
//!
//! Wheels are built by cibuildwheel, configured through `CIBW_*` environment
//! variables. For one designated version a WebAssembly wheel is also built with
//! pyodide and copied next to the others.
//!
//! Test locally by passing cibuildwheel options through, e.g. on macOS:
//!
//! ```sh
//! mypyc-wheels --mypy-root-dir ~/dev/mypy --python-version 312 --output-dir out --extra-opts="--platform macos"
//! ```

use std::{io::IsTerminal, path::PathBuf, process::ExitCode};

use clap::{ArgAction, Parser};
use mypyc_wheels::{BuildOptions, Config, Error, PythonVersion, build_wheels};
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Location of mypy checkout
    #[arg(long, value_name = "DIR")]
    mypy_root_dir: PathBuf,
    /// Python version (e.g. 39 or 312)
    #[arg(long, value_name = "XY")]
    python_version: PythonVersion,
    /// Output directory for created wheels
    #[arg(long, value_name = "DIR")]
    output_dir: PathBuf,
    /// Extra options passed to cibuildwheel verbatim
    #[arg(
        long,
        value_name = "OPTIONS",
        default_value = "",
        allow_hyphen_values = true
    )]
    extra_opts: String,
    /// Build matrix to use instead of the built-in one
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print what would run without building anything
    #[arg(long)]
    dry_run: bool,
    /// More log output, repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match build(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::from(error.downcast_ref::<Error>().map_or(1, Error::exit_code))
        }
    }
}

async fn build(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).await?;
    let options = BuildOptions {
        mypy_root_dir: cli.mypy_root_dir,
        python_version: cli.python_version,
        output_dir: cli.output_dir,
        extra_opts: cli.extra_opts,
        dry_run: cli.dry_run,
    };

    let wheels = build_wheels(&options, &config).await?;
    if !options.dry_run {
        tracing::info!(
            "{} wheel(s) in {}",
            wheels.len(),
            options.output_dir.display()
        );
    }
    Ok(())
}

/// `RUST_LOG` wins, otherwise the level follows `-v`
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "mypyc_wheels=info",
        1 => "mypyc_wheels=debug",
        _ => "mypyc_wheels=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .try_init();
}
