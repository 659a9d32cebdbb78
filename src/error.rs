use std::path::PathBuf;

/// Failures the caller may want to tell apart
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An external tool exited unsuccessfully
    #[error("command `{command}` failed with {}", describe_code(.code.as_ref()))]
    CommandFailed {
        /// The command line that was run
        command: String,
        /// Exit code, if the process was not terminated by a signal
        code: Option<i32>,
    },
    /// The WebAssembly build produced nothing matching the expected pattern
    #[error("no artifact matching `{}` was produced", .pattern.display())]
    MissingArtifact {
        /// Glob pattern that was searched
        pattern: PathBuf,
    },
    /// Version tag that is not of the form `39` or `312`
    #[error("invalid python version `{0}`, expected a tag such as 39 or 312")]
    InvalidPythonVersion(String),
    /// The build matrix document is inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Process exit code to report for this failure
    ///
    /// A failed command surfaces its own exit code when it can be represented,
    /// everything else maps to 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::CommandFailed {
                code: Some(code), ..
            } => u8::try_from(*code)
                .ok()
                .filter(|code| *code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}

fn describe_code(code: Option<&i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_owned(),
    }
}
