use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::Error;

/// CPython version tag, as used in wheel ABI tags (`39`, `312`)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct PythonVersion(String);

impl PythonVersion {
    /// The tag itself
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PythonVersion {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let valid = (2..=3).contains(&tag.len())
            && tag.starts_with('3')
            && tag.chars().all(|c| c.is_ascii_digit());
        if valid {
            Ok(Self(tag.to_owned()))
        } else {
            Err(Error::InvalidPythonVersion(tag.to_owned()))
        }
    }
}

impl TryFrom<String> for PythonVersion {
    type Error = Error;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
