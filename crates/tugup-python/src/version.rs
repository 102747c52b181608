//! Framework target versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A `major.minor` framework version, ordered lexicographically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TargetVersion {
    pub major: u16,
    pub minor: u16,
}

impl TargetVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        TargetVersion { major, minor }
    }
}

impl Default for TargetVersion {
    fn default() -> Self {
        TargetVersion::new(2, 2)
    }
}

impl fmt::Display for TargetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A version string that is not `X.Y`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid target version {input:?}: expected MAJOR.MINOR, e.g. 3.2")]
pub struct ParseVersionError {
    pub input: String,
}

impl FromStr for TargetVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError {
            input: s.to_string(),
        };
        let (major, minor) = s.trim().split_once('.').ok_or_else(err)?;
        let major = major.parse().map_err(|_| err())?;
        let minor = minor.parse().map_err(|_| err())?;
        Ok(TargetVersion::new(major, minor))
    }
}

impl TryFrom<String> for TargetVersion {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetVersion> for String {
    fn from(version: TargetVersion) -> Self {
        version.to_string()
    }
}
