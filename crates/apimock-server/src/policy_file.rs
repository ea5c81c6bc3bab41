//! Declarative response-policy files
//!
//! A policy file is a small TOML document selecting the failure schedule at
//! launch time, e.g.:
//!
//! ```toml
//! fail-first = 7
//! fail-status = 503
//! ```
//!
//! A missing or malformed file is fatal at startup.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use apimock_core::ResponsePolicy;

/// Error loading a policy file
#[derive(Debug, Error)]
pub enum PolicyFileError {
    /// The file could not be read
    #[error("cannot read policy file {path}: {source}")]
    Read {
        /// Path that was passed on the command line
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
    /// The file is not a valid policy document
    #[error("invalid policy file {path}: {source}")]
    Parse {
        /// Path that was passed on the command line
        path: String,
        /// Underlying TOML error
        source: toml::de::Error,
    },
}

/// Contents of a policy file
#[derive(Clone, Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PolicySettings {
    /// Number of leading requests to reject
    #[serde(default)]
    pub fail_first: u64,
    /// Status code for rejected requests
    #[serde(default = "default_fail_status")]
    pub fail_status: u16,
}

fn default_fail_status() -> u16 {
    503
}

impl Default for PolicySettings {
    fn default() -> Self {
        PolicySettings {
            fail_first: 0,
            fail_status: default_fail_status(),
        }
    }
}

impl PolicySettings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, PolicyFileError> {
        let contents = std::fs::read_to_string(path).map_err(|source| PolicyFileError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| PolicyFileError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Turn the settings into a [`ResponsePolicy`]
    pub fn into_policy(self) -> ResponsePolicy {
        if self.fail_first == 0 {
            ResponsePolicy::AlwaysOk
        } else {
            ResponsePolicy::FailNThenOk {
                n: self.fail_first,
                status: self.fail_status,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_failure_schedule() {
        let settings: PolicySettings =
            toml::from_str("fail-first = 7\nfail-status = 503\n").unwrap();
        assert_eq!(settings.fail_first, 7);
        assert_eq!(settings.fail_status, 503);

        match settings.into_policy() {
            ResponsePolicy::FailNThenOk { n, status } => {
                assert_eq!(n, 7);
                assert_eq!(status, 503);
            }
            policy => panic!("unexpected policy {policy:?}"),
        }
    }

    #[test]
    fn fail_status_defaults_to_503() {
        let settings: PolicySettings = toml::from_str("fail-first = 3\n").unwrap();
        assert_eq!(settings.fail_status, 503);
    }

    #[test]
    fn empty_file_means_always_ok() {
        let settings: PolicySettings = toml::from_str("").unwrap();
        assert!(matches!(settings.into_policy(), ResponsePolicy::AlwaysOk));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<PolicySettings>("handler-class = \"MockHandler\"\n").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = PolicySettings::load(Path::new("/nonexistent/policy.toml")).unwrap_err();
        assert!(matches!(err, PolicyFileError::Read { .. }));
    }
}
