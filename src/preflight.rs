//! Startup check for external executables

use std::path::PathBuf;

use crate::{Error, Result};

/// Executables the assistant expects on `PATH` by default
pub const DEFAULT_EXECUTABLES: &[&str] = &["ffmpeg", "ffprobe"];

/// Ensure every named executable resolves on `PATH`
///
/// Returns the resolved paths in the order given.
///
/// # Errors
///
/// Returns `Error::MissingExecutable` for the first name that cannot be found
pub fn check_executables<S: AsRef<str>>(names: &[S]) -> Result<Vec<PathBuf>> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            which::which(name).map_or_else(
                |_| Err(Error::MissingExecutable(name.to_string())),
                |path| {
                    tracing::debug!(name, path = %path.display(), "found executable");
                    Ok(path)
                },
            )
        })
        .collect()
}

/// Message shown to the user when an executable is missing
#[must_use]
pub fn missing_message(name: &str) -> String {
    format!(
        "{name} is not found in PATH. Please install FFmpeg and add its bin directory to the PATH."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_passes() {
        let names: [&str; 0] = [];
        assert!(check_executables(&names).unwrap().is_empty());
    }

    #[test]
    fn test_missing_executable_is_named() {
        let err = check_executables(&["dhwani-definitely-not-installed-xyz"]).unwrap_err();
        match err {
            Error::MissingExecutable(name) => {
                assert_eq!(name, "dhwani-definitely-not-installed-xyz");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_message_mentions_ffmpeg() {
        let msg = missing_message("ffprobe");
        assert!(msg.starts_with("ffprobe is not found in PATH"));
        assert!(msg.contains("FFmpeg"));
    }
}
