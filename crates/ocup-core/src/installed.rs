use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use log::debug;
use regex::Regex;
use tokio::process::Command;
use which::which;

use ocup_platform::HideWindow;

use crate::error::UpdateError;
use crate::version::find_version_triple;

static VERSION_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)version\s+([\d.]+)").ok());

/// Ask the installed binary for its version by running `<binary> -v`.
///
/// # Errors
/// Returns [`UpdateError::General`] when the binary is not on `PATH`, cannot
/// be started, exits unsuccessfully, does not answer within `timeout`, or
/// prints nothing that looks like a version.
pub async fn detect_installed_version(
    binary_name: &str,
    timeout: Duration,
) -> Result<String, UpdateError> {
    let path = which(binary_name).map_err(|_| {
        UpdateError::general(format!("{binary_name} was not found on PATH"))
    })?;
    debug!("Found {binary_name} at {}", path.display());
    query_version(binary_name, &path, timeout).await
}

async fn query_version(
    binary_name: &str,
    path: &Path,
    timeout: Duration,
) -> Result<String, UpdateError> {
    let mut command = Command::new(path);
    command.arg("-v").hide_window().kill_on_drop(true);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| {
            UpdateError::general(format!(
                "{binary_name} version check timed out after {}s",
                timeout.as_secs()
            ))
        })?
        .map_err(|error| UpdateError::general(format!("Failed to run {binary_name}: {error}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(if stderr.is_empty() {
            UpdateError::general(format!(
                "{binary_name} version check failed with no error message"
            ))
        } else {
            UpdateError::general(format!("{binary_name} version check failed: {stderr}"))
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    extract_version(&stdout)
        .map(str::to_string)
        .ok_or_else(|| UpdateError::general("Could not parse version from output"))
}

/// Pull the version out of `-v` output: a `version X.Y.Z` label wins, then
/// the first bare `X.Y.Z` anywhere in the text.
#[must_use]
pub fn extract_version(output: &str) -> Option<&str> {
    VERSION_LABEL
        .as_ref()
        .and_then(|re| re.captures(output))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|v| v.chars().any(|c| c.is_ascii_digit()))
        .or_else(|| find_version_triple(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_version_wins() {
        assert_eq!(extract_version("opencode Version 0.5.2\n"), Some("0.5.2"));
        assert_eq!(extract_version("build 1.1.1, version  0.6.0"), Some("0.6.0"));
    }

    #[test]
    fn bare_triple_is_fallback() {
        assert_eq!(extract_version("0.4.45\n"), Some("0.4.45"));
        assert_eq!(extract_version("opencode v1.2.3 (abc)"), Some("1.2.3"));
    }

    #[test]
    fn no_version_in_output() {
        assert_eq!(extract_version(""), None);
        assert_eq!(extract_version("opencode dev build"), None);
        assert_eq!(extract_version("version ..."), None);
    }

    #[tokio::test]
    async fn missing_binary_is_general_error() {
        let result = detect_installed_version(
            "ocup-definitely-not-installed-binary",
            Duration::from_secs(1),
        )
        .await;

        assert!(matches!(result, Err(UpdateError::General { .. })));
    }
}
