//! Picking the right download out of a release.

use log::debug;
use serde::Deserialize;

use crate::error::UpdateError;
use crate::version::is_valid_version;

const ARCHIVE_EXTENSIONS: [&str; 2] = [".zip", ".tar.gz"];

/// Characters that are not allowed in a file name on at least one supported
/// platform.
const FORBIDDEN_FILE_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// One file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "browser_download_url")]
    pub download_url: String,
}

impl ReleaseAsset {
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }
}

/// The "latest release" document: a tag plus its assets.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRelease {
    pub tag_name: String,
    pub assets: Vec<ReleaseAsset>,
}

impl LatestRelease {
    /// Decode the release metadata returned by the release feed.
    ///
    /// # Errors
    /// Returns [`UpdateError::Validation`] when the body is not JSON or lacks
    /// `tag_name` or `assets`.
    pub fn from_json(body: &str) -> Result<Self, UpdateError> {
        serde_json::from_str(body)
            .map_err(|error| UpdateError::validation(format!("Invalid API response: {error}")))
    }

    /// Shorthand for [`resolve_release`] over this release.
    #[must_use]
    pub fn resolve(&self, platform_pattern: &str) -> Option<ResolvedRelease> {
        resolve_release(&self.tag_name, &self.assets, platform_pattern)
    }
}

/// The asset chosen for this machine, tagged with its release version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub version: String,
    pub download_url: String,
    pub file_name: String,
}

/// Select the first asset for `platform_pattern` that is safe to download.
///
/// Candidates are assets whose name contains the pattern and ends in an
/// accepted archive extension. A candidate with a bad URL or file name is
/// skipped and the scan continues, so one malformed upload does not hide a
/// later good one. Returns `None` for an invalid tag or when nothing matches.
#[must_use]
pub fn resolve_release(
    tag: &str,
    assets: &[ReleaseAsset],
    platform_pattern: &str,
) -> Option<ResolvedRelease> {
    if !is_valid_version(tag) {
        debug!("Release tag {tag:?} is not a version");
        return None;
    }

    assets
        .iter()
        .filter(|asset| !asset.name.trim().is_empty())
        .filter(|asset| is_platform_candidate(&asset.name, platform_pattern))
        .find(|asset| {
            let url_ok = is_valid_download_url(&asset.download_url);
            let name_ok = is_valid_asset_file_name(&asset.name);
            if !(url_ok && name_ok) {
                debug!(
                    "Skipping asset {} (valid url: {url_ok}, valid name: {name_ok})",
                    asset.name
                );
            }
            url_ok && name_ok
        })
        .map(|asset| ResolvedRelease {
            version: tag.to_string(),
            download_url: asset.download_url.clone(),
            file_name: asset.name.clone(),
        })
}

fn is_platform_candidate(name: &str, platform_pattern: &str) -> bool {
    has_archive_extension(name) && contains_token(name, platform_pattern)
}

/// Whether `pattern` occurs in `name` without touching an alphanumeric
/// character on either side, so `win-x64` does not match inside `darwin-x64`.
fn contains_token(name: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    name.match_indices(pattern).any(|(start, matched)| {
        let before = name[..start].chars().next_back();
        let after = name[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn has_archive_extension(name: &str) -> bool {
    ARCHIVE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// An absolute `http`/`https` URL with a host.
#[must_use]
pub fn is_valid_download_url(url: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }
    reqwest::Url::parse(url).is_ok_and(|parsed| {
        matches!(parsed.scheme(), "http" | "https")
            && parsed.host_str().is_some_and(|host| !host.is_empty())
    })
}

/// A bare archive file name that is safe to create inside a directory.
#[must_use]
pub fn is_valid_asset_file_name(name: &str) -> bool {
    if name.trim().is_empty() || name.contains("..") {
        return false;
    }
    if name
        .chars()
        .any(|c| c.is_control() || FORBIDDEN_FILE_NAME_CHARS.contains(&c))
    {
        return false;
    }
    has_archive_extension(name)
}
