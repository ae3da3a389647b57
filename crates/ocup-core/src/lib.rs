//! Update logic for ocup, independent of how output is rendered.
//!
//! - Version tag parsing and ordering.
//! - Picking the release asset for a platform.
//! - Selecting the release notes between two versions.
//! - Extracting an archive without letting entries escape the target.
//! - The GitHub feed, download and installed-version probes that tie these
//!   together in [`Updater`].

mod download;
mod error;
pub mod extract;
mod github;
mod installed;
pub mod notes;
mod output;
pub mod release;
mod updater;
pub mod version;

pub use download::download_to_file;
pub use error::{FileError, UpdateError};
/// Archive extraction with per-entry containment checks.
pub use extract::{
    ArchiveKind, ExtractionReport, SkipReason, SkippedEntry, extract_archive, extract_archive_bytes,
};
/// Release feed access and the shared HTTP client.
pub use github::{DEFAULT_REPO, HttpTimeouts, ReleaseFeed, build_client};
pub use installed::{detect_installed_version, extract_version};
pub use notes::{MAX_NOTE_LINES, ReleaseNote, parse_release_notes, release_notes_window};
/// Rendering seam implemented by the binary.
pub use output::{ConsoleOutput, ProgressReporter};
pub use release::{
    LatestRelease, ReleaseAsset, ResolvedRelease, is_valid_asset_file_name, is_valid_download_url,
    resolve_release,
};
pub use updater::{UpdateOptions, UpdateOutcome, Updater, UpdaterConfig, is_up_to_date};
pub use version::{
    SemanticVersion, VersionParseError, compare_versions, find_version_triple, is_valid_version,
};
