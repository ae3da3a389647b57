//! One update run: detect, compare, show notes, download, extract.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::download::download_to_file;
use crate::error::{FileError, UpdateError};
use crate::extract::{ExtractionReport, extract_archive};
use crate::github::ReleaseFeed;
use crate::installed::detect_installed_version;
use crate::notes::release_notes_window;
use crate::output::ConsoleOutput;
use crate::release::ResolvedRelease;
use crate::version::compare_versions;

/// Per-run switches coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub force: bool,
    pub skip_release_notes: bool,
    pub custom_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub binary_name: String,
    pub platform_pattern: String,
    pub version_timeout: Duration,
    pub extract_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    AlreadyUpToDate { version: String },
    Installed { version: String, location: PathBuf },
}

pub struct Updater {
    client: reqwest::Client,
    feed: ReleaseFeed,
    config: UpdaterConfig,
    console: Arc<dyn ConsoleOutput>,
}

impl Updater {
    pub fn new(
        client: reqwest::Client,
        feed: ReleaseFeed,
        config: UpdaterConfig,
        console: Arc<dyn ConsoleOutput>,
    ) -> Self {
        Self {
            client,
            feed,
            config,
            console,
        }
    }

    /// Bring the local installation up to the latest release.
    ///
    /// # Errors
    /// Returns the first fatal [`UpdateError`]. A failed version probe or
    /// release-notes fetch only produces a warning.
    pub async fn run(
        &self,
        options: &UpdateOptions,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome, UpdateError> {
        let binary = &self.config.binary_name;
        let current = match detect_installed_version(binary, self.config.version_timeout).await {
            Ok(version) => {
                self.console
                    .version_info(&format!("Current {binary} version"), &version);
                Some(version)
            }
            Err(error) => {
                debug!("Installed version probe failed: {error}");
                self.console.warning(&format!("Warning: {error}"));
                self.console
                    .warning(&format!("{binary} is not installed or not in PATH"));
                None
            }
        };

        self.console.info("Fetching latest release...");
        let latest = self.feed.fetch_latest(cancel).await?;

        let pattern = &self.config.platform_pattern;
        self.console.info(&format!("Looking for platform: {pattern}"));
        let release = latest.resolve(pattern).ok_or_else(|| {
            UpdateError::general(format!("Release for platform '{pattern}' not found!"))
        })?;
        self.console
            .version_info(&format!("Latest {binary} version"), &release.version);

        if !options.force
            && let Some(current) = current.as_deref()
            && is_up_to_date(current, &release.version)
        {
            info!("Installed {current} is not older than {}", release.version);
            self.console
                .success(&format!("{binary} is already up to date!"));
            return Ok(UpdateOutcome::AlreadyUpToDate {
                version: current.to_string(),
            });
        }

        if !options.skip_release_notes {
            self.show_release_notes(current.as_deref(), &release.version, cancel)
                .await?;
        }

        let location = ocup_platform::resolve_extraction_root(options.custom_path.as_deref())
            .map_err(|error| UpdateError::general(error.to_string()))?;
        self.install(&release, &location, cancel).await?;

        Ok(UpdateOutcome::Installed {
            version: release.version,
            location,
        })
    }

    async fn show_release_notes(
        &self,
        current: Option<&str>,
        latest: &str,
        cancel: &CancellationToken,
    ) -> Result<(), UpdateError> {
        if current.is_none_or(|c| c.trim().is_empty()) {
            return Ok(());
        }

        match self.feed.fetch_release_notes(cancel).await {
            Ok(notes) => {
                let window = release_notes_window(notes, current, latest);
                if !window.is_empty() {
                    self.console.release_notes(&window);
                }
                Ok(())
            }
            Err(UpdateError::Cancelled) => Err(UpdateError::Cancelled),
            Err(error) => {
                self.console
                    .warning(&format!("Could not fetch release notes: {error}"));
                Ok(())
            }
        }
    }

    async fn install(
        &self,
        release: &ResolvedRelease,
        location: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), UpdateError> {
        self.console.info(&format!("Found: {}", release.file_name));
        self.console
            .info(&format!("Downloading from: {}", release.download_url));

        let staging = tempfile::Builder::new()
            .prefix("ocup-")
            .tempdir()
            .map_err(|error| FileError::io("failed to create temporary directory", error))?;
        let archive_path = staging.path().join(&release.file_name);

        let mut progress = self.console.progress(
            &format!("Downloading {}", release.file_name),
            None,
        );
        let size = download_to_file(
            &self.client,
            &release.download_url,
            &archive_path,
            progress.as_mut(),
            cancel,
        )
        .await?;
        self.console
            .success(&format!("Download completed ({} bytes)", group_thousands(size)));

        self.console.info("Extracting archive...");
        let result = self.extract(archive_path, location.to_path_buf()).await;

        if let Err(error) = staging.close() {
            warn!("Failed to remove temporary download directory: {error}");
        }

        let report = result?;
        if !report.skipped.is_empty() {
            self.console.warning(&format!(
                "Skipped {} unsafe archive entries",
                report.skipped.len()
            ));
        }
        info!(
            "Extracted {} files to {}",
            report.extracted.len(),
            location.display()
        );
        self.console
            .success(&format!("Extracted to: {}", location.display()));
        self.console
            .success("Download and extraction completed successfully!");
        Ok(())
    }

    async fn extract(
        &self,
        archive_path: PathBuf,
        location: PathBuf,
    ) -> Result<ExtractionReport, UpdateError> {
        let limit = self.config.extract_timeout;
        let task =
            tokio::task::spawn_blocking(move || extract_archive(&archive_path, &location));

        match tokio::time::timeout(limit, task).await {
            Err(_) => Err(FileError::TimedOut {
                seconds: limit.as_secs(),
            }
            .into()),
            Ok(Err(join_error)) => Err(UpdateError::general(format!(
                "Extraction task failed: {join_error}"
            ))),
            Ok(Ok(report)) => Ok(report?),
        }
    }
}

/// Whether `current` is at least as new as `latest`.
#[must_use]
pub fn is_up_to_date(current: &str, latest: &str) -> bool {
    compare_versions(current, latest) != Ordering::Less
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
