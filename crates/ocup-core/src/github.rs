use std::time::Duration;

use log::debug;
use tokio_util::sync::CancellationToken;

use crate::error::UpdateError;
use crate::notes::{ReleaseNote, parse_release_notes};
use crate::release::{LatestRelease, is_valid_download_url};

pub const DEFAULT_REPO: &str = "sst/opencode";
const API_BASE: &str = "https://api.github.com/repos";

/// Timeouts applied to every request made by the updater.
#[derive(Debug, Clone, Copy)]
pub struct HttpTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

/// Build the HTTP client shared by the release feed and the downloader.
///
/// # Errors
/// Returns [`UpdateError::Http`] if the TLS backend cannot be initialised.
pub fn build_client(timeouts: HttpTimeouts) -> Result<reqwest::Client, UpdateError> {
    reqwest::Client::builder()
        .timeout(timeouts.request)
        .connect_timeout(timeouts.connect)
        .user_agent(format!("ocup/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|error| UpdateError::http_from("failed to build HTTP client", error))
}

/// Read access to a GitHub repository's releases.
pub struct ReleaseFeed {
    client: reqwest::Client,
    repo: String,
}

impl ReleaseFeed {
    pub fn new(client: reqwest::Client, repo: impl Into<String>) -> Self {
        Self {
            client,
            repo: repo.into(),
        }
    }

    #[must_use]
    pub fn latest_release_url(&self) -> String {
        format!("{API_BASE}/{}/releases/latest", self.repo)
    }

    #[must_use]
    pub fn releases_url(&self) -> String {
        format!("{API_BASE}/{}/releases", self.repo)
    }

    /// Fetch the newest published release.
    ///
    /// # Errors
    /// Returns [`UpdateError::Http`] on transport or status failures,
    /// [`UpdateError::Validation`] when the response is not a release, and
    /// [`UpdateError::Cancelled`] when `cancel` fires first.
    pub async fn fetch_latest(&self, cancel: &CancellationToken) -> Result<LatestRelease, UpdateError> {
        let body = self
            .get_text(&self.latest_release_url(), "fetch release information", cancel)
            .await?;
        LatestRelease::from_json(&body)
    }

    /// Fetch all releases that carry complete notes.
    ///
    /// # Errors
    /// Same as [`fetch_latest`](Self::fetch_latest).
    pub async fn fetch_release_notes(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReleaseNote>, UpdateError> {
        let body = self
            .get_text(&self.releases_url(), "fetch releases", cancel)
            .await?;
        parse_release_notes(&body)
    }

    async fn get_text(
        &self,
        url: &str,
        operation: &str,
        cancel: &CancellationToken,
    ) -> Result<String, UpdateError> {
        if !is_valid_download_url(url) {
            return Err(UpdateError::validation("Invalid GitHub API URL"));
        }
        debug!("GET {url}");

        let request = async {
            let response = self
                .client
                .get(url)
                .header("Accept", "application/vnd.github+json")
                .send()
                .await
                .map_err(|error| UpdateError::http_from(&format!("Failed to {operation}"), error))?;

            if !response.status().is_success() {
                let status = response.status();
                let body_snippet = response
                    .text()
                    .await
                    .ok()
                    .map(|body| response_snippet(&body, 160))
                    .unwrap_or_default();
                return Err(UpdateError::http(format!(
                    "Failed to {operation}: HTTP {status}{body_snippet}"
                )));
            }

            response
                .text()
                .await
                .map_err(|error| UpdateError::http_from(&format!("Failed to {operation}"), error))
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(UpdateError::Cancelled),
            result = request => result,
        }
    }
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;

    fn feed(repo: &str) -> ReleaseFeed {
        let client = build_client(HttpTimeouts {
            request: Duration::from_secs(5),
            connect: Duration::from_secs(5),
        })
        .expect("client should build");
        ReleaseFeed::new(client, repo)
    }

    #[test]
    fn urls_point_at_repository_releases() {
        let feed = feed(DEFAULT_REPO);
        assert_eq!(
            feed.latest_release_url(),
            "https://api.github.com/repos/sst/opencode/releases/latest"
        );
        assert_eq!(
            feed.releases_url(),
            "https://api.github.com/repos/sst/opencode/releases"
        );
    }

    #[test]
    fn response_snippet_is_prefixed_and_bounded() {
        assert_eq!(response_snippet("", 10), "");
        assert_eq!(response_snippet("rate limited", 4), ": rate");
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_request() {
        let feed = feed(DEFAULT_REPO);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = feed.fetch_latest(&cancel).await;

        assert!(matches!(result, Err(UpdateError::Cancelled)));
    }
}
