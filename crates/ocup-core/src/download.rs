use std::path::Path;

use futures_util::StreamExt;
use log::{debug, info};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::error::{FileError, UpdateError};
use crate::output::ProgressReporter;
use crate::release::is_valid_download_url;

/// Stream `url` into `dest`, reporting progress after every chunk.
///
/// Returns the number of bytes written. On any failure the partially written
/// file is left for the caller to clean up along with its directory.
///
/// # Errors
/// Returns [`UpdateError::Validation`] for a bad URL, [`UpdateError::Http`]
/// for transport or status failures, [`UpdateError::File`] when `dest`
/// cannot be written, and [`UpdateError::Cancelled`] if `cancel` fires.
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: &mut dyn ProgressReporter,
    cancel: &CancellationToken,
) -> Result<u64, UpdateError> {
    if !is_valid_download_url(url) {
        return Err(UpdateError::validation("Invalid download URL"));
    }

    let transfer = stream_to_file(client, url, dest, progress);
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(UpdateError::Cancelled),
        result = transfer => result,
    };
    progress.finish();
    result
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress: &mut dyn ProgressReporter,
) -> Result<u64, UpdateError> {
    debug!("Downloading {url} to {}", dest.display());
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| UpdateError::http_from("Download request failed", error))?;

    if !response.status().is_success() {
        return Err(UpdateError::http(format!(
            "Download failed with status {}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut downloaded: u64 = 0;
    progress.update(downloaded, total);

    let mut file = tokio::fs::File::create(dest).await.map_err(|error| {
        FileError::io_with_path("failed to create download file", dest, &error)
    })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|error| UpdateError::http_from("Download stream error", error))?;
        file.write_all(&chunk).await.map_err(|error| {
            FileError::io_with_path("failed to write download data", dest, &error)
        })?;
        downloaded += chunk.len() as u64;
        progress.update(downloaded, total);
    }

    file.flush().await.map_err(|error| {
        FileError::io_with_path("failed to flush download file", dest, &error)
    })?;

    info!("Download complete: {downloaded} bytes");
    Ok(downloaded)
}
