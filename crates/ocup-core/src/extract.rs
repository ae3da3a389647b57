//! Unpacking a downloaded build without letting any entry escape the target
//! directory.
//!
//! Each entry path is checked twice: lexically (no `..` segment, not
//! absolute) and again after resolving it against the canonical target root,
//! which catches symlinked directories that already exist on disk. Unsafe
//! entries are skipped and reported; only real I/O or archive corruption
//! aborts the run. Files written before an abort stay on disk.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor, Read, Seek};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, warn};

use crate::error::FileError;

const S_IFMT: u32 = 0o170_000;
const S_IFLNK: u32 = 0o120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// Detect the archive format from a file name (case-insensitive).
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

/// Why an entry was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ParentTraversal,
    AbsolutePath,
    OutsideRoot,
    Link,
    EmptyPath,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParentTraversal => write!(f, "contains a '..' segment"),
            Self::AbsolutePath => write!(f, "is an absolute path"),
            Self::OutsideRoot => write!(f, "resolves outside the extraction directory"),
            Self::Link => write!(f, "is a link or would be written through one"),
            Self::EmptyPath => write!(f, "has no file name"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: SkipReason,
}

/// What an extraction did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Written files, relative to the extraction root.
    pub extracted: Vec<PathBuf>,
    pub skipped: Vec<SkippedEntry>,
}

impl ExtractionReport {
    fn skip(&mut self, path: &str, reason: SkipReason) {
        warn!("Skipping potentially unsafe archive entry {path:?}: {reason}");
        self.skipped.push(SkippedEntry {
            path: path.to_string(),
            reason,
        });
    }
}

/// Extract the archive at `archive_path` into `target_root`, choosing the
/// format from the file name.
///
/// # Errors
/// Returns [`FileError`] when the format is unsupported, the archive is
/// corrupt, or writing to disk fails.
pub fn extract_archive(archive_path: &Path, target_root: &Path) -> Result<ExtractionReport, FileError> {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = ArchiveKind::from_file_name(&name)
        .ok_or_else(|| FileError::UnsupportedArchive { name: name.clone() })?;

    let file = File::open(archive_path)
        .map_err(|error| FileError::io_with_path("failed to open archive", archive_path, &error))?;
    extract_from_reader(BufReader::new(file), kind, target_root)
}

/// Extract an in-memory archive into `target_root`.
///
/// # Errors
/// Same as [`extract_archive`].
pub fn extract_archive_bytes(
    bytes: &[u8],
    kind: ArchiveKind,
    target_root: &Path,
) -> Result<ExtractionReport, FileError> {
    extract_from_reader(Cursor::new(bytes), kind, target_root)
}

fn extract_from_reader<R: Read + Seek>(
    reader: R,
    kind: ArchiveKind,
    target_root: &Path,
) -> Result<ExtractionReport, FileError> {
    fs::create_dir_all(target_root).map_err(|error| {
        FileError::io_with_path("failed to create extraction directory", target_root, &error)
    })?;
    let root = fs::canonicalize(target_root).map_err(|error| {
        FileError::io_with_path("failed to resolve extraction directory", target_root, &error)
    })?;

    let mut report = ExtractionReport::default();
    match kind {
        ArchiveKind::Zip => extract_zip(reader, &root, &mut report)?,
        ArchiveKind::TarGz => extract_tar_gz(reader, &root, &mut report)?,
    }

    debug!(
        "Extracted {} entries to {} ({} skipped)",
        report.extracted.len(),
        root.display(),
        report.skipped.len()
    );
    Ok(report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
    Link,
}

fn extract_zip<R: Read + Seek>(
    reader: R,
    root: &Path,
    report: &mut ExtractionReport,
) -> Result<(), FileError> {
    let mut archive = zip::ZipArchive::new(reader)
        .map_err(|error| FileError::zip("failed to read zip archive", error))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|error| FileError::zip("failed to read zip entry", error))?;
        let name = entry.name().to_string();
        let mode = entry.unix_mode();
        let kind = if entry.is_dir() {
            EntryKind::Directory
        } else if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            EntryKind::Link
        } else {
            EntryKind::File
        };

        unpack_entry(root, &name, kind, mode, &mut entry, report)?;
    }

    Ok(())
}

fn extract_tar_gz<R: Read>(
    reader: R,
    root: &Path,
    report: &mut ExtractionReport,
) -> Result<(), FileError> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let entries = archive
        .entries()
        .map_err(|error| FileError::io("failed to read tar archive", error))?;

    for entry in entries {
        let mut entry = entry.map_err(|error| FileError::io("failed to read tar entry", error))?;
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let header = entry.header();
        let entry_type = header.entry_type();
        let mode = header.mode().ok();
        let kind = if entry_type.is_dir() {
            EntryKind::Directory
        } else if entry_type.is_symlink() || entry_type.is_hard_link() {
            EntryKind::Link
        } else if entry_type.is_file() {
            EntryKind::File
        } else {
            debug!("Ignoring tar entry {name:?} of type {entry_type:?}");
            continue;
        };

        unpack_entry(root, &name, kind, mode, &mut entry, report)?;
    }

    Ok(())
}

/// Write one archive entry below `root` (already canonical), or record why
/// it was skipped.
fn unpack_entry(
    root: &Path,
    raw_name: &str,
    kind: EntryKind,
    mode: Option<u32>,
    contents: &mut dyn Read,
    report: &mut ExtractionReport,
) -> Result<(), FileError> {
    let name = raw_name.replace('\\', "/");
    if kind == EntryKind::Directory || name.ends_with('/') {
        return Ok(());
    }

    let relative = match sanitize_entry_path(&name) {
        Ok(relative) => relative,
        Err(reason) => {
            report.skip(&name, reason);
            return Ok(());
        }
    };

    if kind == EntryKind::Link
        || fs::symlink_metadata(root.join(&relative)).is_ok_and(|m| m.file_type().is_symlink())
    {
        report.skip(&name, SkipReason::Link);
        return Ok(());
    }

    let Some(destination) = resolve_within(root, &relative)
        .map_err(|error| FileError::io_with_path("failed to resolve entry path", &relative, &error))?
    else {
        report.skip(&name, SkipReason::OutsideRoot);
        return Ok(());
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|error| {
            FileError::io_with_path("failed to create extraction parent directory", parent, &error)
        })?;
        let parent_resolved = fs::canonicalize(parent).map_err(|error| {
            FileError::io_with_path("failed to resolve extraction parent directory", parent, &error)
        })?;
        if !parent_resolved.starts_with(root) {
            report.skip(&name, SkipReason::OutsideRoot);
            return Ok(());
        }
    }

    let mut output = File::create(&destination).map_err(|error| {
        FileError::io_with_path("failed to create extracted file", &destination, &error)
    })?;
    io::copy(contents, &mut output).map_err(|error| {
        FileError::io_with_path("failed to extract archive entry", &destination, &error)
    })?;
    drop(output);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            let _ = fs::set_permissions(&destination, fs::Permissions::from_mode(mode & 0o777));
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    report.extracted.push(relative);
    Ok(())
}

/// Lexical checks on a `/`-separated entry name.
///
/// Names that normalize to nothing, such as `.`, are rejected as
/// [`SkipReason::EmptyPath`].
fn sanitize_entry_path(name: &str) -> Result<PathBuf, SkipReason> {
    if name.starts_with('/') || has_drive_prefix(name) {
        return Err(SkipReason::AbsolutePath);
    }

    let mut relative = PathBuf::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(SkipReason::ParentTraversal),
            _ => relative.push(segment),
        }
    }

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(SkipReason::AbsolutePath);
    }

    if relative.as_os_str().is_empty() {
        return Err(SkipReason::EmptyPath);
    }
    Ok(relative)
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Join `relative` onto the canonical `root` and resolve every part of the
/// result that already exists (following symlinks). Returns `None` when the
/// resolved path is not `root` or below it, or when it runs through a
/// dangling symlink.
fn resolve_within(root: &Path, relative: &Path) -> io::Result<Option<PathBuf>> {
    let candidate = root.join(relative);
    let mut existing = candidate.as_path();
    let mut missing = Vec::new();

    loop {
        match fs::symlink_metadata(existing) {
            Ok(_) => break,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Ok(None);
                };
                missing.push(name.to_os_string());
                existing = parent;
            }
            Err(error) => return Err(error),
        }
    }

    let mut resolved = match fs::canonicalize(existing) {
        Ok(resolved) => resolved,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error),
    };
    for name in missing.iter().rev() {
        resolved.push(name);
    }

    Ok(resolved.starts_with(root).then_some(resolved))
}
