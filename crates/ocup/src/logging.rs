#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ocup_platform::AppPaths;

/// `debug.log` as seen by the file logger.
///
/// The size cap is applied once when the log is opened. If the file
/// disappears mid-run the next write recreates it.
struct RunLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl RunLog {
    fn open(path: PathBuf, max_size: u64) -> io::Result<Self> {
        cap_log_size(&path, max_size)?;
        let file = append_to(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
        })
    }

    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut slot = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if slot.is_none() || !self.path.exists() {
            *slot = Some(append_to(&self.path)?);
        }
        match slot.as_mut() {
            Some(file) => op(file),
            None => Err(io::Error::other("debug log is not open")),
        }
    }
}

impl Write for RunLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(File::flush)
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Drop the older half of an oversized log, starting at a line boundary.
fn cap_log_size(path: &Path, max_size: u64) -> io::Result<()> {
    let len = match std::fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };
    if len <= max_size {
        return Ok(());
    }
    let contents = std::fs::read(path)?;
    std::fs::write(path, newer_half(&contents))
}

fn newer_half(contents: &[u8]) -> &[u8] {
    let half = contents.len() / 2;
    let start = contents[half..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(half, |pos| half + pos + 1);
    &contents[start..]
}

fn level_for(debug_enabled: bool) -> LevelFilter {
    if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Route `log` records into `debug.log` in the data directory (and stderr
/// in debug builds). A log that cannot be opened leaves the run unlogged.
pub fn init_logging(debug_enabled: bool, max_log_size: u64) {
    let Ok(paths) = AppPaths::new() else {
        return;
    };
    let log_path = paths.log_file();
    let level = level_for(debug_enabled);
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("ocup")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));
    match RunLog::open(log_path.clone(), max_log_size) {
        Ok(run_log) => loggers.push(WriteLogger::new(level, config, run_log)),
        Err(error) => eprintln!("ocup: cannot open {}: {error}", log_path.display()),
    }

    let _ = CombinedLogger::init(loggers);
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use simplelog::LevelFilter;

    use super::{RunLog, cap_log_size, level_for, newer_half};

    #[test]
    fn run_log_recreates_deleted_file() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("debug.log");
        let mut log = RunLog::open(log_path.clone(), 1024).expect("log should open");

        log.write_all(b"checking opencode\n")
            .expect("initial write should succeed");
        std::fs::remove_file(&log_path).expect("log file should be removable");
        log.write_all(b"downloading\n")
            .expect("write after deletion should succeed");

        assert_eq!(
            std::fs::read_to_string(&log_path).expect("log should be readable"),
            "downloading\n"
        );
    }

    #[test]
    fn run_log_creates_missing_data_directory() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("data").join("ocup").join("debug.log");

        let mut log = RunLog::open(log_path.clone(), 1024).expect("log should open");
        log.write_all(b"started\n").expect("write should succeed");

        assert!(log_path.is_file());
    }

    #[test]
    fn oversized_log_is_capped_on_open() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("debug.log");
        std::fs::write(&log_path, "run-1\nrun-2\nrun-3\nrun-4\nrun-5\n")
            .expect("test log file should be written");

        cap_log_size(&log_path, 10).expect("log should be capped");

        let capped = std::fs::read_to_string(&log_path).expect("log should be readable");
        assert!(capped.starts_with("run-3\n") || capped.starts_with("run-4\n"));
        assert!(!capped.contains("run-1"));
    }

    #[test]
    fn small_or_missing_log_is_left_alone() {
        let temp_dir = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp_dir.path().join("debug.log");

        cap_log_size(&log_path, 10).expect("missing log is not an error");
        assert!(!log_path.exists());

        std::fs::write(&log_path, "run-1\n").expect("test log file should be written");
        cap_log_size(&log_path, 1024).expect("small log is kept");
        assert_eq!(
            std::fs::read_to_string(&log_path).expect("log should be readable"),
            "run-1\n"
        );
    }

    #[test]
    fn newer_half_starts_after_a_newline() {
        assert_eq!(newer_half(b"aaaa\nbb\ncc\n"), b"cc\n");
        assert_eq!(newer_half(b"no newline at all"), b"ne at all");
        assert_eq!(newer_half(b""), b"");
    }

    #[test]
    fn verbose_switches_to_debug_level() {
        assert_eq!(level_for(true), LevelFilter::Debug);
        assert_eq!(level_for(false), LevelFilter::Info);
    }
}
