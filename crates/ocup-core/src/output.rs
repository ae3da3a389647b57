use crate::notes::ReleaseNote;

/// Everything the updater says to the user goes through this trait, so the
/// binary can pick a renderer (styled or plain) at startup.
///
/// Implementations own their quiet-mode flag: in quiet mode only
/// [`error`](ConsoleOutput::error) produces output.
pub trait ConsoleOutput: Send + Sync {
    fn info(&self, message: &str);
    fn success(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    fn version_info(&self, label: &str, version: &str);
    fn release_notes(&self, notes: &[ReleaseNote]);
    fn progress(&self, description: &str, total_bytes: Option<u64>) -> Box<dyn ProgressReporter>;
}

/// Byte-level progress for one download.
pub trait ProgressReporter: Send {
    /// `total` is `None` while the server has not announced a length.
    fn update(&mut self, downloaded: u64, total: Option<u64>);
    fn finish(&mut self);
}
