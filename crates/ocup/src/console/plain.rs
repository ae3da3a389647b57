use std::io::Write;

use ocup_core::{ConsoleOutput, ProgressReporter, ReleaseNote};

use super::{SilentProgress, note_heading, truncation_pointer};

/// Uncoloured line-oriented output for pipes, logs and dumb terminals.
pub struct PlainConsole {
    quiet: bool,
}

impl PlainConsole {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn line(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }
}

impl ConsoleOutput for PlainConsole {
    fn info(&self, message: &str) {
        self.line(message);
    }

    fn success(&self, message: &str) {
        self.line(message);
    }

    fn warning(&self, message: &str) {
        self.line(message);
    }

    fn error(&self, message: &str) {
        eprintln!("{message}");
    }

    fn version_info(&self, label: &str, version: &str) {
        self.line(&format!("{label}: {version}"));
    }

    fn release_notes(&self, notes: &[ReleaseNote]) {
        if self.quiet {
            return;
        }
        println!();
        println!("Release notes:");
        for note in notes {
            println!();
            println!("{}", note_heading(note));
            let (lines, truncated) = note.excerpt();
            for line in lines {
                println!("  {line}");
            }
            if truncated {
                println!("  {}", truncation_pointer(note));
            }
        }
        println!();
    }

    fn progress(&self, description: &str, _total_bytes: Option<u64>) -> Box<dyn ProgressReporter> {
        if self.quiet {
            return Box::new(SilentProgress);
        }
        println!("{description}...");
        Box::new(StepProgress::default())
    }
}

/// Prints a line every ten percent, or every 10 MiB when the size is unknown.
#[derive(Default)]
struct StepProgress {
    last_step: u64,
}

const UNKNOWN_SIZE_STEP: u64 = 10 * 1024 * 1024;

impl StepProgress {
    fn step_for(downloaded: u64, total: Option<u64>) -> u64 {
        match total {
            Some(total) if total > 0 => downloaded.saturating_mul(10) / total,
            _ => downloaded / UNKNOWN_SIZE_STEP,
        }
    }
}

impl ProgressReporter for StepProgress {
    fn update(&mut self, downloaded: u64, total: Option<u64>) {
        let step = Self::step_for(downloaded, total);
        if step <= self.last_step {
            return;
        }
        self.last_step = step;
        match total {
            Some(total) if total > 0 => println!("  {}% ({downloaded}/{total} bytes)", step * 10),
            _ => println!("  {downloaded} bytes"),
        }
        let _ = std::io::stdout().flush();
    }

    fn finish(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::StepProgress;

    #[test]
    fn steps_by_tenths_of_known_total() {
        assert_eq!(StepProgress::step_for(0, Some(1000)), 0);
        assert_eq!(StepProgress::step_for(99, Some(1000)), 0);
        assert_eq!(StepProgress::step_for(100, Some(1000)), 1);
        assert_eq!(StepProgress::step_for(1000, Some(1000)), 10);
    }

    #[test]
    fn steps_by_fixed_size_when_total_unknown() {
        assert_eq!(StepProgress::step_for(1024, None), 0);
        assert_eq!(StepProgress::step_for(25 * 1024 * 1024, None), 2);
        assert_eq!(StepProgress::step_for(5, Some(0)), 0);
    }
}
