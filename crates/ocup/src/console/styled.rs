use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use ocup_core::{ConsoleOutput, ProgressReporter, ReleaseNote};

use super::{SilentProgress, note_heading, truncation_pointer};

pub struct StyledConsole {
    quiet: bool,
}

impl StyledConsole {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ConsoleOutput for StyledConsole {
    fn info(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.cyan());
        }
    }

    fn success(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.green());
        }
    }

    fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.yellow());
        }
    }

    fn error(&self, message: &str) {
        eprintln!("{}", message.red().bold());
    }

    fn version_info(&self, label: &str, version: &str) {
        if !self.quiet {
            println!("{}: {}", label.cyan(), version.bold());
        }
    }

    fn release_notes(&self, notes: &[ReleaseNote]) {
        if self.quiet {
            return;
        }
        println!();
        println!("{}", "Release notes".bold().underline());
        for note in notes {
            println!();
            println!("{}", note_heading(note).magenta().bold());
            let (lines, truncated) = note.excerpt();
            for line in lines {
                println!("  {line}");
            }
            if truncated {
                println!("  {}", truncation_pointer(note).dimmed());
            }
        }
        println!();
    }

    fn progress(&self, description: &str, total_bytes: Option<u64>) -> Box<dyn ProgressReporter> {
        if self.quiet {
            return Box::new(SilentProgress);
        }
        let bar = total_bytes.map_or_else(ProgressBar::new_spinner, ProgressBar::new);
        bar.set_style(style_for(total_bytes.is_some()));
        bar.set_prefix(description.to_string());
        Box::new(BarProgress {
            bar,
            sized: total_bytes.is_some(),
        })
    }
}

fn style_for(sized: bool) -> ProgressStyle {
    if sized {
        ProgressStyle::with_template(
            "{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("━╸━"))
    } else {
        ProgressStyle::with_template("{prefix:.bold.cyan} {spinner:.cyan} {bytes}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

struct BarProgress {
    bar: ProgressBar,
    sized: bool,
}

impl ProgressReporter for BarProgress {
    fn update(&mut self, downloaded: u64, total: Option<u64>) {
        if let Some(total) = total
            && !self.sized
        {
            self.bar.set_length(total);
            self.bar.set_style(style_for(true));
            self.sized = true;
        }
        self.bar.set_position(downloaded);
        if !self.sized {
            self.bar.tick();
        }
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use indicatif::{ProgressBar, ProgressDrawTarget};

    use super::BarProgress;
    use ocup_core::ProgressReporter;

    #[test]
    fn spinner_becomes_bar_once_length_is_known() {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        let mut progress = BarProgress { bar, sized: false };

        progress.update(10, None);
        assert_eq!(progress.bar.length(), None);

        progress.update(20, Some(100));
        assert!(progress.sized);
        assert_eq!(progress.bar.length(), Some(100));
        assert_eq!(progress.bar.position(), 20);

        progress.finish();
        assert!(progress.bar.is_finished());
    }
}
