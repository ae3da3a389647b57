//! Terminal renderers for [`ConsoleOutput`].

mod plain;
mod styled;

use std::io::IsTerminal;
use std::sync::Arc;

use ocup_core::{ConsoleOutput, ProgressReporter, ReleaseNote};

pub use plain::PlainConsole;
pub use styled::StyledConsole;

/// Styled output on an interactive terminal, plain text otherwise or when
/// `NO_COLOR` / `TERM=dumb` ask for it.
pub fn select_console(quiet: bool) -> Arc<dyn ConsoleOutput> {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    let dumb = std::env::var("TERM").is_ok_and(|term| term == "dumb");

    if wants_styled(std::io::stdout().is_terminal(), no_color, dumb) {
        Arc::new(StyledConsole::new(quiet))
    } else {
        Arc::new(PlainConsole::new(quiet))
    }
}

fn wants_styled(is_terminal: bool, no_color: bool, dumb_terminal: bool) -> bool {
    is_terminal && !no_color && !dumb_terminal
}

/// Heading line for one release note: version and publish date.
fn note_heading(note: &ReleaseNote) -> String {
    format!(
        "{} ({})",
        note.version,
        note.published_at.format("%Y-%m-%d")
    )
}

fn truncation_pointer(note: &ReleaseNote) -> String {
    format!("... (see full notes at {})", note.detail_url)
}

/// Reporter handed out in quiet mode.
struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn update(&mut self, _downloaded: u64, _total: Option<u64>) {}

    fn finish(&mut self) {}
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn note() -> ReleaseNote {
        ReleaseNote {
            version: "v0.6.0".to_string(),
            title: "v0.6.0".to_string(),
            body: "- new things".to_string(),
            published_at: Utc
                .with_ymd_and_hms(2025, 7, 4, 18, 30, 0)
                .single()
                .expect("valid timestamp"),
            detail_url: "https://github.com/sst/opencode/releases/tag/v0.6.0".to_string(),
        }
    }

    #[test]
    fn styled_only_on_capable_terminal() {
        assert!(wants_styled(true, false, false));
        assert!(!wants_styled(false, false, false));
        assert!(!wants_styled(true, true, false));
        assert!(!wants_styled(true, false, true));
    }

    #[test]
    fn heading_shows_version_and_date() {
        assert_eq!(note_heading(&note()), "v0.6.0 (2025-07-04)");
    }

    #[test]
    fn truncation_points_at_detail_url() {
        assert_eq!(
            truncation_pointer(&note()),
            "... (see full notes at https://github.com/sst/opencode/releases/tag/v0.6.0)"
        );
    }
}
