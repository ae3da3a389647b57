//! Release notes between the installed and the target version.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;

use crate::error::UpdateError;
use crate::version::compare_versions;

/// How many non-blank body lines a renderer shows before truncating.
pub const MAX_NOTE_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNote {
    pub version: String,
    pub title: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
    pub detail_url: String,
}

impl ReleaseNote {
    /// The first [`MAX_NOTE_LINES`] non-blank, trimmed body lines, and whether
    /// anything was cut off.
    #[must_use]
    pub fn excerpt(&self) -> (Vec<&str>, bool) {
        let mut lines = self
            .body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty());
        let shown: Vec<&str> = lines.by_ref().take(MAX_NOTE_LINES).collect();
        (shown, lines.next().is_some())
    }
}

#[derive(Deserialize)]
struct RawReleaseNote {
    tag_name: Option<String>,
    name: Option<String>,
    body: Option<String>,
    published_at: Option<String>,
    html_url: Option<String>,
}

impl RawReleaseNote {
    fn into_note(self) -> Option<ReleaseNote> {
        let published_at = DateTime::parse_from_rfc3339(non_blank(self.published_at)?.trim())
            .ok()?
            .with_timezone(&Utc);

        Some(ReleaseNote {
            version: non_blank(self.tag_name)?,
            title: non_blank(self.name)?,
            body: non_blank(self.body)?,
            published_at,
            detail_url: non_blank(self.html_url)?,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decode the release list, dropping every element that lacks a required
/// field or carries an unparseable `published_at`.
///
/// # Errors
/// Returns [`UpdateError::Validation`] only when the body is not a JSON array.
pub fn parse_release_notes(body: &str) -> Result<Vec<ReleaseNote>, UpdateError> {
    let elements: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|error| UpdateError::validation(format!("Invalid JSON response: {error}")))?;
    let total = elements.len();

    let notes: Vec<ReleaseNote> = elements
        .into_iter()
        .filter_map(|element| serde_json::from_value::<RawReleaseNote>(element).ok())
        .filter_map(RawReleaseNote::into_note)
        .collect();

    if notes.len() < total {
        debug!(
            "Dropped {} incomplete release entries out of {total}",
            total - notes.len()
        );
    }
    Ok(notes)
}

/// Notes newer than `current` and no newer than `latest`, newest first.
///
/// Without a current version there is nothing to diff against and the
/// result is empty.
#[must_use]
pub fn release_notes_window<I>(notes: I, current: Option<&str>, latest: &str) -> Vec<ReleaseNote>
where
    I: IntoIterator<Item = ReleaseNote>,
{
    let Some(current) = current.filter(|c| !c.trim().is_empty()) else {
        return Vec::new();
    };

    let mut window: Vec<ReleaseNote> = Vec::new();
    for note in notes {
        if compare_versions(&note.version, latest) == Ordering::Greater
            || compare_versions(&note.version, current) != Ordering::Greater
        {
            continue;
        }
        // Insertion keeps this panic-free when the fallback ordering of
        // malformed tags is not transitive.
        let position = window
            .iter()
            .position(|existing| compare_versions(&note.version, &existing.version) == Ordering::Greater)
            .unwrap_or(window.len());
        window.insert(position, note);
    }
    window
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn note(version: &str) -> ReleaseNote {
        ReleaseNote {
            version: version.to_string(),
            title: format!("Release {version}"),
            body: "- fixes".to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            detail_url: format!("https://github.com/sst/opencode/releases/tag/{version}"),
        }
    }

    fn versions(notes: &[ReleaseNote]) -> Vec<&str> {
        notes.iter().map(|n| n.version.as_str()).collect()
    }

    #[test]
    fn window_excludes_current_and_includes_latest() {
        let notes = ["1.0.0", "1.1.0", "1.2.0", "1.3.0"].map(note);

        let window = release_notes_window(notes, Some("1.0.0"), "1.2.0");

        assert_eq!(versions(&window), ["1.2.0", "1.1.0"]);
    }

    #[test]
    fn window_is_sorted_newest_first_regardless_of_input_order() {
        let notes = ["v0.3.1", "v0.5.0", "v0.3.10", "v0.4.0-beta", "v0.4.0"].map(note);

        let window = release_notes_window(notes, Some("0.3.0"), "v0.5.0");

        assert_eq!(
            versions(&window),
            ["v0.5.0", "v0.4.0", "v0.4.0-beta", "v0.3.10", "v0.3.1"]
        );
    }

    #[test]
    fn missing_current_version_yields_nothing() {
        let notes = ["1.1.0", "1.2.0"].map(note);

        assert!(release_notes_window(notes.clone(), None, "1.2.0").is_empty());
        assert!(release_notes_window(notes, Some("  "), "1.2.0").is_empty());
    }

    #[test]
    fn nothing_between_equal_versions() {
        let notes = ["1.0.0", "1.1.0"].map(note);
        assert!(release_notes_window(notes, Some("1.1.0"), "1.1.0").is_empty());
    }

    #[test]
    fn malformed_tags_do_not_panic() {
        let notes = ["nightly", "1.1.0", "Zeta", "1.2", "1.0.5-rc"].map(note);

        let window = release_notes_window(notes, Some("1.0.0"), "1.2.0");

        assert!(window.iter().any(|n| n.version == "1.1.0"));
        assert!(window.iter().all(|n| n.version != "nightly"));
    }

    #[test]
    fn parse_drops_incomplete_entries() {
        let body = json!([
            {
                "tag_name": "v1.1.0",
                "name": "v1.1.0",
                "body": "Added things",
                "published_at": "2025-03-01T12:00:00Z",
                "html_url": "https://github.com/sst/opencode/releases/tag/v1.1.0"
            },
            {
                "tag_name": "v1.0.9",
                "name": "v1.0.9",
                "published_at": "2025-02-01T12:00:00Z",
                "html_url": "https://github.com/sst/opencode/releases/tag/v1.0.9"
            },
            {
                "tag_name": "v1.0.8",
                "name": "v1.0.8",
                "body": "  ",
                "published_at": "2025-01-01T12:00:00Z",
                "html_url": "https://github.com/sst/opencode/releases/tag/v1.0.8"
            },
            {
                "tag_name": "v1.0.7",
                "name": "v1.0.7",
                "body": "notes",
                "published_at": "yesterday",
                "html_url": "https://github.com/sst/opencode/releases/tag/v1.0.7"
            },
            {
                "tag_name": "v1.0.6",
                "name": null,
                "body": "notes",
                "published_at": "2024-12-01T12:00:00Z",
                "html_url": "https://github.com/sst/opencode/releases/tag/v1.0.6"
            },
            42
        ])
        .to_string();

        let notes = parse_release_notes(&body).expect("array should parse");

        assert_eq!(notes.len(), 1);
        let note = &notes[0];
        assert_eq!(note.version, "v1.1.0");
        assert_eq!(note.title, "v1.1.0");
        assert_eq!(note.body, "Added things");
        assert_eq!(
            note.published_at,
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(
            note.detail_url,
            "https://github.com/sst/opencode/releases/tag/v1.1.0"
        );
    }

    #[test]
    fn parse_converts_offsets_to_utc() {
        let body = json!([{
            "tag_name": "v2.0.0",
            "name": "Two",
            "body": "b",
            "published_at": "2025-06-01T02:00:00+02:00",
            "html_url": "https://example.com/v2"
        }])
        .to_string();

        let notes = parse_release_notes(&body).expect("array should parse");
        assert_eq!(
            notes[0].published_at,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn parse_rejects_non_array_body() {
        assert!(matches!(
            parse_release_notes(r#"{"message": "rate limited"}"#),
            Err(UpdateError::Validation(_))
        ));
    }

    #[test]
    fn excerpt_truncates_after_ten_lines() {
        let mut long = note("1.0.0");
        long.body = (1..=12).map(|i| format!("  line {i}  \n\n")).collect();

        let (lines, truncated) = long.excerpt();

        assert_eq!(lines.len(), MAX_NOTE_LINES);
        assert_eq!(lines[0], "line 1");
        assert!(truncated);

        let short = note("1.0.1");
        let (lines, truncated) = short.excerpt();
        assert_eq!(lines, ["- fixes"]);
        assert!(!truncated);
    }
}
