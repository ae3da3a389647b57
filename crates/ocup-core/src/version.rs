//! Version parsing and ordering for release tags.
//!
//! Tags are compared as `major.minor.patch[-prerelease]` when both sides
//! parse that way. Anything else degrades to a dotted-number comparison and
//! finally to case-insensitive text comparison, so malformed tags still get
//! *an* order. That mixed relation is not guaranteed to be transitive.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static LOOSE_VERSION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[0-9]+\.[0-9]+\.[0-9]+").ok());

/// A `major.minor.patch` triple with an optional prerelease tag.
///
/// Ordering: numeric components first, then a release ranks above any
/// prerelease of the same triple, then prerelease tags compare
/// case-insensitively as text.
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a major.minor.patch version: {input}")]
pub struct VersionParseError {
    pub input: String,
}

impl SemanticVersion {
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: String::new(),
        }
    }

    #[must_use]
    pub fn with_prerelease(mut self, prerelease: impl Into<String>) -> Self {
        self.prerelease = prerelease.into();
        self
    }

    /// Strictly parse a tag such as `v1.2.3` or `1.2.3-beta.1`.
    ///
    /// A single leading `v`/`V` is ignored. Returns `None` for anything that
    /// is not exactly three numeric components plus an optional non-empty
    /// `-prerelease`.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        parse_strict(strip_v_prefix(tag))
    }

    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (self.is_prerelease(), other.is_prerelease()) {
                (false, false) => Ordering::Equal,
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                (true, true) => cmp_ignore_case(&self.prerelease, &other.prerelease),
            })
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.is_prerelease() {
            write!(f, "-{}", self.prerelease)?;
        }
        Ok(())
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| VersionParseError {
            input: s.to_string(),
        })
    }
}

/// Order two version tags. Never fails.
///
/// Both strict: semantic order. Otherwise dotted numbers (2 to 4
/// components, a missing component sorting below any present one). Otherwise
/// case-insensitive text.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = strip_v_prefix(a);
    let b = strip_v_prefix(b);

    if let (Some(left), Some(right)) = (parse_strict(a), parse_strict(b)) {
        return left.cmp(&right);
    }

    if let (Some(left), Some(right)) = (parse_dotted_tuple(a), parse_dotted_tuple(b)) {
        return left.cmp(&right);
    }

    cmp_ignore_case(a, b)
}

/// Whether `tag` looks like a version at all: strictly parseable, or
/// containing an `X.Y.Z` run somewhere.
#[must_use]
pub fn is_valid_version(tag: &str) -> bool {
    if tag.trim().is_empty() {
        return false;
    }
    let stripped = strip_v_prefix(tag);
    parse_strict(stripped).is_some() || find_version_triple(stripped).is_some()
}

/// First `digits.digits.digits` run inside `text`, if any.
#[must_use]
pub fn find_version_triple(text: &str) -> Option<&str> {
    LOOSE_VERSION
        .as_ref()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str())
}

fn strip_v_prefix(tag: &str) -> &str {
    tag.strip_prefix(['v', 'V']).unwrap_or(tag)
}

fn parse_strict(s: &str) -> Option<SemanticVersion> {
    let (core, prerelease) = match s.split_once('-') {
        Some((core, prerelease)) => (core, prerelease),
        None => (s, ""),
    };
    if s.contains('-') && (prerelease.is_empty() || prerelease.contains('\n')) {
        return None;
    }

    let mut parts = core.split('.');
    let major = parse_component(parts.next()?)?;
    let minor = parse_component(parts.next()?)?;
    let patch = parse_component(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }

    Some(SemanticVersion::new(major, minor, patch).with_prerelease(prerelease))
}

fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn parse_dotted_tuple(s: &str) -> Option<[Option<u64>; 4]> {
    let mut components = [None; 4];
    let mut count = 0;

    for part in s.split('.') {
        if count == components.len() {
            return None;
        }
        components[count] = Some(parse_component(part)?);
        count += 1;
    }

    (count >= 2).then_some(components)
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
