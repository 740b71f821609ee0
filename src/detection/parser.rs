//! Version extraction from free-form tool output.

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// A dotted version number pulled out of a tool's output.
///
/// Only `major` is guaranteed; `minor` and `patch` are `None` when the
/// matched text had fewer groups (`"v2"`, `"4.1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VersionInfo {
    /// The substring that matched, including a leading `v` tag if present.
    pub raw: String,
    pub major: u64,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
}

impl VersionInfo {
    /// Major number under the legacy `1.x` scheme some runtimes used,
    /// where `1.8.0` denotes release 8.
    ///
    /// Versions that do not start with `1.` are returned unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use env_doctor::extract_version;
    ///
    /// let legacy = extract_version("java version \"1.8.0_292\"").unwrap();
    /// assert_eq!(legacy.legacy_major(), 8);
    ///
    /// let modern = extract_version("openjdk 21.0.2 2024-01-16").unwrap();
    /// assert_eq!(modern.legacy_major(), 21);
    /// ```
    pub fn legacy_major(&self) -> u64 {
        match (self.major, self.minor) {
            (1, Some(minor)) => minor,
            (major, _) => major,
        }
    }

    /// `(major, minor, patch)` with missing components as 0.
    pub fn components(&self) -> (u64, u64, u64) {
        (self.major, self.minor.unwrap_or(0), self.patch.unwrap_or(0))
    }

    /// Numeric comparison; `"2"` and `"2.0.0"` compare equal.
    ///
    /// ```rust
    /// use env_doctor::extract_version;
    /// use std::cmp::Ordering;
    ///
    /// let a = extract_version("2.43.0").unwrap();
    /// let b = extract_version("2.9").unwrap();
    /// assert_eq!(a.compare(&b), Ordering::Greater);
    /// ```
    pub fn compare(&self, other: &VersionInfo) -> Ordering {
        self.components().cmp(&other.components())
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{minor}")?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        Ok(())
    }
}

fn version_regex() -> &'static Regex {
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();
    VERSION_RE.get_or_init(|| {
        Regex::new(r"[vV]?(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("Invalid version regex")
    })
}

/// Extract the first version number that appears in `text`.
///
/// The first match wins, so a tool's own banner (`git version 2.43.0`) is
/// preferred over numbers printed further down. Returns `None` when the text
/// contains no digits at all.
///
/// # Example
///
/// ```rust
/// use env_doctor::extract_version;
///
/// let v = extract_version("Docker version 25.0.3, build 4debf41").unwrap();
/// assert_eq!((v.major, v.minor, v.patch), (25, Some(0), Some(3)));
/// assert!(extract_version("no version here").is_none());
/// ```
pub fn extract_version(text: &str) -> Option<VersionInfo> {
    let caps = version_regex().captures(text)?;
    let group = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());

    Some(VersionInfo {
        raw: caps.get(0)?.as_str().to_string(),
        major: group(1).unwrap_or(0),
        minor: group(2),
        patch: group(3),
    })
}

/// Major number of a version string, never failing.
///
/// Non-digit characters before the first dot are dropped (`"v25.1"` -> 25);
/// an empty or unparseable string yields 0.
pub fn major_of(version: &str) -> u64 {
    let head = match version.find('.') {
        Some(dot) if dot > 0 => &version[..dot],
        _ => version,
    };
    let digits: String = head.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
