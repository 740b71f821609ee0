//! Search-path augmentation for spawned children.

use crate::env::EnvSnapshot;
use crate::tool_kind::MAVEN_HOME_VARS;
use std::path::Path;

/// Separator between search-path entries on this platform.
#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';

/// Well-known installation directories that are often missing from the
/// search path an IDE or CI agent hands to its children.
#[cfg(windows)]
const WELL_KNOWN_DIRS: &[&str] = &[
    r"C:\Program Files\Docker\Docker\resources\bin",
    r"C:\Program Files\Git\bin",
];
#[cfg(target_os = "macos")]
const WELL_KNOWN_DIRS: &[&str] = &[
    "/usr/local/bin",
    "/usr/bin",
    "/opt/homebrew/bin",
    "/Applications/Docker.app/Contents/Resources/bin",
];
#[cfg(not(any(windows, target_os = "macos")))]
const WELL_KNOWN_DIRS: &[&str] = &["/usr/local/bin", "/usr/bin"];

/// Computes the search path handed to each child process.
///
/// The resolver only ever prepends: entries already on the path keep their
/// position, and a directory already present (compared case-insensitively)
/// is not added a second time.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    extra_dirs: Vec<String>,
}

impl PathResolver {
    /// Resolver for this platform: the well-known directories plus the
    /// build tool's `bin` directory when an installation root is set.
    pub fn from_env(env: &EnvSnapshot) -> Self {
        let mut extra_dirs: Vec<String> = WELL_KNOWN_DIRS.iter().map(|d| d.to_string()).collect();
        if let Some((_, root)) = env.first_non_empty(MAVEN_HOME_VARS) {
            let bin = Path::new(root.trim()).join("bin");
            extra_dirs.push(bin.to_string_lossy().into_owned());
        }
        Self { extra_dirs }
    }

    /// Resolver with an explicit list of directories to prepend.
    pub fn with_dirs<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extra_dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Directories this resolver prepends, in order.
    pub fn extra_dirs(&self) -> &[String] {
        &self.extra_dirs
    }

    /// Return `base` with every missing extra directory prepended.
    ///
    /// Applying this twice gives the same result as applying it once.
    ///
    /// # Example
    ///
    /// ```rust
    /// use env_doctor::PathResolver;
    ///
    /// let resolver = PathResolver::with_dirs(["/opt/tool/bin"]);
    /// let sep = env_doctor::PATH_SEPARATOR;
    /// let base = format!("/usr/bin{sep}/bin");
    /// let once = resolver.augment(&base);
    /// assert_eq!(once, format!("/opt/tool/bin{sep}/usr/bin{sep}/bin"));
    /// assert_eq!(resolver.augment(&once), once);
    /// ```
    pub fn augment(&self, base: &str) -> String {
        let existing: Vec<&str> = if base.is_empty() {
            Vec::new()
        } else {
            base.split(PATH_SEPARATOR).collect()
        };

        let mut prepended: Vec<&str> = Vec::new();
        for dir in &self.extra_dirs {
            if dir.trim().is_empty() {
                continue;
            }
            let already = existing
                .iter()
                .chain(prepended.iter())
                .any(|entry| same_entry(entry, dir));
            if !already {
                prepended.push(dir);
            }
        }

        if prepended.is_empty() {
            return base.to_string();
        }

        let separator = PATH_SEPARATOR.to_string();
        let mut path = prepended.join(separator.as_str());
        if !base.is_empty() {
            path.push(PATH_SEPARATOR);
            path.push_str(base);
        }
        path
    }
}

fn same_entry(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Augment `base` using the platform resolver built from `env`.
pub fn augmented_search_path(base: &str, env: &EnvSnapshot) -> String {
    PathResolver::from_env(env).augment(base)
}
