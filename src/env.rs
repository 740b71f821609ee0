//! Read-only view of the environment variables detection depends on.

use std::collections::HashMap;
use std::path::PathBuf;

/// Name of the search-path variable handed to every child process.
pub const SEARCH_PATH_VAR: &str = "PATH";

/// Variables holding the user's home directory, in lookup order.
#[cfg(windows)]
pub const HOME_VARS: &[&str] = &["USERPROFILE", "HOME"];
#[cfg(not(windows))]
pub const HOME_VARS: &[&str] = &["HOME"];

/// A snapshot of environment variables taken once per run.
///
/// Detection never mutates the real process environment; everything that
/// needs a variable reads it from here, which also lets tests supply their
/// own values.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Variables whose name or
    /// value is not valid Unicode are skipped.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| {
                let key = key.into_string().ok()?;
                let value = value.into_string().ok()?;
                Some((key, value))
            })
            .collect();
        Self { vars }
    }

    /// Build a snapshot from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a variable. Names are matched case-insensitively on Windows.
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.vars.get(name) {
            return Some(value.as_str());
        }
        if cfg!(windows) {
            return self
                .vars
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str());
        }
        None
    }

    /// The first of `names` that is set to a non-blank value, with its value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use env_doctor::EnvSnapshot;
    ///
    /// let env = EnvSnapshot::from_pairs([("MAVEN_HOME", " "), ("M2_HOME", "/opt/maven")]);
    /// assert_eq!(
    ///     env.first_non_empty(&["MAVEN_HOME", "M2_HOME"]),
    ///     Some(("M2_HOME", "/opt/maven"))
    /// );
    /// ```
    pub fn first_non_empty<'a, S: AsRef<str>>(
        &'a self,
        names: &'a [S],
    ) -> Option<(&'a str, &'a str)> {
        names.iter().find_map(|name| {
            let name = name.as_ref();
            self.get(name)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (name, value))
        })
    }

    /// The inherited search path, or an empty string when unset.
    pub fn search_path(&self) -> &str {
        self.get(SEARCH_PATH_VAR).unwrap_or("")
    }

    /// The user's home directory, from the first non-blank of [`HOME_VARS`].
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.first_non_empty(HOME_VARS)
            .map(|(_, home)| PathBuf::from(home.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_empty_order() {
        let env = EnvSnapshot::from_pairs([("A", "first"), ("B", "second")]);
        assert_eq!(env.first_non_empty(&["A", "B"]), Some(("A", "first")));
        assert_eq!(env.first_non_empty(&["B", "A"]), Some(("B", "second")));
    }

    #[test]
    fn test_first_non_empty_skips_blank() {
        let env = EnvSnapshot::from_pairs([("A", ""), ("B", "   "), ("C", "value")]);
        assert_eq!(env.first_non_empty(&["A", "B", "C"]), Some(("C", "value")));
        assert_eq!(env.first_non_empty(&["A", "B"]), None);
        assert_eq!(env.first_non_empty::<&str>(&[]), None);
    }

    #[test]
    fn test_search_path_default() {
        let env = EnvSnapshot::default();
        assert_eq!(env.search_path(), "");

        let env = EnvSnapshot::from_pairs([("PATH", "/bin")]);
        assert_eq!(env.search_path(), "/bin");
    }

    #[test]
    fn test_home_dir() {
        assert_eq!(EnvSnapshot::default().home_dir(), None);

        let home = HOME_VARS[0];
        let env = EnvSnapshot::from_pairs([(home, " /home/dev ")]);
        assert_eq!(env.home_dir(), Some(PathBuf::from("/home/dev")));
    }

    #[test]
    fn test_capture_sees_process_env() {
        let env = EnvSnapshot::capture();
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(env.search_path(), path);
        }
    }
}
