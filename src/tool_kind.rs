//! The toolchains checked by default.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Installation-root variables for the build tool, in lookup order.
pub const MAVEN_HOME_VARS: &[&str] = &["MAVEN_HOME", "M2_HOME"];

/// A toolchain in the default registry.
///
/// Each kind expands to a [`ToolSpec`](crate::ToolSpec) through
/// [`ToolKind::spec`]; [`default_registry`](crate::default_registry) builds
/// them all in order.
///
/// # Example
///
/// ```rust
/// use env_doctor::ToolKind;
///
/// for kind in ToolKind::all() {
///     println!("{}: {}", kind.display_name(), kind.executable_name());
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, strum::EnumIter)]
#[non_exhaustive]
pub enum ToolKind {
    /// Java runtime
    Java,
    /// Git client
    Git,
    /// Maven build tool
    Maven,
    /// Docker engine CLI
    Docker,
    /// Docker Compose (plugin or standalone binary)
    Compose,
}

impl ToolKind {
    /// The executable name to look for on this platform.
    ///
    /// ```rust
    /// use env_doctor::ToolKind;
    ///
    /// assert_eq!(ToolKind::Git.executable_name(), "git");
    /// ```
    pub fn executable_name(&self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Git => "git",
            Self::Maven if cfg!(windows) => "mvn.cmd",
            Self::Maven => "mvn",
            Self::Docker => "docker",
            Self::Compose if cfg!(windows) => "docker-compose.exe",
            Self::Compose => "docker-compose",
        }
    }

    /// Human-readable name used in reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Java => "Java",
            Self::Git => "Git",
            Self::Maven => "Maven",
            Self::Docker => "Docker",
            Self::Compose => "Compose",
        }
    }

    /// All kinds in registry order.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(ToolKind::Java.display_name(), "Java");
        assert_eq!(ToolKind::Git.display_name(), "Git");
        assert_eq!(ToolKind::Maven.display_name(), "Maven");
        assert_eq!(ToolKind::Docker.display_name(), "Docker");
        assert_eq!(ToolKind::Compose.display_name(), "Compose");
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_names_unix() {
        assert_eq!(ToolKind::Maven.executable_name(), "mvn");
        assert_eq!(ToolKind::Compose.executable_name(), "docker-compose");
    }

    #[cfg(windows)]
    #[test]
    fn test_executable_names_windows() {
        assert_eq!(ToolKind::Maven.executable_name(), "mvn.cmd");
        assert_eq!(ToolKind::Compose.executable_name(), "docker-compose.exe");
    }

    #[test]
    fn test_all_in_registry_order() {
        let all: Vec<_> = ToolKind::all().collect();
        assert_eq!(
            all,
            vec![
                ToolKind::Java,
                ToolKind::Git,
                ToolKind::Maven,
                ToolKind::Docker,
                ToolKind::Compose,
            ]
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&ToolKind::Maven).unwrap();
        let back: ToolKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ToolKind::Maven);
    }
}
