//! Mount-relative paths
//!
//! A path below the mount point is a `/`-separated list of encoded names.
//! Components are kept encoded; decoding happens where each one is used.

use core::fmt;

/// A path relative to the mount point
///
/// Parsing is lenient: empty components from repeated or trailing slashes
/// are dropped. Dot components are kept as written, since normalizing them
/// is the caller's business.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryPath {
    components: Vec<String>,
}

impl RegistryPath {
    /// The mount root itself
    pub fn mount_root() -> Self {
        Self::default()
    }

    /// Parses a mount-relative path
    ///
    /// # Examples
    ///
    /// ```
    /// use registry_view::RegistryPath;
    ///
    /// let path = RegistryPath::parse("/HKEY_USERS//S-1-5-18/");
    /// assert_eq!(path.components(), &["HKEY_USERS", "S-1-5-18"]);
    /// assert!(RegistryPath::parse("/").is_mount_root());
    /// ```
    pub fn parse(path: &str) -> Self {
        Self {
            components: path
                .split('/')
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Returns true for the mount root
    pub fn is_mount_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Encoded components, first one naming a root
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Number of components
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// Last component, if any
    pub fn leaf(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// Path of the containing directory (`None` at the mount root)
    pub fn parent(&self) -> Option<RegistryPath> {
        let (_, parent) = self.components.split_last()?;
        Some(Self {
            components: parent.to_vec(),
        })
    }

    /// Returns this path extended by one encoded component
    pub fn join(&self, encoded: &str) -> RegistryPath {
        let mut components = self.components.clone();
        components.push(encoded.to_string());
        Self { components }
    }
}

impl fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_path() {
        let path = RegistryPath::parse("HKEY_LOCAL_MACHINE/Software");
        assert_eq!(path.components(), &["HKEY_LOCAL_MACHINE", "Software"]);
        assert_eq!(path.depth(), 2);
        assert_eq!(path.leaf(), Some("Software"));
    }

    #[test]
    fn test_parse_drops_empty_components() {
        let path = RegistryPath::parse("//HKEY_USERS///x//");
        assert_eq!(path.components(), &["HKEY_USERS", "x"]);
    }

    #[test]
    fn test_mount_root() {
        assert!(RegistryPath::parse("").is_mount_root());
        assert!(RegistryPath::parse("///").is_mount_root());
        assert_eq!(RegistryPath::mount_root().leaf(), None);
        assert_eq!(RegistryPath::mount_root().parent(), None);
    }

    #[test]
    fn test_parent_and_join() {
        let path = RegistryPath::parse("A/B/C");
        let parent = path.parent().unwrap();
        assert_eq!(parent.components(), &["A", "B"]);
        assert_eq!(parent.join("C"), path);
        assert!(RegistryPath::parse("A").parent().unwrap().is_mount_root());
    }

    #[test]
    fn test_encoded_slash_stays_one_component() {
        let path = RegistryPath::parse("A/a%2fb");
        assert_eq!(path.depth(), 2);
        assert_eq!(path.leaf(), Some("a%2fb"));
    }

    #[test]
    fn test_display() {
        assert_eq!(RegistryPath::parse("A//B/").to_string(), "/A/B");
        assert_eq!(RegistryPath::mount_root().to_string(), "/");
    }
}
