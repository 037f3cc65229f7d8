//! Paths inside the mounted HDFS namespace.

use relative_path::{RelativePath, RelativePathBuf};
use std::fmt;

/// Absolute path within the remote HDFS namespace.
///
/// Paths use `/` as the separator regardless of the host OS and are
/// normalized on construction, so `"/a//b/"` and `"a/b"` compare equal.
/// The mount root maps to the HDFS root `/`.
///
/// # Examples
///
/// ```
/// use webhdfs_core::HdfsPath;
///
/// let path = HdfsPath::new("/user/alice/report.csv");
/// assert_eq!(path.file_name(), Some("report.csv"));
/// assert_eq!(path.parent().unwrap().to_string(), "/user/alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HdfsPath(RelativePathBuf);

impl HdfsPath {
    /// The root path.
    #[inline]
    pub fn root() -> Self {
        HdfsPath(RelativePathBuf::new())
    }

    /// Create a new path from a string.
    ///
    /// Leading slashes are stripped, `.`/`..` components are resolved
    /// and redundant separators are removed.
    pub fn new(path: impl AsRef<str>) -> Self {
        let s = path.as_ref().trim_start_matches('/');
        HdfsPath(RelativePath::new(s).normalize())
    }

    /// Check if this is the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.as_str().is_empty()
    }


    /// Join this path with a single component.
    pub fn join(&self, component: impl AsRef<str>) -> Self {
        HdfsPath(self.0.join(component.as_ref()).normalize())
    }

    /// Get the parent path, if any.
    ///
    /// Returns `None` for the root path.
    pub fn parent(&self) -> Option<HdfsPath> {
        self.0.parent().map(|p| HdfsPath(p.to_relative_path_buf()))
    }

    /// The containing directory, treating the root as its own parent.
    pub fn dirname(&self) -> HdfsPath {
        self.parent().unwrap_or_else(HdfsPath::root)
    }

    /// Get the final component of this path.
    ///
    /// Returns `None` for the root path.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name()
    }

    /// Moves this path from under `from` to under `to`.
    ///
    /// Returns `None` unless `from` is this path or one of its ancestors.
    ///
    /// ```
    /// use webhdfs_core::HdfsPath;
    ///
    /// let file = HdfsPath::new("/old/sub/f");
    /// let moved = file.rebase(&HdfsPath::new("/old"), &HdfsPath::new("/new"));
    /// assert_eq!(moved, Some(HdfsPath::new("/new/sub/f")));
    /// assert_eq!(file.rebase(&HdfsPath::new("/ol"), &HdfsPath::new("/x")), None);
    /// ```
    pub fn rebase(&self, from: &HdfsPath, to: &HdfsPath) -> Option<HdfsPath> {
        let mut rest = self.components();
        for expected in from.components() {
            if rest.next() != Some(expected) {
                return None;
            }
        }
        Some(rest.fold(to.clone(), |acc, component| acc.join(component)))
    }

    /// Iterate over the components of this path.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.components().map(|c| c.as_str())
    }
}

impl fmt::Display for HdfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl From<&str> for HdfsPath {
    fn from(s: &str) -> Self {
        HdfsPath::new(s)
    }
}

impl From<String> for HdfsPath {
    fn from(s: String) -> Self {
        HdfsPath::new(s)
    }
}
