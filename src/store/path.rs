//! Node addressing inside the graph store.

use std::fmt;

/// Separator used when a path is flattened into a storage key.
pub(crate) const KEY_SEPARATOR: char = '/';

/// Address of a node in the graph, as a list of segments.
///
/// `NodePath::root("pages").child("page_1").child("components")` addresses
/// the same node a graph client reaches with
/// `get("pages").get("page_1").get("components")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// Path with a single top-level segment.
    pub fn root(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    /// Path built from a list of segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Child of this path.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Parent path, or `None` for a top-level node.
    pub fn parent(&self) -> Option<Self> {
        match self.segments.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(Self {
                segments: rest.to_vec(),
            }),
            _ => None,
        }
    }

    /// Last segment of the path (the node's key within its parent).
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Flattened storage key. Segments are escaped so that a segment
    /// containing the separator cannot alias a deeper path.
    pub fn storage_key(&self) -> String {
        let mut key = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(&escape_segment(segment));
        }
        key
    }

    /// Prefix shared by the storage keys of every descendant.
    pub(crate) fn children_prefix(&self) -> String {
        let mut prefix = self.storage_key();
        prefix.push(KEY_SEPARATOR);
        prefix
    }

    /// If `storage_key` names a direct child of this path, return the
    /// child's (unescaped) key.
    pub(crate) fn direct_child_key(&self, storage_key: &str) -> Option<String> {
        let rest = storage_key.strip_prefix(&self.children_prefix())?;
        if rest.is_empty() || rest.contains(KEY_SEPARATOR) {
            return None;
        }
        Some(unescape_segment(rest))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('%', "%25").replace(KEY_SEPARATOR, "%2F")
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("%2F", "/").replace("%25", "%")
}
