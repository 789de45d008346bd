//! Per-path password and discard policy.
//!
//! A [`PolicyTree`] holds one node per logical path segment. Passwords and
//! discard flags are inherited: a lookup walks from the target node up to the
//! root and returns the nearest value that is set. The extract flag is not
//! inherited; a nested archive is descended into when its own node or any
//! node below it is flagged.
//!
//! Target lookup resolves to the deepest existing node along the path as long
//! as the first segment names the root. A single-segment path may name either
//! the root or one of its direct children. Any other path resolves to nothing
//! and gets the defaults (no password, not discarded, not extracted).

use crate::error::ArchiveError;
use crate::error::Result;
use crate::path;

const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct PolicyNode {
    name: String,
    password: String,
    discard: bool,
    extract: bool,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Tree of per-path traversal settings shared by every nesting level.
///
/// # Examples
///
/// ```
/// use nestarc_core::PolicyTree;
///
/// let mut policy = PolicyTree::with_root("a.zip");
/// policy.set_password("a.zip", "111")?;
/// policy.set_password("a.zip/b.7z", "222")?;
/// policy.set_discard("a.zip/junk")?;
///
/// assert_eq!(policy.password("a.zip/x.txt"), "111");
/// assert_eq!(policy.password("a.zip/b.7z/y.txt"), "222");
/// assert!(policy.discarded("a.zip/junk/deep/file"));
/// assert!(!policy.discarded("a.zip/x.txt"));
/// # Ok::<(), nestarc_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PolicyTree {
    nodes: Vec<PolicyNode>,
}

impl Default for PolicyTree {
    fn default() -> Self {
        Self {
            nodes: vec![PolicyNode::default()],
        }
    }
}

impl PolicyTree {
    /// Creates a tree with an unnamed root.
    ///
    /// The root takes the first segment of the first path that is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree whose root is named after the top-level file.
    pub fn with_root(name: impl Into<String>) -> Self {
        let mut tree = Self::default();
        tree.nodes[ROOT].name = name.into();
        tree
    }

    /// Returns the root name.
    pub fn root_name(&self) -> &str {
        &self.nodes[ROOT].name
    }

    /// Returns the number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds nothing but an unconfigured root.
    pub fn is_empty(&self) -> bool {
        let root = &self.nodes[ROOT];
        self.nodes.len() == 1 && root.password.is_empty() && !root.discard && !root.extract
    }

    /// Sets the password of `path`, creating intermediate nodes as needed.
    pub fn set_password(&mut self, path: &str, password: &str) -> Result<()> {
        let index = self.insert(path)?;
        self.nodes[index].password = password.to_owned();
        Ok(())
    }

    /// Discards `path` and everything below it.
    pub fn set_discard(&mut self, path: &str) -> Result<()> {
        let index = self.insert(path)?;
        self.nodes[index].discard = true;
        Ok(())
    }

    /// Flags `path` for recursive extraction.
    pub fn set_extracted(&mut self, path: &str) -> Result<()> {
        let index = self.insert(path)?;
        self.nodes[index].extract = true;
        Ok(())
    }

    /// Returns the effective password for `path`, or `""` if none applies.
    pub fn password(&self, path: &str) -> &str {
        let Some((mut index, _)) = self.lookup(path) else {
            return "";
        };
        loop {
            let node = &self.nodes[index];
            if !node.password.is_empty() {
                return &node.password;
            }
            match node.parent {
                Some(parent) => index = parent,
                None => return "",
            }
        }
    }

    /// Returns the password set on exactly `path`, without inheritance.
    pub fn own_password(&self, path: &str) -> Option<&str> {
        match self.lookup(path) {
            Some((index, true)) if !self.nodes[index].password.is_empty() => {
                Some(&self.nodes[index].password)
            }
            _ => None,
        }
    }

    /// Returns `true` if `path` or one of its ancestors is discarded.
    pub fn discarded(&self, path: &str) -> bool {
        let Some((mut index, _)) = self.lookup(path) else {
            return false;
        };
        loop {
            let node = &self.nodes[index];
            if node.discard {
                return true;
            }
            match node.parent {
                Some(parent) => index = parent,
                None => return false,
            }
        }
    }

    /// Returns `true` if the walker should descend into the archive at `path`.
    ///
    /// The node for `path` must exist; it qualifies when it or any of its
    /// descendants carries the extract flag.
    pub fn extracted(&self, path: &str) -> bool {
        match self.lookup(path) {
            Some((index, true)) => self.subtree_extracted(index),
            _ => false,
        }
    }

    fn subtree_extracted(&self, index: usize) -> bool {
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current];
            if node.extract {
                return true;
            }
            stack.extend(node.children.iter().copied());
        }
        false
    }

    fn child(&self, parent: usize, name: &str) -> Option<usize> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].name == name)
    }

    /// Resolves `path` to the deepest existing node. The flag reports whether
    /// every segment matched.
    fn lookup(&self, path: &str) -> Option<(usize, bool)> {
        let segments = path::segments(path);
        let Some((first, rest)) = segments.split_first() else {
            return Some((ROOT, true));
        };

        if rest.is_empty() {
            if self.nodes[ROOT].name == *first {
                return Some((ROOT, true));
            }
            return self.child(ROOT, first).map(|child| (child, true));
        }

        if self.nodes[ROOT].name != *first {
            return None;
        }

        let mut current = ROOT;
        for segment in rest {
            match self.child(current, segment) {
                Some(child) => current = child,
                None => return Some((current, false)),
            }
        }
        Some((current, true))
    }

    fn insert(&mut self, path: &str) -> Result<usize> {
        let segments = path::segments(path);
        let Some((first, rest)) = segments.split_first() else {
            return Ok(ROOT);
        };

        let root_name = &self.nodes[ROOT].name;
        if rest.is_empty() {
            if root_name.is_empty() || root_name == first {
                self.nodes[ROOT].name = (*first).to_owned();
                return Ok(ROOT);
            }
            return Ok(self.child_or_insert(ROOT, first));
        }

        if root_name.is_empty() {
            self.nodes[ROOT].name = (*first).to_owned();
        } else if root_name != first {
            return Err(ArchiveError::PolicyPath {
                path: path::normalize(path),
                root: root_name.clone(),
            });
        }

        let mut current = ROOT;
        for segment in rest {
            current = self.child_or_insert(current, segment);
        }
        Ok(current)
    }

    fn child_or_insert(&mut self, parent: usize, name: &str) -> usize {
        if let Some(child) = self.child(parent, name) {
            return child;
        }
        let index = self.nodes.len();
        self.nodes.push(PolicyNode {
            name: name.to_owned(),
            parent: Some(parent),
            ..PolicyNode::default()
        });
        self.nodes[parent].children.push(index);
        index
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> PolicyTree {
        let mut policy = PolicyTree::with_root("a.zip");
        policy.set_password("a.zip", "111").unwrap();
        policy.set_password("a.zip/b.7z", "222").unwrap();
        policy
    }

    #[test]
    fn test_password_inherits_from_nearest_ancestor() {
        let policy = sample();
        assert_eq!(policy.password("a.zip"), "111");
        assert_eq!(policy.password("a.zip/x.txt"), "111");
        assert_eq!(policy.password("a.zip/b.7z"), "222");
        assert_eq!(policy.password("a.zip/b.7z/c.zip/z.txt"), "222");
    }

    #[test]
    fn test_password_outside_tree_is_empty() {
        let policy = sample();
        assert_eq!(policy.password("other.zip/x.txt"), "");
        assert_eq!(policy.password("x.txt"), "");
    }

    #[test]
    fn test_single_segment_resolves_root_or_direct_child() {
        let policy = sample();
        assert_eq!(policy.password("a.zip"), "111");

        let mut policy = PolicyTree::with_root("a.zip");
        policy.set_password("b.7z", "222").unwrap();
        assert_eq!(policy.password("b.7z"), "222");
        assert_eq!(policy.password("a.zip/b.7z"), "222");
        assert_eq!(policy.password("a.zip"), "");
    }

    #[test]
    fn test_degenerate_path_resolves_root() {
        let policy = sample();
        assert_eq!(policy.password(""), "111");
        assert_eq!(policy.password(" ./ "), "111");
    }

    #[test]
    fn test_backslash_paths_are_normalized() {
        let policy = sample();
        assert_eq!(policy.password("a.zip\\b.7z\\y.txt"), "222");
    }

    #[test]
    fn test_discard_covers_descendants() {
        let mut policy = sample();
        policy.set_discard("a.zip/junk").unwrap();
        assert!(policy.discarded("a.zip/junk"));
        assert!(policy.discarded("a.zip/junk/a/b/c"));
        assert!(!policy.discarded("a.zip/keep"));
        assert!(!policy.discarded("a.zip"));
    }

    #[test]
    fn test_discard_root_covers_everything() {
        let mut policy = sample();
        policy.set_discard("a.zip").unwrap();
        assert!(policy.discarded("a.zip/b.7z/y.txt"));
    }

    #[test]
    fn test_extracted_requires_exact_node() {
        let mut policy = sample();
        policy.set_extracted("a.zip/b.7z").unwrap();
        assert!(policy.extracted("a.zip/b.7z"));
        assert!(!policy.extracted("a.zip/b.7z/inner.zip"));
        assert!(!policy.extracted("a.zip/c.zip"));
    }

    #[test]
    fn test_extracted_any_descendant() {
        let mut policy = PolicyTree::with_root("a.zip");
        policy.set_password("a.zip/b.zip/first.txt", "x").unwrap();
        policy.set_extracted("a.zip/b.zip/c.zip").unwrap();
        assert!(policy.extracted("a.zip/b.zip"));
        assert!(policy.extracted("a.zip"));
    }

    #[test]
    fn test_own_password() {
        let policy = sample();
        assert_eq!(policy.own_password("a.zip/b.7z"), Some("222"));
        assert_eq!(policy.own_password("a.zip/b.7z/c.zip"), None);
        assert_eq!(policy.own_password("a.zip/x.txt"), None);
    }

    #[test]
    fn test_unnamed_root_takes_first_segment() {
        let mut policy = PolicyTree::new();
        policy.set_password("a.zip/b.7z", "222").unwrap();
        assert_eq!(policy.root_name(), "a.zip");
        assert_eq!(policy.password("a.zip/b.7z"), "222");
    }

    #[test]
    fn test_foreign_root_rejected() {
        let mut policy = sample();
        let err = policy.set_password("other.zip/b.7z", "x").unwrap_err();
        assert!(matches!(err, ArchiveError::PolicyPath { .. }));
        assert_eq!(
            err.to_string(),
            "other.zip/b.7z is not in the policy tree rooted at a.zip"
        );
    }

    #[test]
    fn test_children_unique_by_name() {
        let mut policy = sample();
        let before = policy.len();
        policy.set_password("a.zip/b.7z", "333").unwrap();
        policy.set_discard("a.zip/b.7z").unwrap();
        assert_eq!(policy.len(), before);
        assert_eq!(policy.password("a.zip/b.7z"), "333");
    }

    #[test]
    fn test_existing_direct_child_updated_in_place() {
        let mut policy = sample();
        policy.set_password("b.7z", "999").unwrap();
        assert_eq!(policy.password("a.zip/b.7z"), "999");
        assert_eq!(policy.password("a.zip"), "111");
    }

    #[test]
    fn test_is_empty() {
        assert!(PolicyTree::with_root("a.zip").is_empty());
        assert!(!sample().is_empty());
    }
}
