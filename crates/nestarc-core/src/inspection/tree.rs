//! Tree of entries mirrored from a traversal.

use std::fmt;

use glob::MatchOptions;
use glob::Pattern;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeStruct;

use crate::Result;
use crate::error::ArchiveError;
use crate::path;

const ROOT: usize = 0;

/// Glob options for logical paths: `*` and `?` never match `/`.
pub(crate) const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One node of an [`InfoTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    /// Name of this path component.
    pub name: String,
    /// Node is a directory (listed or synthesized from a deeper path).
    pub is_dir: bool,
    /// Node is an archive: the root, or an entry whose head matched a known
    /// signature.
    pub archived: bool,
    /// Archive refuses to open without a password.
    pub encrypted: bool,
    /// Password resolved for the archive when it is encrypted.
    pub password: String,
    /// Archive is encrypted and its password is missing or wrong.
    pub password_invalid: bool,
    /// Captured content of a leaf matching a preview pattern.
    pub preview: Option<Vec<u8>>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl FileInfo {
    /// Index of the parent node, `None` for the root.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Indices of the children, in discovery order.
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// Tree of every entry seen while walking an archive and its nested
/// archives.
///
/// Nodes live in an arena and are addressed by index; index 0 is the root,
/// which stands for the top-level file itself. Logical paths passed to the
/// tree include the root name (`a.zip/dir/x.txt`).
///
/// # Examples
///
/// ```
/// use nestarc_core::InfoTree;
///
/// let mut tree = InfoTree::new("a.zip", false, "");
/// tree.mount_file("a.zip/dir/x.txt", None);
/// tree.mount_archive_file("a.zip/b.7z", true, true, "111");
///
/// let x = tree.get("a.zip/dir/x.txt").unwrap();
/// assert_eq!(tree.path(x), "a.zip/dir/x.txt");
/// assert!(tree.node(tree.get("a.zip/dir").unwrap()).is_dir);
/// assert_eq!(tree.invalid_archived_entries().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoTree {
    nodes: Vec<FileInfo>,
}

impl InfoTree {
    /// Creates a tree whose root is the archive `name`.
    pub fn new(name: impl Into<String>, encrypted: bool, password: impl Into<String>) -> Self {
        Self {
            nodes: vec![FileInfo {
                name: name.into(),
                archived: true,
                encrypted,
                password: password.into(),
                ..FileInfo::default()
            }],
        }
    }

    /// Returns the root node.
    pub fn root(&self) -> &FileInfo {
        &self.nodes[ROOT]
    }

    /// Returns the node at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` was not produced by this tree.
    pub fn node(&self, index: usize) -> &FileInfo {
        &self.nodes[index]
    }

    /// Returns the number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Mounts a directory and any missing parents.
    pub fn mount_dir(&mut self, logical_path: &str) -> usize {
        let segments = path::segments(logical_path);
        let mut current = ROOT;
        for segment in segments.iter().skip(1) {
            current = self.child_or_insert(current, segment, true);
        }
        current
    }

    /// Mounts a file, synthesizing missing parent directories.
    ///
    /// Mounting the same path twice updates the existing node. Returns
    /// `None` for paths with nothing below the root, such as an entry named
    /// `..`.
    pub fn mount_file(&mut self, logical_path: &str, preview: Option<Vec<u8>>) -> Option<usize> {
        let segments = path::segments(logical_path);
        let Some((file, dirs)) = segments.split_last().filter(|(_, dirs)| !dirs.is_empty()) else {
            log::warn!("entry {logical_path:?} names no file below the root, not mounted");
            return None;
        };
        let mut current = ROOT;
        for dir in &dirs[1..] {
            current = self.child_or_insert(current, dir, true);
        }
        let index = self.child_or_insert(current, file, false);
        self.nodes[index].is_dir = false;
        self.nodes[index].preview = preview;
        Some(index)
    }

    /// Mounts a nested archive with its encryption state.
    pub fn mount_archive_file(
        &mut self,
        logical_path: &str,
        encrypted: bool,
        password_invalid: bool,
        password: &str,
    ) -> Option<usize> {
        let index = self.mount_file(logical_path, None)?;
        let node = &mut self.nodes[index];
        node.archived = true;
        node.encrypted = encrypted;
        node.password_invalid = password_invalid;
        node.password = password.to_owned();
        Some(index)
    }

    /// Finds the node for a logical path.
    pub fn get(&self, logical_path: &str) -> Option<usize> {
        let segments = path::segments(logical_path);
        let (first, rest) = segments.split_first()?;
        if *first != self.nodes[ROOT].name {
            return None;
        }
        rest.iter()
            .try_fold(ROOT, |current, segment| self.child(current, segment))
    }

    /// Returns the logical path of a node.
    pub fn path(&self, index: usize) -> String {
        let mut names = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            names.push(self.nodes[i].name.as_str());
            current = self.nodes[i].parent;
        }
        names.reverse();
        names.join("/")
    }

    /// Returns every node whose logical path matches `pattern`, in
    /// pre-order. `*` does not cross `/`.
    pub fn matches(&self, pattern: &str) -> Result<Vec<usize>> {
        let compiled = compile_pattern(pattern)?;
        Ok(self
            .pre_order()
            .into_iter()
            .filter(|&index| compiled.matches_with(&self.path(index), MATCH_OPTIONS))
            .collect())
    }

    /// Returns every archive node, root included, in pre-order.
    pub fn archive_entries(&self) -> Vec<usize> {
        self.pre_order()
            .into_iter()
            .filter(|&index| self.nodes[index].archived)
            .collect()
    }

    /// Returns every encrypted archive whose password is missing or wrong,
    /// children before their parent.
    pub fn invalid_archived_entries(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_invalid(ROOT, &mut out);
        out
    }

    fn collect_invalid(&self, index: usize, out: &mut Vec<usize>) {
        let node = &self.nodes[index];
        for &child in &node.children {
            self.collect_invalid(child, out);
        }
        if node.archived && node.encrypted && node.password_invalid {
            out.push(index);
        }
    }

    /// Returns the captured previews keyed by logical path, in pre-order.
    pub fn previews(&self) -> Vec<(String, &[u8])> {
        self.pre_order()
            .into_iter()
            .filter_map(|index| {
                self.nodes[index]
                    .preview
                    .as_deref()
                    .map(|data| (self.path(index), data))
            })
            .collect()
    }

    /// Renders the tree as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn pre_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.nodes[index].children.iter().rev().copied());
        }
        order
    }

    fn child(&self, parent: usize, name: &str) -> Option<usize> {
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].name == name)
    }

    fn child_or_insert(&mut self, parent: usize, name: &str, is_dir: bool) -> usize {
        if let Some(child) = self.child(parent, name) {
            return child;
        }
        let index = self.nodes.len();
        self.nodes.push(FileInfo {
            name: name.to_owned(),
            is_dir,
            parent: Some(parent),
            ..FileInfo::default()
        });
        self.nodes[parent].children.push(index);
        index
    }
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| ArchiveError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: e.msg.to_owned(),
    })
}

struct NodeView<'t> {
    tree: &'t InfoTree,
    index: usize,
}

struct ChildrenView<'t> {
    tree: &'t InfoTree,
    children: &'t [usize],
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let node = &self.tree.nodes[self.index];
        let mut state = serializer.serialize_struct("FileInfo", 7)?;
        state.serialize_field("name", &node.name)?;
        state.serialize_field("isDir", &node.is_dir)?;
        state.serialize_field("archived", &node.archived)?;
        state.serialize_field("encrypted", &node.encrypted)?;
        state.serialize_field("password", &node.password)?;
        state.serialize_field("passwordInvalid", &node.password_invalid)?;
        state.serialize_field(
            "children",
            &ChildrenView {
                tree: self.tree,
                children: &node.children,
            },
        )?;
        state.end()
    }
}

impl Serialize for ChildrenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.children.iter().map(|&index| NodeView {
            tree: self.tree,
            index,
        }))
    }
}

impl Serialize for InfoTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        NodeView {
            tree: self,
            index: ROOT,
        }
        .serialize(serializer)
    }
}

impl fmt::Display for InfoTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json_pretty().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
