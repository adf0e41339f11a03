// ---------------------------------------------------------------------------
// Tree nodes and the arena that owns them
// ---------------------------------------------------------------------------
//
// Every node lives in a `NodeArena` slot addressed by a `NodeId`. A directory
// holds the ordered ids of its children; each node holds the id of its
// parent as a plain back-reference. Destroying a node frees its whole subtree
// from the arena.
// ---------------------------------------------------------------------------

use std::cmp::Ordering;
use std::fmt;

use crate::error::TreeError;
use crate::path::PathValue;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Stable handle to a node slot in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Directory => "dir",
            Self::File => "file",
        }
    }
}

/// Kind-specific payload. Only directories have children, only files have
/// contents.
#[derive(Debug, Clone)]
pub(crate) enum NodeBody {
    Directory(Vec<NodeId>),
    File(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) path: PathValue,
    pub(crate) parent: Option<NodeId>,
    pub(crate) body: NodeBody,
}

impl Node {
    pub fn path(&self) -> &PathValue {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Directory(_) => NodeKind::Directory,
            NodeBody::File(_) => NodeKind::File,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind() == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind() == NodeKind::File
    }

    /// Child ids in ascending path order. Empty for files.
    pub fn children(&self) -> &[NodeId] {
        match &self.body {
            NodeBody::Directory(children) => children,
            NodeBody::File(_) => &[],
        }
    }

    pub fn num_children(&self) -> usize {
        self.children().len()
    }

    /// The child at `index`, if any.
    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.children().get(index).copied()
    }

    /// File contents. `None` for directories.
    pub fn contents(&self) -> Option<&[u8]> {
        match &self.body {
            NodeBody::File(data) => Some(data),
            NodeBody::Directory(_) => None,
        }
    }

    /// Swap in new contents, returning the old buffer. `None` (and no change)
    /// for directories.
    pub(crate) fn replace_contents(&mut self, contents: Vec<u8>) -> Option<Vec<u8>> {
        match &mut self.body {
            NodeBody::File(data) => Some(std::mem::replace(data, contents)),
            NodeBody::Directory(_) => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.path, self.kind().as_str())
    }
}

/// Copy `bytes` into a freshly allocated buffer, reporting allocation
/// failure instead of aborting.
pub fn copy_contents(bytes: &[u8]) -> Result<Vec<u8>, TreeError> {
    let mut data = Vec::new();
    data.try_reserve_exact(bytes.len())?;
    data.extend_from_slice(bytes);
    Ok(data)
}

// ---------------------------------------------------------------------------
// NodeArena
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    live: usize,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    // -- Creation -----------------------------------------------------------

    /// Build a node for `path` under `parent`.
    ///
    /// Without a parent the path must have depth 1. With a parent, the path
    /// must sit exactly one level below it, extend the parent's path, and not
    /// already be one of its children. The node owns a copy of `path` and is
    /// not linked anywhere; see [`NodeArena::alloc`] and [`NodeArena::link`].
    pub fn create(
        &self,
        path: &PathValue,
        parent: Option<NodeId>,
        kind: NodeKind,
    ) -> Result<Node, TreeError> {
        if path.depth() == 0 {
            return Err(TreeError::NoSuchPath(path.to_string()));
        }

        match parent {
            None => {
                if path.depth() != 1 {
                    return Err(TreeError::NoSuchPath(format!(
                        "A parentless node must have depth 1: {}",
                        path
                    )));
                }
            }
            Some(parent_id) => {
                let parent_node = self.get(parent_id).ok_or_else(|| {
                    TreeError::NoSuchPath(format!("Parent of {} is not in the tree", path))
                })?;
                let parent_path = parent_node.path();
                if path.depth() != parent_path.depth() + 1 {
                    return Err(TreeError::NoSuchPath(format!(
                        "{} is not one level below {}",
                        path, parent_path
                    )));
                }
                if !parent_path.is_prefix_of(path) {
                    return Err(TreeError::ConflictingPath(format!(
                        "{} is not a prefix of {}",
                        parent_path, path
                    )));
                }
                if self.has_child(parent_id, path).is_ok() {
                    return Err(TreeError::AlreadyInTree(path.to_string()));
                }
            }
        }

        let body = match kind {
            NodeKind::Directory => NodeBody::Directory(Vec::new()),
            NodeKind::File => NodeBody::File(Vec::new()),
        };

        Ok(Node {
            path: path.clone(),
            parent,
            body,
        })
    }

    /// Place a node in the arena, reusing a freed slot when one exists.
    pub fn alloc(&mut self, node: Node) -> Result<NodeId, TreeError> {
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.try_reserve(1)?;
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.live += 1;
        Ok(NodeId(id))
    }

    /// Make room for one more child under `dir` so a later [`NodeArena::link`]
    /// cannot fail.
    pub fn reserve_child(&mut self, dir: NodeId) -> Result<(), TreeError> {
        match self.get_mut(dir).map(|n| &mut n.body) {
            Some(NodeBody::Directory(children)) => {
                children.try_reserve(1)?;
                Ok(())
            }
            Some(NodeBody::File(_)) => Err(TreeError::NotADirectory(format!("{:?}", dir))),
            None => Err(TreeError::NoSuchPath(format!("{:?}", dir))),
        }
    }

    /// Insert `child` into `dir`'s children at `index`.
    pub fn link(&mut self, dir: NodeId, child: NodeId, index: usize) {
        if let Some(NodeBody::Directory(children)) = self.get_mut(dir).map(|n| &mut n.body) {
            children.insert(index, child);
        }
    }

    /// Remove `child` from `dir`'s children. Returns false if it was not there.
    pub fn unlink(&mut self, dir: NodeId, child: NodeId) -> bool {
        if let Some(NodeBody::Directory(children)) = self.get_mut(dir).map(|n| &mut n.body) {
            if let Some(pos) = children.iter().position(|&c| c == child) {
                children.remove(pos);
                return true;
            }
        }
        false
    }

    // -- Destruction --------------------------------------------------------

    /// Free `id` and every node below it, children before parents. Returns
    /// the number of nodes freed; 0 for an absent node.
    ///
    /// The caller unlinks `id` from its parent first.
    pub fn destroy(&mut self, id: Option<NodeId>) -> usize {
        let Some(id) = id else {
            return 0;
        };
        let Some(node) = self.slots.get_mut(id.0).and_then(Option::take) else {
            return 0;
        };

        let mut freed = 0;
        if let NodeBody::Directory(children) = node.body {
            for child in children {
                freed += self.destroy(Some(child));
            }
        }

        self.free.push(id.0);
        self.live -= 1;
        freed + 1
    }

    // -- Queries ------------------------------------------------------------

    /// Look for a child of `dir` with exactly `path`.
    ///
    /// Like `slice::binary_search`, returns `Ok(index)` when found and
    /// `Err(index)` with the position that keeps the children in ascending
    /// order otherwise. The scan is linear.
    pub fn has_child(&self, dir: NodeId, path: &PathValue) -> Result<usize, usize> {
        let Some(node) = self.get(dir) else {
            return Err(0);
        };
        for (i, &child) in node.children().iter().enumerate() {
            let Some(child_node) = self.get(child) else {
                continue;
            };
            match child_node.path().cmp(path) {
                Ordering::Less => {}
                Ordering::Equal => return Ok(i),
                Ordering::Greater => return Err(i),
            }
        }
        Err(node.num_children())
    }

    /// Order two nodes by path. Missing nodes sort first.
    pub fn compare(&self, a: NodeId, b: NodeId) -> Ordering {
        match (self.get(a), self.get(b)) {
            (Some(x), Some(y)) => x.path().cmp(y.path()),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
