// ---------------------------------------------------------------------------
// FileTree: path-addressed directory/file hierarchy
// ---------------------------------------------------------------------------
//
// The tree is rooted at a single directory of depth 1. Every operation parses
// its path, then walks down from the root one prefix at a time, scanning the
// current directory's children for an exact match. Mutations happen only once
// the walk has succeeded, so a failed call leaves the tree untouched.
// ---------------------------------------------------------------------------

use crate::checker;
use crate::error::TreeError;
use crate::node::{copy_contents, NodeArena, NodeId, NodeKind};
use crate::path::{PathLimits, PathValue};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TreeConfig {
	pub limits: PathLimits,
}

/// Result of [`FileTree::stat`]. `size` is only present for files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
	pub is_file: bool,
	pub size: Option<usize>,
}

// ---------------------------------------------------------------------------
// FileTree
// ---------------------------------------------------------------------------

/// Handle owning the whole tree. Starts uninitialized; [`FileTree::init`]
/// and [`FileTree::destroy`] move it in and out of service.
#[derive(Debug, Default)]
pub struct FileTree {
	config: TreeConfig,
	initialized: bool,
	nodes: NodeArena,
	root: Option<NodeId>,
	count: usize,
}

impl FileTree {
	// -- Constructor ------------------------------------------------------

	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(config: TreeConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	// -- Lifecycle --------------------------------------------------------

	pub fn init(&mut self) -> Result<(), TreeError> {
		if self.initialized {
			return Err(TreeError::AlreadyInitialized);
		}
		self.initialized = true;
		self.root = None;
		self.count = 0;
		tracing::debug!("file tree initialized");
		Ok(())
	}

	/// Free every node and return to the uninitialized state.
	pub fn destroy(&mut self) -> Result<(), TreeError> {
		self.ensure_initialized()?;
		let freed = self.nodes.destroy(self.root.take());
		self.nodes = NodeArena::new();
		self.count = 0;
		self.initialized = false;
		tracing::debug!(freed, "file tree destroyed");
		Ok(())
	}

	// -- Bookkeeping accessors -------------------------------------------

	pub fn is_initialized(&self) -> bool {
		self.initialized
	}

	pub fn root(&self) -> Option<NodeId> {
		self.root
	}

	/// Node count as tracked by insert/remove, independent of the arena.
	pub fn node_count(&self) -> usize {
		self.count
	}

	pub fn nodes(&self) -> &NodeArena {
		&self.nodes
	}

	#[cfg(test)]
	pub(crate) fn set_node_count(&mut self, count: usize) {
		self.count = count;
	}

	/// Run the structural checker over the current state.
	pub fn check(&self) -> bool {
		checker::is_valid(self.initialized, &self.nodes, self.root, self.count)
	}

	// -- Helpers (private) ------------------------------------------------

	fn ensure_initialized(&self) -> Result<(), TreeError> {
		if !self.initialized {
			return Err(TreeError::NotInitialized);
		}
		Ok(())
	}

	fn parse(&self, path: &str) -> Result<PathValue, TreeError> {
		let parsed = PathValue::parse(path)?;
		if let Some(err) = parsed.validate(&self.config.limits) {
			return Err(TreeError::BadPath(err));
		}
		Ok(parsed)
	}

	/// Walk from the root to the node at `depth` components of `path`.
	///
	/// `ConflictingPath` if the root does not lead `path`, `NotADirectory` if
	/// a file sits where the walk needs to descend, `NoSuchPath` if a level
	/// is missing.
	fn descend(&self, path: &PathValue, depth: usize) -> Result<NodeId, TreeError> {
		let root = self
			.root
			.ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?;
		let root_node = self
			.nodes
			.get(root)
			.ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?;
		if !root_node.path().is_prefix_of(path) {
			return Err(TreeError::ConflictingPath(format!(
				"Root {} is not a prefix of {}",
				root_node.path(),
				path
			)));
		}

		let mut current = root;
		for level in 2..=depth {
			let node = self
				.nodes
				.get(current)
				.ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?;
			if !node.is_directory() {
				return Err(TreeError::NotADirectory(node.path().to_string()));
			}
			let prefix = path.prefix(level)?;
			current = match self.nodes.has_child(current, &prefix) {
				Ok(index) => node
					.child(index)
					.ok_or_else(|| TreeError::NoSuchPath(prefix.to_string()))?,
				Err(_) => return Err(TreeError::NoSuchPath(prefix.to_string())),
			};
		}
		Ok(current)
	}

	/// Walk to the node at the full depth of `path`.
	fn find(&self, path: &str) -> Result<NodeId, TreeError> {
		self.ensure_initialized()?;
		let path = self.parse(path)?;
		self.descend(&path, path.depth())
	}

	/// Create a node of `kind` under `parent` and link it in order. Nothing is
	/// changed unless every allocation succeeds.
	fn attach(
		&mut self,
		parent: NodeId,
		path: &PathValue,
		kind: NodeKind,
		contents: Option<&[u8]>,
	) -> Result<NodeId, TreeError> {
		let parent_node = self
			.nodes
			.get(parent)
			.ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?;
		if !parent_node.is_directory() {
			return Err(TreeError::NotADirectory(parent_node.path().to_string()));
		}

		let mut node = self.nodes.create(path, Some(parent), kind)?;
		let index = match self.nodes.has_child(parent, path) {
			Ok(_) => return Err(TreeError::AlreadyInTree(path.to_string())),
			Err(index) => index,
		};
		// Copied only once every path check has passed.
		if let Some(bytes) = contents {
			node.replace_contents(copy_contents(bytes)?);
		}

		self.nodes.reserve_child(parent)?;
		let id = self.nodes.alloc(node)?;
		self.nodes.link(parent, id, index);
		self.count += 1;
		Ok(id)
	}

	/// Unlink `target` from its parent (or clear the root) and free its
	/// subtree.
	fn detach(&mut self, target: NodeId) -> usize {
		match self.nodes.get(target).and_then(|n| n.parent()) {
			Some(parent) => {
				self.nodes.unlink(parent, target);
			}
			None => self.root = None,
		}
		let freed = self.nodes.destroy(Some(target));
		self.count -= freed;
		freed
	}

	// -- Insertion --------------------------------------------------------

	/// Insert a directory. The first directory inserted into an empty tree
	/// becomes the root and must have depth 1.
	pub fn insert_directory(&mut self, path: &str) -> Result<(), TreeError> {
		self.ensure_initialized()?;
		let path = self.parse(path)?;

		let Some(root) = self.root else {
			if path.depth() != 1 {
				return Err(TreeError::ConflictingPath(format!(
					"Tree is empty, root must have depth 1: {}",
					path
				)));
			}
			let node = self.nodes.create(&path, None, NodeKind::Directory)?;
			let id = self.nodes.alloc(node)?;
			self.root = Some(id);
			self.count = 1;
			tracing::debug!(path = %path, "inserted root directory");
			return Ok(());
		};

		if path.depth() == 1 {
			let same_as_root = self.nodes.get(root).is_some_and(|n| *n.path() == path);
			return Err(if same_as_root {
				TreeError::AlreadyInTree(path.to_string())
			} else {
				TreeError::ConflictingPath(format!("Root already exists: {}", path))
			});
		}

		let parent = self.descend(&path, path.depth() - 1)?;
		self.attach(parent, &path, NodeKind::Directory, None)?;
		tracing::debug!(path = %path, "inserted directory");
		Ok(())
	}

	/// Insert a file holding a copy of `contents`.
	///
	/// Files can never be the root. Inserting a depth-2 file into an empty
	/// tree also creates its depth-1 root directory; nothing deeper is
	/// created implicitly.
	pub fn insert_file(&mut self, path: &str, contents: &[u8]) -> Result<(), TreeError> {
		self.ensure_initialized()?;
		let path = self.parse(path)?;

		if path.depth() == 1 {
			let same_as_root = self
				.root
				.and_then(|root| self.nodes.get(root))
				.is_some_and(|n| *n.path() == path);
			return Err(if same_as_root {
				TreeError::AlreadyInTree(path.to_string())
			} else {
				TreeError::ConflictingPath(format!("A file cannot be the root: {}", path))
			});
		}

		if self.root.is_none() {
			if path.depth() != 2 {
				return Err(TreeError::NoSuchPath(path.prefix(2)?.to_string()));
			}
			let root_path = path.prefix(1)?;
			let root_node = self.nodes.create(&root_path, None, NodeKind::Directory)?;
			let root = self.nodes.alloc(root_node)?;
			self.root = Some(root);
			self.count = 1;
			if let Err(e) = self.attach(root, &path, NodeKind::File, Some(contents)) {
				self.detach(root);
				return Err(e);
			}
			tracing::debug!(path = %path, root = %root_path, "inserted file with implicit root");
			return Ok(());
		}

		let parent = self.descend(&path, path.depth() - 1)?;
		self.attach(parent, &path, NodeKind::File, Some(contents))?;
		tracing::debug!(path = %path, size = contents.len(), "inserted file");
		Ok(())
	}

	// -- Removal ----------------------------------------------------------

	/// Remove a directory and everything below it. Removing the root empties
	/// the tree.
	pub fn remove_directory(&mut self, path: &str) -> Result<(), TreeError> {
		let target = self.find(path)?;
		if self.nodes.get(target).is_some_and(|n| !n.is_directory()) {
			return Err(TreeError::NotADirectory(path.to_string()));
		}
		let freed = self.detach(target);
		tracing::debug!(path, freed, "removed directory");
		Ok(())
	}

	pub fn remove_file(&mut self, path: &str) -> Result<(), TreeError> {
		let target = self.find(path)?;
		if self.nodes.get(target).is_some_and(|n| !n.is_file()) {
			return Err(TreeError::NotAFile(path.to_string()));
		}
		self.detach(target);
		tracing::debug!(path, "removed file");
		Ok(())
	}

	// -- Lookup -----------------------------------------------------------

	/// True if `path` names a directory. Any failure reads as false.
	pub fn contains_directory(&self, path: &str) -> bool {
		self.find(path)
			.ok()
			.and_then(|id| self.nodes.get(id))
			.is_some_and(|n| n.is_directory())
	}

	/// True if `path` names a file. Any failure reads as false.
	pub fn contains_file(&self, path: &str) -> bool {
		self.find(path)
			.ok()
			.and_then(|id| self.nodes.get(id))
			.is_some_and(|n| n.is_file())
	}

	/// Borrow a file's contents. `None` if the lookup fails or `path` is a
	/// directory; an empty file gives `Some(&[])`.
	pub fn get_file_contents(&self, path: &str) -> Option<&[u8]> {
		let id = self.find(path).ok()?;
		self.nodes.get(id)?.contents()
	}

	/// Replace a file's contents with a copy of `contents`, handing back the
	/// previous buffer. `None` and no change on any failure.
	pub fn replace_file_contents(&mut self, path: &str, contents: &[u8]) -> Option<Vec<u8>> {
		let id = self.find(path).ok()?;
		if !self.nodes.get(id)?.is_file() {
			return None;
		}
		let data = copy_contents(contents).ok()?;
		let previous = self.nodes.get_mut(id)?.replace_contents(data);
		tracing::debug!(path, size = contents.len(), "replaced file contents");
		previous
	}

	/// Report whether `path` is a file and, if so, its size in bytes.
	pub fn stat(&self, path: &str) -> Result<Stat, TreeError> {
		let id = self.find(path)?;
		let node = self
			.nodes
			.get(id)
			.ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?;
		Ok(Stat {
			is_file: node.is_file(),
			size: node.contents().map(<[u8]>::len),
		})
	}

	// -- Serialization ----------------------------------------------------

	/// One `"<path> [dir]"` / `"<path> [file]"` line per node, depth-first.
	/// Within a directory, files come before subdirectories and each group is
	/// in path order. `None` if uninitialized or empty.
	pub fn render(&self) -> Option<String> {
		if !self.initialized {
			return None;
		}
		let root = self.root?;
		let mut out = String::new();
		self.render_node(root, &mut out);
		Some(out)
	}

	fn render_node(&self, id: NodeId, out: &mut String) {
		let Some(node) = self.nodes.get(id) else {
			return;
		};
		out.push_str(&node.to_string());
		out.push('\n');

		let (mut files, mut dirs): (Vec<NodeId>, Vec<NodeId>) = node
			.children()
			.iter()
			.partition(|&&c| self.nodes.get(c).is_some_and(|n| n.is_file()));
		files.sort_by(|&a, &b| self.nodes.compare(a, b));
		dirs.sort_by(|&a, &b| self.nodes.compare(a, b));

		for child in files.into_iter().chain(dirs) {
			self.render_node(child, out);
		}
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
