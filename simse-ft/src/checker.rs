// ---------------------------------------------------------------------------
// Structural checker
// ---------------------------------------------------------------------------
//
// Walks a node graph on its own and confirms the parent/child path relation,
// back-references, sibling uniqueness and ordering, and the node count. It
// reads the arena only; the tree's own counters are inputs to compare
// against. Violations are logged at `warn` and make the check return false.
// ---------------------------------------------------------------------------

use std::cmp::Ordering;

use crate::node::{NodeArena, NodeId};

/// Check a single node against its parent and its children.
pub fn node_is_valid(nodes: &NodeArena, id: NodeId) -> bool {
	let Some(node) = nodes.get(id) else {
		tracing::warn!(?id, "A node cannot be fetched");
		return false;
	};
	let path = node.path();
	if path.depth() == 0 {
		tracing::warn!(?id, "A node's path is empty");
		return false;
	}

	if let Some(parent_id) = node.parent() {
		let Some(parent) = nodes.get(parent_id) else {
			tracing::warn!(%path, "Parent node cannot be fetched");
			return false;
		};
		let parent_path = parent.path();
		if path.shared_prefix_depth(parent_path) != path.depth() - 1
			|| parent_path.depth() + 1 != path.depth()
		{
			tracing::warn!(
				parent = %parent_path,
				child = %path,
				"P-C nodes don't have P-C paths"
			);
			return false;
		}
	}

	let children = node.children();
	for (i, &child_id) in children.iter().enumerate() {
		let Some(child) = nodes.get(child_id) else {
			tracing::warn!(%path, index = i, "Child cannot be fetched");
			return false;
		};
		if child.parent() != Some(id) {
			tracing::warn!(
				child = %child.path(),
				"Child's parent does not match the directory holding it"
			);
			return false;
		}
	}

	for (i, &a) in children.iter().enumerate() {
		for &b in &children[i + 1..] {
			if nodes.compare(a, b) == Ordering::Equal {
				tracing::warn!(%path, "Duplicate child path found");
				return false;
			}
		}
	}

	for pair in children.windows(2) {
		if nodes.compare(pair[0], pair[1]) != Ordering::Less {
			tracing::warn!(%path, "Children are not in lexicographic order");
			return false;
		}
	}

	true
}

/// Pre-order walk from `id`, bumping `count` once per visited node. Stops at
/// the first invalid node.
pub fn tree_check(nodes: &NodeArena, id: NodeId, count: &mut usize) -> bool {
	if !node_is_valid(nodes, id) {
		return false;
	}
	*count += 1;

	let Some(node) = nodes.get(id) else {
		return false;
	};
	node.children()
		.iter()
		.all(|&child| tree_check(nodes, child, count))
}

/// Validate a whole tree: the initialization state, the root, every node,
/// and that exactly `expected_count` nodes are reachable from the root.
pub fn is_valid(
	initialized: bool,
	nodes: &NodeArena,
	root: Option<NodeId>,
	expected_count: usize,
) -> bool {
	if !initialized {
		if expected_count != 0 {
			tracing::warn!(expected_count, "Not initialized, but count is not 0");
			return false;
		}
		if root.is_some() {
			tracing::warn!("Not initialized, but root is present");
			return false;
		}
		return true;
	}

	let Some(root) = root else {
		if expected_count != 0 {
			tracing::warn!(expected_count, "Count is positive, but root is absent");
			return false;
		}
		return true;
	};
	if expected_count == 0 {
		tracing::warn!("Count is 0, but root is present");
		return false;
	}

	if let Some(node) = nodes.get(root) {
		if node.parent().is_some() {
			tracing::warn!(root = %node.path(), "Root has a parent");
			return false;
		}
		if node.path().depth() != 1 {
			tracing::warn!(root = %node.path(), "Root path does not have depth 1");
			return false;
		}
	}

	let mut visited = 0;
	if !tree_check(nodes, root, &mut visited) {
		return false;
	}
	if visited != expected_count {
		tracing::warn!(
			expected = expected_count,
			actual = visited,
			"Node count mismatch"
		);
		return false;
	}
	true
}
