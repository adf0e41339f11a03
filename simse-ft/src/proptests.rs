//! Property-based tests for `FileTree` over random operation sequences.

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::checker;
use crate::error::TreeError;
use crate::path::PathValue;
use crate::tree::FileTree;

#[derive(Debug, Clone)]
enum Op {
    InsertDir(String),
    InsertFile(String, Vec<u8>),
    RemoveDir(String),
    RemoveFile(String),
    Replace(String, Vec<u8>),
}

/// Paths over a tiny alphabet so operations collide often. Most paths hang
/// off `/a` so the root is usually shared.
fn path_strategy() -> impl Strategy<Value = String> {
    (
        prop::bool::weighted(0.9),
        prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..=3),
    )
        .prop_map(|(under_a, rest)| {
            let mut path = String::from(if under_a { "/a" } else { "/b" });
            for part in rest {
                path.push('/');
                path.push_str(part);
            }
            path
        })
}

fn bytes_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..8)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => path_strategy().prop_map(Op::InsertDir),
        3 => (path_strategy(), bytes_strategy()).prop_map(|(p, b)| Op::InsertFile(p, b)),
        1 => path_strategy().prop_map(Op::RemoveDir),
        1 => path_strategy().prop_map(Op::RemoveFile),
        1 => (path_strategy(), bytes_strategy()).prop_map(|(p, b)| Op::Replace(p, b)),
    ]
}

/// Expected contents keyed by path: `None` for directories.
type Model = BTreeMap<String, Option<Vec<u8>>>;

fn remove_subtree(model: &mut Model, path: &str) {
    let target = PathValue::parse(path).unwrap();
    model.retain(|k, _| !target.is_prefix_of(&PathValue::parse(k).unwrap()));
}

/// Apply `op` to both the tree and the model. Returns whether the tree
/// accepted it.
fn apply(tree: &mut FileTree, model: &mut Model, op: &Op) -> bool {
    match op {
        Op::InsertDir(path) => {
            let ok = tree.insert_directory(path).is_ok();
            if ok {
                model.insert(path.clone(), None);
            }
            ok
        }
        Op::InsertFile(path, data) => {
            let ok = tree.insert_file(path, data).is_ok();
            if ok {
                if model.is_empty() {
                    let root = PathValue::parse(path).unwrap().prefix(1).unwrap();
                    model.insert(root.to_string(), None);
                }
                model.insert(path.clone(), Some(data.clone()));
            }
            ok
        }
        Op::RemoveDir(path) => {
            let ok = tree.remove_directory(path).is_ok();
            if ok {
                remove_subtree(model, path);
            }
            ok
        }
        Op::RemoveFile(path) => {
            let ok = tree.remove_file(path).is_ok();
            if ok {
                model.remove(path);
            }
            ok
        }
        Op::Replace(path, data) => {
            let previous = tree.replace_file_contents(path, data);
            if let Some(old) = &previous {
                let slot = model.get_mut(path).unwrap();
                assert_eq!(slot.as_ref(), Some(old));
                *slot = Some(data.clone());
            }
            previous.is_some()
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    // The checker accepts the tree after every step, with the model's count
    #[test]
    fn checker_holds_after_every_op(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut tree = FileTree::new();
        tree.init().unwrap();
        let mut model = Model::new();

        for op in &ops {
            apply(&mut tree, &mut model, op);
            prop_assert!(tree.check());
            prop_assert!(checker::is_valid(true, tree.nodes(), tree.root(), model.len()));
            prop_assert_eq!(tree.node_count(), model.len());
        }
    }

    // Lookups agree with the model for every path it holds
    #[test]
    fn lookups_match_model(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut tree = FileTree::new();
        tree.init().unwrap();
        let mut model = Model::new();

        for op in &ops {
            apply(&mut tree, &mut model, op);
        }

        for (path, contents) in &model {
            match contents {
                None => {
                    prop_assert!(tree.contains_directory(path));
                    prop_assert!(!tree.contains_file(path));
                    prop_assert_eq!(tree.get_file_contents(path), None);
                }
                Some(data) => {
                    prop_assert!(tree.contains_file(path));
                    prop_assert!(!tree.contains_directory(path));
                    prop_assert_eq!(tree.get_file_contents(path), Some(data.as_slice()));
                    prop_assert_eq!(tree.stat(path).unwrap().size, Some(data.len()));
                }
            }
        }

        let rendered = tree.render().unwrap_or_default();
        prop_assert_eq!(rendered.lines().count(), model.len());
    }

    // A rejected operation leaves the tree exactly as it was
    #[test]
    fn failed_ops_do_not_mutate(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut tree = FileTree::new();
        tree.init().unwrap();
        let mut model = Model::new();

        for op in &ops {
            let before = tree.render();
            let count = tree.node_count();
            if !apply(&mut tree, &mut model, op) {
                prop_assert_eq!(tree.render(), before);
                prop_assert_eq!(tree.node_count(), count);
            }
        }
    }

    // Inserting any present path again is rejected as a duplicate
    #[test]
    fn reinsert_is_already_in_tree(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut tree = FileTree::new();
        tree.init().unwrap();
        let mut model = Model::new();

        for op in &ops {
            apply(&mut tree, &mut model, op);
        }

        for path in model.keys() {
            prop_assert!(matches!(tree.insert_directory(path), Err(TreeError::AlreadyInTree(_))));
            prop_assert!(matches!(tree.insert_file(path, b"x"), Err(TreeError::AlreadyInTree(_))));
        }
    }
}
