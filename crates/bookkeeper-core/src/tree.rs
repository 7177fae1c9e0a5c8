//! Tree reconstruction from flat parent-pointer records.
//!
//! [`Tree::build`] takes records of the shape `{unique_id, parent_id,
//! attributes...}` in any order and rebuilds the hierarchy. `parent_id == 0`
//! hangs a record directly off the invisible root. A record whose parent has
//! not been placed yet goes to the back of the work queue; once a whole pass
//! over the queue places nothing, the remaining records can never be placed
//! and the build fails with [`CoreError::OrphanReference`].
//!
//! [`Tree::flatten`] walks the result in pre-order and tags every row with
//! its 1-based depth, which is what a list-style view needs. Levels do not
//! depend on input order; sibling order does, since siblings appear in the
//! order they were attached and a deferred record is attached late.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Parent id meaning "child of the root".
pub const ROOT_ID: i64 = 0;

/// One flat input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRecord {
    pub unique_id: i64,
    pub parent_id: i64,
    /// Display attributes, positionally matching the tree's attribute names.
    pub attributes: Vec<String>,
}

impl TreeRecord {
    pub fn new(unique_id: i64, parent_id: i64, attributes: Vec<String>) -> Self {
        TreeRecord {
            unique_id,
            parent_id,
            attributes,
        }
    }
}

/// A placed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub unique_id: i64,
    pub parent_id: i64,
    /// Attribute name -> value, in attribute-name order.
    pub attributes: IndexMap<String, String>,
    /// Arena indices of the children, in attachment order.
    #[serde(skip)]
    children: Vec<usize>,
}

/// A node in pre-order with its depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    pub unique_id: i64,
    pub parent_id: i64,
    /// Depth from the root, starting at 1.
    pub level: usize,
    pub attributes: IndexMap<String, String>,
}

/// A rooted multi-way tree over [`TreeRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    attribute_names: Vec<String>,
    /// Node arena.
    nodes: Vec<TreeNode>,
    /// Arena indices of the root's children.
    roots: Vec<usize>,
    /// unique_id -> arena index.
    index: HashMap<i64, usize>,
}

impl Tree {
    /// Builds a tree from records given in any order.
    ///
    /// Returns [`CoreError::InvalidTreeRecord`] for a `unique_id` of 0, a
    /// repeated `unique_id`, or more attributes than attribute names, and
    /// [`CoreError::OrphanReference`] when some parents can never be
    /// resolved (missing from the input or part of a cycle).
    pub fn build<S: AsRef<str>>(
        attribute_names: &[S],
        records: impl IntoIterator<Item = TreeRecord>,
    ) -> Result<Tree, CoreError> {
        let mut tree = Tree {
            attribute_names: attribute_names
                .iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
            ..Tree::default()
        };

        let mut queue: VecDeque<TreeRecord> = records.into_iter().collect();
        let mut ids = HashSet::with_capacity(queue.len());
        for record in &queue {
            tree.check_record(record, &mut ids)?;
        }

        // Consecutive deferrals since the last placement.
        let mut stalled = 0usize;
        while let Some(record) = queue.pop_front() {
            let parent = if record.parent_id == ROOT_ID {
                Some(None)
            } else {
                tree.index.get(&record.parent_id).map(|&idx| Some(idx))
            };

            match parent {
                Some(parent) => {
                    tree.attach(parent, record);
                    stalled = 0;
                }
                None => {
                    queue.push_back(record);
                    stalled += 1;
                    if stalled >= queue.len() {
                        return Err(orphan_error(&queue, &ids));
                    }
                }
            }
        }

        Ok(tree)
    }

    fn check_record(&self, record: &TreeRecord, ids: &mut HashSet<i64>) -> Result<(), CoreError> {
        if record.unique_id == ROOT_ID {
            return Err(CoreError::InvalidTreeRecord {
                reason: format!("unique_id {} is reserved for the root", ROOT_ID),
            });
        }
        if !ids.insert(record.unique_id) {
            return Err(CoreError::InvalidTreeRecord {
                reason: format!("unique_id {} appears more than once", record.unique_id),
            });
        }
        if record.attributes.len() > self.attribute_names.len() {
            return Err(CoreError::InvalidTreeRecord {
                reason: format!(
                    "record {} has {} attributes, only {} are named",
                    record.unique_id,
                    record.attributes.len(),
                    self.attribute_names.len()
                ),
            });
        }
        Ok(())
    }

    fn attach(&mut self, parent: Option<usize>, record: TreeRecord) {
        let mut values = record.attributes.into_iter();
        let attributes = self
            .attribute_names
            .iter()
            .map(|name| (name.clone(), values.next().unwrap_or_default()))
            .collect();

        let idx = self.nodes.len();
        self.nodes.push(TreeNode {
            unique_id: record.unique_id,
            parent_id: record.parent_id,
            attributes,
            children: Vec::new(),
        });
        self.index.insert(record.unique_id, idx);
        match parent {
            Some(p) => self.nodes[p].children.push(idx),
            None => self.roots.push(idx),
        }
    }

    /// Attribute names, in column order.
    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    /// Number of placed nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by its `unique_id`.
    pub fn get(&self, unique_id: i64) -> Option<&TreeNode> {
        self.index.get(&unique_id).map(|&idx| &self.nodes[idx])
    }

    /// Children of `unique_id` in attachment order; [`ROOT_ID`] gives the
    /// top level. Unknown ids have no children.
    pub fn children(&self, unique_id: i64) -> Vec<&TreeNode> {
        let slots = if unique_id == ROOT_ID {
            self.roots.as_slice()
        } else {
            self.index
                .get(&unique_id)
                .map(|&idx| self.nodes[idx].children.as_slice())
                .unwrap_or(&[])
        };
        slots.iter().map(|&idx| &self.nodes[idx]).collect()
    }

    /// Pre-order rows with 1-based levels.
    pub fn flatten(&self) -> Vec<FlatRow> {
        let mut rows = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&idx| (idx, 1)).collect();

        while let Some((idx, level)) = stack.pop() {
            let node = &self.nodes[idx];
            rows.push(FlatRow {
                unique_id: node.unique_id,
                parent_id: node.parent_id,
                level,
                attributes: node.attributes.clone(),
            });
            stack.extend(node.children.iter().rev().map(|&child| (child, level + 1)));
        }
        rows
    }

    /// Indented text rendering: one line per node, `level - 1` tabs, then
    /// the attribute values separated by single spaces.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in self.flatten() {
            for _ in 1..row.level {
                out.push('\t');
            }
            let line: Vec<&str> = row.attributes.values().map(String::as_str).collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}

/// Picks the record to blame once the queue stops making progress: the
/// first one whose parent is absent from the input, otherwise (a parent
/// cycle) the first one still queued.
fn orphan_error(queue: &VecDeque<TreeRecord>, ids: &HashSet<i64>) -> CoreError {
    let stuck = queue
        .iter()
        .find(|r| !ids.contains(&r.parent_id))
        .or_else(|| queue.front());
    match stuck {
        Some(r) => CoreError::OrphanReference {
            unique_id: r.unique_id,
            parent_id: r.parent_id,
        },
        None => CoreError::InvalidTreeRecord {
            reason: "work queue drained while stalled".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rec(id: i64, parent: i64, name: &str) -> TreeRecord {
        TreeRecord::new(id, parent, vec![name.to_string()])
    }

    fn levels(tree: &Tree) -> Vec<(i64, usize)> {
        tree.flatten().iter().map(|r| (r.unique_id, r.level)).collect()
    }

    #[test]
    fn parent_listed_after_child() {
        let tree = Tree::build(
            &["short_name"],
            vec![rec(2, 1, "meat"), rec(1, 0, "food"), rec(3, 1, "sweets")],
        )
        .unwrap();
        // 2 waited behind 3 in the queue, so it is attached second.
        assert_eq!(levels(&tree), vec![(1, 1), (3, 2), (2, 2)]);
        let under_food: Vec<i64> = tree.children(1).iter().map(|n| n.unique_id).collect();
        assert_eq!(under_food, vec![3, 2]);
    }

    #[test]
    fn missing_parent_is_an_orphan() {
        let err = Tree::build(&["short_name"], vec![rec(1, 0, "food"), rec(2, 9, "lost")])
            .unwrap_err();
        match err {
            CoreError::OrphanReference { unique_id, parent_id } => {
                assert_eq!(unique_id, 2);
                assert_eq!(parent_id, 9);
            }
            other => panic!("expected OrphanReference, got: {:?}", other),
        }
    }

    #[test]
    fn parent_cycle_terminates() {
        let err = Tree::build(&["n"], vec![rec(1, 2, "a"), rec(2, 1, "b"), rec(3, 0, "c")])
            .unwrap_err();
        assert!(matches!(err, CoreError::OrphanReference { .. }));
    }

    #[test]
    fn orphan_blame_prefers_missing_parent_over_its_descendants() {
        // 5 waits on 4, 4 waits on a parent that does not exist.
        let err = Tree::build(&["n"], vec![rec(5, 4, "x"), rec(4, 77, "y")]).unwrap_err();
        match err {
            CoreError::OrphanReference { unique_id, parent_id } => {
                assert_eq!((unique_id, parent_id), (4, 77));
            }
            other => panic!("expected OrphanReference, got: {:?}", other),
        }
    }

    #[test]
    fn invalid_records() {
        assert!(matches!(
            Tree::build(&["n"], vec![rec(0, 0, "root?")]),
            Err(CoreError::InvalidTreeRecord { .. })
        ));
        assert!(matches!(
            Tree::build(&["n"], vec![rec(1, 0, "a"), rec(1, 0, "b")]),
            Err(CoreError::InvalidTreeRecord { .. })
        ));
        assert!(matches!(
            Tree::build(
                &["n"],
                vec![TreeRecord::new(1, 0, vec!["a".into(), "b".into()])]
            ),
            Err(CoreError::InvalidTreeRecord { .. })
        ));
    }

    #[test]
    fn empty_input_gives_empty_tree() {
        let tree = Tree::build::<&str>(&[], Vec::new()).unwrap();
        assert!(tree.is_empty());
        assert!(tree.flatten().is_empty());
        assert_eq!(tree.render(), "");
    }

    #[test]
    fn attributes_are_positional_and_padded() {
        let tree = Tree::build(
            &["name", "amount"],
            vec![TreeRecord::new(1, 0, vec!["food".into()])],
        )
        .unwrap();
        let node = tree.get(1).unwrap();
        assert_eq!(node.attributes.get("name").map(String::as_str), Some("food"));
        assert_eq!(node.attributes.get("amount").map(String::as_str), Some(""));
    }

    #[test]
    fn children_and_render() {
        let tree = Tree::build(
            &["short_name"],
            vec![
                rec(1, 0, "food"),
                rec(2, 1, "meat"),
                rec(3, 2, "raw meat"),
                rec(4, 2, "sausages"),
                rec(5, 1, "sweets"),
                rec(6, 0, "books"),
                rec(7, 0, "clothes"),
            ],
        )
        .unwrap();

        let top: Vec<i64> = tree.children(ROOT_ID).iter().map(|n| n.unique_id).collect();
        assert_eq!(top, vec![1, 6, 7]);
        let under_meat: Vec<i64> = tree.children(2).iter().map(|n| n.unique_id).collect();
        assert_eq!(under_meat, vec![3, 4]);
        assert!(tree.children(42).is_empty());

        assert_eq!(
            tree.render(),
            "food\n\tmeat\n\t\traw meat\n\t\tsausages\n\tsweets\nbooks\nclothes\n"
        );
    }

    /// A random forest: node `i` (1-based) has a parent in `0..i`.
    fn forest() -> impl Strategy<Value = Vec<TreeRecord>> {
        (1usize..40)
            .prop_flat_map(|n| {
                (1..=n)
                    .map(|i| (0..i as i64).prop_map(move |p| (i as i64, p)))
                    .collect::<Vec<_>>()
            })
            .prop_map(|pairs| {
                pairs
                    .into_iter()
                    .map(|(id, parent)| rec(id, parent, &format!("n{}", id)))
                    .collect::<Vec<_>>()
            })
    }

    fn depth(records: &[TreeRecord], id: i64) -> usize {
        let parents: HashMap<i64, i64> = records.iter().map(|r| (r.unique_id, r.parent_id)).collect();
        let mut level = 0;
        let mut cur = id;
        while cur != ROOT_ID {
            level += 1;
            cur = parents[&cur];
        }
        level
    }

    proptest! {
        #[test]
        fn input_order_does_not_change_levels(
            shuffled in forest().prop_flat_map(|records| (Just(records.clone()), Just(records).prop_shuffle()))
        ) {
            let (records, shuffled) = shuffled;
            let tree = Tree::build(&["short_name"], shuffled).unwrap();
            let rows = tree.flatten();
            prop_assert_eq!(rows.len(), records.len());

            let mut seen = HashSet::new();
            for row in &rows {
                prop_assert_eq!(row.level, depth(&records, row.unique_id));
                // Pre-order: a parent is always emitted before its children.
                prop_assert!(row.parent_id == ROOT_ID || seen.contains(&row.parent_id));
                seen.insert(row.unique_id);
            }
        }
    }
}
