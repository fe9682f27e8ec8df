use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::node::TrieNode;

/// A row's location inside a trie, expressed as a sequence of child
/// offsets from the root. An empty path means the row is anchored at the
/// root itself.
type NodePath = Vec<usize>;

/// A rooted tree of [`TrieNode`]s plus the two row→node indices that keep
/// trial insertion and commit linear in the column's row count rather than
/// in tree size.
#[derive(Debug)]
pub(crate) struct SuffixTrie {
    root: TrieNode,
    /// row → deepest committed node, as a path from the root.
    committed_index: FxHashMap<u32, NodePath>,
    /// row → tentative node from the trial currently in flight. Populated
    /// by `false_insert`, drained by `commit`, cleared by `rollback`.
    tentative_index: FxHashMap<u32, NodePath>,
}

impl SuffixTrie {
    pub(crate) fn new() -> Self {
        SuffixTrie {
            root: TrieNode::root(),
            committed_index: FxHashMap::default(),
            tentative_index: FxHashMap::default(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Tentatively inserts `rows` at column `col`, scoring the result as
    /// `new_nodes * lambda + new_rows`. Never touches the committed index
    /// or clears any tentative flag — a pure "what would this cost" probe.
    pub(crate) fn false_insert(&mut self, col: i32, rows: &[u32], lambda: u32) -> u64 {
        let mut new_nodes: u64 = 0;
        let mut new_rows: u64 = 0;

        for &row in rows {
            let anchor_path = self
                .committed_index
                .get(&row)
                .cloned()
                .unwrap_or_default();

            let anchor = self.root.at_mut(&anchor_path);
            let (child_offset, created) = anchor.find_or_create_child(col, true);
            if created {
                new_nodes += 1;
            }

            let mut child_path = anchor_path;
            child_path.push(child_offset);
            let child = self.root.at_mut(&child_path);
            child.add_row(row);

            self.tentative_index.insert(row, child_path);
            new_rows += 1;
        }

        new_nodes.saturating_mul(u64::from(lambda)) + new_rows
    }

    /// Accepts every tentative node recorded by the last trial: clears its
    /// tentative flag, moves the row out of its former deepest node (if
    /// any), and repoints the committed index at the new, deeper node.
    pub(crate) fn commit(&mut self) {
        for (row, path) in self.tentative_index.drain() {
            {
                let node = self.root.at_mut(&path);
                node.commit();
            }
            if let Some((_, parent_path)) = path.split_last() {
                let parent = self.root.at_mut(parent_path);
                if parent.has_row(row) {
                    parent.remove_row(row);
                }
            }
            self.committed_index.insert(row, path);
        }
    }

    /// Discards every node touched by the last trial. Committed data is
    /// untouched.
    pub(crate) fn rollback(&mut self) {
        let mut anchor_paths: Vec<NodePath> = self
            .tentative_index
            .values()
            .map(|path| path[..path.len().saturating_sub(1)].to_vec())
            .collect();
        anchor_paths.sort();
        anchor_paths.dedup();
        for anchor_path in &anchor_paths {
            self.root.at_mut(anchor_path).remove_tentative_children();
        }
        self.tentative_index.clear();
    }

    /// Walks the committed tree post-order, grouping rows that share a
    /// suffix of two or more columns into shared patterns keyed by the
    /// sorted tuple of rows that reach them.
    ///
    /// The root is itself a branching point (`is_shared` via `children >=
    /// 2`) whenever two or more rows in this trie diverge at their very
    /// first streamed column — the root's sentinel index contributes no
    /// column, so that emission carries an empty column list. It isn't a
    /// real shared suffix, since every suffix row must own at least one
    /// column, so it's dropped here rather than threaded through as a
    /// zero-length suffix row downstream.
    pub(crate) fn shared_patterns(&self) -> BTreeMap<Vec<u32>, Vec<i32>> {
        let mut patterns = BTreeMap::new();
        collect_shared(&self.root, &mut patterns);
        patterns.retain(|_, columns| !columns.is_empty());
        patterns
    }

    /// Walks the committed tree post-order, collecting the columns that
    /// belong to exactly one row into a per-row column list.
    pub(crate) fn unique_patterns(&self) -> FxHashMap<u32, Vec<i32>> {
        let mut patterns = FxHashMap::default();
        collect_unique(&self.root, &mut patterns);
        patterns
    }
}

/// Returns the full set of rows reachable under `node` (its own rows union
/// every child's reachable set), recording a shared-pattern entry the
/// moment a node turns out to be a branching point.
fn collect_shared(node: &TrieNode, patterns: &mut BTreeMap<Vec<u32>, Vec<i32>>) -> Vec<u32> {
    let mut reachable: Vec<u32> = node.rows().to_vec();
    let is_shared = node.is_shared();
    let is_leaf = node.children().is_empty();

    for child in node.children() {
        let child_rows = collect_shared(child, patterns);
        merge_sorted(&mut reachable, &child_rows);
    }

    if is_shared || (is_leaf && reachable.len() > 1) {
        let mut columns = Vec::new();
        if node.index() >= 0 {
            columns.push(node.index());
        }
        patterns.insert(reachable.clone(), columns);
    } else if reachable.len() > 1 {
        if let Some(columns) = patterns.get_mut(&reachable) {
            if node.index() >= 0 {
                columns.push(node.index());
            }
        }
    }

    reachable
}

fn collect_unique(node: &TrieNode, patterns: &mut FxHashMap<u32, Vec<i32>>) -> Vec<u32> {
    let mut reachable: Vec<u32> = node.rows().to_vec();
    let is_shared = node.is_shared();
    let is_leaf = node.children().is_empty();

    for child in node.children() {
        let child_rows = collect_unique(child, patterns);
        merge_sorted(&mut reachable, &child_rows);
    }

    if is_shared || (is_leaf && reachable.len() > 1) {
        return reachable;
    }

    if reachable.len() == 1 {
        let row = reachable[0];
        let entry = patterns.entry(row).or_default();
        if node.index() >= 0 {
            entry.push(node.index());
        }
    }

    reachable
}

/// Merges `other` into `dst`, keeping `dst` sorted and deduplicated. Row
/// sets are small (a handful of rows per suffix in the common case), so a
/// merge over sorted vectors beats a hash-set union here.
fn merge_sorted(dst: &mut Vec<u32>, other: &[u32]) {
    for &row in other {
        if let Err(pos) = dst.binary_search(&row) {
            dst.insert(pos, row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_then_rollback_leaves_trie_untouched() {
        let mut trie = SuffixTrie::new();
        assert!(trie.is_empty());
        let score = trie.false_insert(3, &[0, 1], 2);
        // both rows land under the same freshly-created child of the root:
        // 1 new node, 2 new rows.
        assert_eq!(score, 1 * 2 + 2);
        assert!(!trie.is_empty());
        trie.rollback();
        assert!(trie.is_empty());
        assert!(trie.tentative_index.is_empty());
    }

    #[test]
    fn commit_moves_row_down_one_level() {
        let mut trie = SuffixTrie::new();
        trie.false_insert(5, &[0], 2);
        trie.commit();
        assert!(trie.committed_index.contains_key(&0));

        trie.false_insert(4, &[0], 2);
        trie.commit();

        // row 0 should live only at the deepest node now.
        let path = trie.committed_index.get(&0).unwrap().clone();
        assert_eq!(path.len(), 2);
        let deepest = trie.root.at(&path);
        assert!(deepest.has_row(0));
        let parent = trie.root.at(&path[..1]);
        assert!(!parent.has_row(0));
    }

    #[test]
    fn identical_rows_produce_one_shared_group() {
        let mut trie = SuffixTrie::new();
        for col in [2, 1, 0] {
            trie.false_insert(col, &[0, 1], 2);
            trie.commit();
        }
        let shared = trie.shared_patterns();
        assert_eq!(shared.len(), 1);
        let (rows, cols) = shared.iter().next().unwrap();
        assert_eq!(rows, &vec![0, 1]);
        assert_eq!(cols, &vec![0, 1, 2]);
        assert!(trie.unique_patterns().is_empty());
    }

    #[test]
    fn disjoint_rows_produce_only_unique_patterns() {
        let mut trie = SuffixTrie::new();
        trie.false_insert(1, &[0], 2);
        trie.commit();
        trie.false_insert(0, &[0], 2);
        trie.commit();
        trie.false_insert(3, &[1], 2);
        trie.commit();
        trie.false_insert(2, &[1], 2);
        trie.commit();

        assert!(trie.shared_patterns().is_empty());
        let unique = trie.unique_patterns();
        assert_eq!(unique.get(&0), Some(&vec![0, 1]));
        assert_eq!(unique.get(&1), Some(&vec![2, 3]));
    }
}
