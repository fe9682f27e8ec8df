use smallvec::SmallVec;

/// Sentinel column index carried by the root of every trie: the root
/// represents "no column consumed yet", not a real column.
pub(crate) const ROOT_INDEX: i32 = -1;

/// A single cell of a [`crate::trie::SuffixTrie`].
///
/// The path from the root to any node, read root-to-leaf, is a column
/// sequence in the order columns were streamed into the forest — reverse
/// matrix-column order — so a root-to-leaf path is a row's suffix read
/// right-to-left.
///
/// Children are owned directly (`Vec<TrieNode>`); there is no parent
/// back-pointer. Callers that need to walk from a row up to its anchor use
/// the row's stored *path* (a sequence of child offsets from the root,
/// see [`crate::trie::SuffixTrie`]) rather than a pointer, which keeps the
/// whole structure free of aliasing and avoids an arena indirection layer.
#[derive(Debug, Clone)]
pub(crate) struct TrieNode {
    index: i32,
    children: Vec<TrieNode>,
    /// Rows known to terminate their current known suffix at this node.
    /// Kept sorted so membership and insertion are binary-search cheap.
    rows: SmallVec<[u32; 4]>,
    tentative: bool,
}

impl TrieNode {
    pub(crate) fn root() -> Self {
        TrieNode {
            index: ROOT_INDEX,
            children: Vec::new(),
            rows: SmallVec::new(),
            tentative: false,
        }
    }

    fn new(index: i32, tentative: bool) -> Self {
        TrieNode {
            index,
            children: Vec::new(),
            rows: SmallVec::new(),
            tentative,
        }
    }

    pub(crate) fn index(&self) -> i32 {
        self.index
    }

    pub(crate) fn children(&self) -> &[TrieNode] {
        &self.children
    }

    pub(crate) fn rows(&self) -> &[u32] {
        &self.rows
    }

    pub(crate) fn tentative(&self) -> bool {
        self.tentative
    }

    /// Returns the offset of the child with column `idx`, creating it (with
    /// the given tentative flag) if it doesn't already exist. A child that
    /// already exists never has its tentative flag flipped — tentativeness
    /// is only ever cleared by an explicit [`TrieNode::commit`].
    ///
    /// Returns `(offset, created)`.
    pub(crate) fn find_or_create_child(&mut self, idx: i32, tentative: bool) -> (usize, bool) {
        if let Some(pos) = self.children.iter().position(|c| c.index == idx) {
            (pos, false)
        } else {
            self.children.push(TrieNode::new(idx, tentative));
            (self.children.len() - 1, true)
        }
    }

    /// Drops every direct child whose `tentative` flag is true. Deep
    /// descendants of a dropped child go with it, since children are owned.
    pub(crate) fn remove_tentative_children(&mut self) {
        self.children.retain(|c| !c.tentative);
    }

    pub(crate) fn add_row(&mut self, row: u32) {
        if let Err(pos) = self.rows.binary_search(&row) {
            self.rows.insert(pos, row);
        }
    }

    pub(crate) fn remove_row(&mut self, row: u32) {
        if let Ok(pos) = self.rows.binary_search(&row) {
            self.rows.remove(pos);
        }
    }

    pub(crate) fn has_row(&self, row: u32) -> bool {
        self.rows.binary_search(&row).is_ok()
    }

    /// Clears `tentative` (idempotent).
    pub(crate) fn commit(&mut self) {
        self.tentative = false;
    }

    /// A node is a branching point for suffix extraction iff it has two or
    /// more children, two or more rows, or a mix of at least one of each.
    pub(crate) fn is_shared(&self) -> bool {
        self.children.len() >= 2
            || self.rows.len() >= 2
            || (!self.children.is_empty() && !self.rows.is_empty())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.children.is_empty() && self.rows.is_empty()
    }

    /// Navigates `path` (a sequence of child offsets from `self`) and
    /// returns the node it leads to. `path` is always produced by this
    /// crate (row→node indices), so it is always in range.
    pub(crate) fn at(&self, path: &[usize]) -> &TrieNode {
        let mut node = self;
        for &offset in path {
            node = &node.children[offset];
        }
        node
    }

    pub(crate) fn at_mut(&mut self, path: &[usize]) -> &mut TrieNode {
        let mut node = self;
        for &offset in path {
            node = &mut node.children[offset];
        }
        node
    }
}
