// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! B-tree Ordered Sequence
//!
//! An ordered sequence implemented as a B-tree whose entries are addressed
//! by stable, generational handles.
//!
//! Structure:
//! - Values live in a slot arena; a `Handle` is a slot index plus generation
//! - Leaf nodes store up to LEAF_SIZE slot indices
//! - Internal nodes store up to NODE_SIZE children with subtree item counts
//! - Every slot records the leaf it sits in and its offset inside that leaf
//! - All nodes are stored in Vecs (no raw pointers)
//! - Emptied leaves and nodes are pruned from the tree and their indices
//!   reused, so the arena tracks the live length rather than the edit count
//!
//! Operations:
//! - insert / remove: O(log n) amortized, may trigger splits
//! - handle_at: O(log n), traverse to leaf by counts
//! - index_of: O(log n), walk from the leaf up summing earlier siblings
//! - next / prev: O(1) inside a leaf, O(log n) across a leaf boundary
//! - partition_point: O(log n) predicate calls per level

use std::cmp::Ordering;

const LEAF_SIZE: usize = 64;
const NODE_SIZE: usize = 32;

/// Index into the slot arena.
type SlotIdx = u32;
/// Index into the leaf array.
type LeafIdx = u32;
/// Index into the node array.
type NodeIdx = u32;
/// Sentinel value for no parent / no leaf / no slot.
const NONE: u32 = u32::MAX;

/// A stable reference to one entry of an [`OrderedSequence`].
///
/// Handles survive every structural change except the removal of their own
/// entry. Once removed, a handle never resolves again, even if its slot is
/// reused for a later value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    slot: SlotIdx,
    generation: u32,
}

impl Handle {
    /// A handle that never refers to a live entry.
    pub const NONE: Handle = Handle { slot: NONE, generation: 0 };

    #[inline(always)]
    pub fn is_none(&self) -> bool {
        return self.slot == NONE;
    }
}

impl Default for Handle {
    fn default() -> Self {
        return Handle::NONE;
    }
}

#[derive(Clone, Debug)]
struct Slot<V> {
    value: Option<V>,
    generation: u32,
    /// Leaf holding this slot (NONE while unlinked).
    leaf: LeafIdx,
    /// Offset of this slot within its leaf.
    offset: u32,
}

/// A leaf node listing slots in order.
#[derive(Clone, Debug)]
struct Leaf {
    items: Vec<SlotIdx>,
    /// Parent node index (NONE for root leaf).
    parent: NodeIdx,
    /// Index of this leaf in the parent's children array.
    index_in_parent: u8,
}

impl Leaf {
    fn new() -> Leaf {
        return Leaf {
            items: Vec::with_capacity(LEAF_SIZE),
            parent: NONE,
            index_in_parent: 0,
        };
    }

    #[inline(always)]
    fn len(&self) -> usize {
        return self.items.len();
    }

    #[inline(always)]
    fn is_full(&self) -> bool {
        return self.items.len() >= LEAF_SIZE;
    }
}

/// An internal node containing child indices and subtree counts.
#[derive(Clone, Debug)]
struct Node {
    /// Child indices. For height > 1, these are NodeIdx into nodes array.
    /// For height == 1, these are LeafIdx into leaves array.
    children: Vec<u32>,
    /// Item count of each child's subtree.
    child_counts: Vec<usize>,
    /// Total item count in subtree.
    total_count: usize,
    /// Parent node index (NONE for root).
    parent: NodeIdx,
    /// Index of this node in the parent's children array.
    index_in_parent: u8,
}

impl Node {
    fn new() -> Node {
        return Node {
            children: Vec::with_capacity(NODE_SIZE),
            child_counts: Vec::with_capacity(NODE_SIZE),
            total_count: 0,
            parent: NONE,
            index_in_parent: 0,
        };
    }

    #[inline(always)]
    fn is_full(&self) -> bool {
        return self.children.len() >= NODE_SIZE;
    }

    /// Find the child containing the given item index.
    /// Returns (child_index, offset_in_child).
    #[inline]
    fn find_child_by_index(&self, index: usize) -> (usize, usize) {
        let mut cumulative = 0usize;
        for (i, &count) in self.child_counts.iter().enumerate() {
            let next = cumulative + count;
            if next > index {
                return (i, index - cumulative);
            }
            cumulative = next;
        }
        // Return last child with the excess
        let last = self.children.len().saturating_sub(1);
        return (last, index - cumulative + self.child_counts[last]);
    }

    /// Split this node, returning the right half.
    fn split(&mut self) -> Node {
        let mid = self.children.len() / 2;
        let right_children: Vec<_> = self.children.drain(mid..).collect();
        let right_counts: Vec<_> = self.child_counts.drain(mid..).collect();
        let right_count: usize = right_counts.iter().sum();
        self.total_count -= right_count;

        return Node {
            children: right_children,
            child_counts: right_counts,
            total_count: right_count,
            parent: NONE,
            index_in_parent: 0,
        };
    }
}

/// An ordered sequence implemented as a B-tree with stable handles.
pub struct OrderedSequence<V> {
    slots: Vec<Slot<V>>,
    /// Slots whose values were removed, ready for reuse.
    free_slots: Vec<SlotIdx>,
    leaves: Vec<Leaf>,
    /// Pruned leaves, ready for reuse.
    free_leaves: Vec<LeafIdx>,
    nodes: Vec<Node>,
    /// Pruned nodes, ready for reuse.
    free_nodes: Vec<NodeIdx>,
    /// Root index. If height == 0, this is a LeafIdx. Otherwise NodeIdx.
    root: u32,
    /// Tree height. 0 means root is a leaf.
    height: usize,
    /// Number of linked entries.
    len: usize,
}

impl<V> OrderedSequence<V> {
    pub fn new() -> OrderedSequence<V> {
        return OrderedSequence {
            slots: Vec::new(),
            free_slots: Vec::new(),
            leaves: vec![Leaf::new()],
            free_leaves: Vec::new(),
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            root: 0,
            height: 0,
            len: 0,
        };
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.len;
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    #[inline]
    fn live_slot(&self, handle: Handle) -> Option<&Slot<V>> {
        let slot = self.slots.get(handle.slot as usize)?;
        if slot.generation != handle.generation || slot.value.is_none() {
            return None;
        }
        return Some(slot);
    }

    #[inline(always)]
    fn handle_of(&self, slot: SlotIdx) -> Handle {
        return Handle { slot, generation: self.slots[slot as usize].generation };
    }

    pub fn contains(&self, handle: Handle) -> bool {
        return self.live_slot(handle).is_some();
    }

    pub fn get(&self, handle: Handle) -> Option<&V> {
        return self.live_slot(handle)?.value.as_ref();
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut V> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        return slot.value.as_mut();
    }

    /// Handle of the entry at the given logical index.
    pub fn handle_at(&self, index: usize) -> Option<Handle> {
        if index >= self.len {
            return None;
        }
        let (leaf_idx, offset) = self.find_leaf_by_index(index);
        let slot = *self.leaves[leaf_idx as usize].items.get(offset)?;
        return Some(self.handle_of(slot));
    }

    pub fn first(&self) -> Option<Handle> {
        return self.handle_at(0);
    }

    pub fn last(&self) -> Option<Handle> {
        return self.handle_at(self.len.checked_sub(1)?);
    }

    /// Logical index of a live entry.
    pub fn index_of(&self, handle: Handle) -> Option<usize> {
        let slot = self.live_slot(handle)?;
        if slot.leaf == NONE {
            return None;
        }

        let leaf = &self.leaves[slot.leaf as usize];
        let mut index = slot.offset as usize;
        let mut parent = leaf.parent;
        let mut child_index = leaf.index_in_parent as usize;

        while parent != NONE {
            let node = &self.nodes[parent as usize];
            index += node.child_counts[..child_index].iter().sum::<usize>();
            child_index = node.index_in_parent as usize;
            parent = node.parent;
        }
        return Some(index);
    }

    /// The entry after `handle`, if any.
    pub fn next(&self, handle: Handle) -> Option<Handle> {
        let slot = self.live_slot(handle)?;
        if slot.leaf == NONE {
            return None;
        }
        let leaf = &self.leaves[slot.leaf as usize];
        if let Some(&next) = leaf.items.get(slot.offset as usize + 1) {
            return Some(self.handle_of(next));
        }
        let index = self.index_of(handle)?;
        return self.handle_at(index + 1);
    }

    /// The entry before `handle`, if any.
    pub fn prev(&self, handle: Handle) -> Option<Handle> {
        let slot = self.live_slot(handle)?;
        if slot.leaf == NONE {
            return None;
        }
        if slot.offset > 0 {
            let leaf = &self.leaves[slot.leaf as usize];
            return Some(self.handle_of(leaf.items[slot.offset as usize - 1]));
        }
        let index = self.index_of(handle)?;
        return self.handle_at(index.checked_sub(1)?);
    }

    /// Insert a value at the given index, returning its handle.
    pub fn insert(&mut self, index: usize, value: V) -> Handle {
        assert!(index <= self.len, "insert index {index} beyond length {}", self.len);
        let slot = self.alloc_slot(value);
        self.link(index, slot);
        return self.handle_of(slot);
    }

    pub fn push(&mut self, value: V) -> Handle {
        return self.insert(self.len, value);
    }

    /// Remove an entry, returning its value. The handle is dead afterwards.
    pub fn remove(&mut self, handle: Handle) -> Option<V> {
        let linked = self.live_slot(handle)?.leaf != NONE;
        if linked {
            self.unlink(handle.slot);
        }
        return self.free_slot(handle.slot);
    }

    pub fn remove_at(&mut self, index: usize) -> Option<V> {
        let handle = self.handle_at(index)?;
        return self.remove(handle);
    }

    /// Remove every entry. All outstanding handles die.
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                slot.leaf = NONE;
                self.free_slots.push(i as SlotIdx);
            }
        }
        self.reset_layout();
    }

    /// Number of entries for which `pred` holds, assuming the sequence is
    /// partitioned by `pred` (all `true` entries precede all `false` ones).
    pub fn partition_point<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(Handle, &V) -> bool,
    {
        let mut before = 0usize;
        let mut current = self.root;
        let mut height = self.height;

        while height > 0 {
            let node = &self.nodes[current as usize];
            let mut chosen = None;
            let mut running = 0usize;
            for (i, &child) in node.children.iter().enumerate() {
                let count = node.child_counts[i];
                if count == 0 {
                    continue;
                }
                let first = self.first_slot(child, height - 1);
                if !self.test(first, &mut pred) {
                    break;
                }
                chosen = Some((child, running));
                running += count;
            }
            let Some((child, skipped)) = chosen else {
                return before;
            };
            before += skipped;
            current = child;
            height -= 1;
        }

        let leaf = &self.leaves[current as usize];
        return before + leaf.items.partition_point(|&slot| self.test(slot, &mut pred));
    }

    /// Take `count` entries starting at `start` out of the order. Their
    /// values and handles stay alive until passed to `attach_range`;
    /// meanwhile `index_of` reports them as absent.
    pub fn detach_range(&mut self, start: usize, count: usize) -> Vec<Handle> {
        assert!(start + count <= self.len, "range {start}+{count} beyond length {}", self.len);

        let mut detached = Vec::with_capacity(count);
        for _ in 0..count {
            let (leaf_idx, offset) = self.find_leaf_by_index(start);
            let slot = self.leaves[leaf_idx as usize].items[offset];
            self.unlink(slot);
            detached.push(self.handle_of(slot));
        }
        return detached;
    }

    /// Put detached entries back, in order, starting at `index`.
    pub fn attach_range(&mut self, index: usize, detached: Vec<Handle>) {
        assert!(index <= self.len, "attach index {index} beyond length {}", self.len);

        let mut at = index;
        for handle in detached {
            let Some(slot) = self.live_slot(handle) else {
                continue;
            };
            if slot.leaf != NONE {
                continue;
            }
            self.link(at, handle.slot);
            at += 1;
        }
    }

    /// Lay the sequence out again in the given order. `order` must list
    /// every live handle exactly once; handles stay valid.
    pub fn rearrange<I>(&mut self, order: I)
    where
        I: IntoIterator<Item = Handle>,
    {
        let expected = self.len;
        for leaf in &self.leaves {
            for &slot in &leaf.items {
                self.slots[slot as usize].leaf = NONE;
            }
        }
        self.reset_layout();

        for handle in order {
            let Some(slot) = self.slots.get(handle.slot as usize) else {
                continue;
            };
            if slot.generation != handle.generation || slot.value.is_none() || slot.leaf != NONE {
                continue;
            }
            self.link(self.len, handle.slot);
        }
        debug_assert_eq!(self.len, expected, "rearrange must list every live handle once");
    }

    /// Stable sort of the entries by value. Handles stay valid.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        let mut order: Vec<Handle> = self.handles().collect();
        order.sort_by(|a, b| match (self.get(*a), self.get(*b)) {
            (Some(x), Some(y)) => compare(x, y),
            _ => Ordering::Equal,
        });
        self.rearrange(order);
    }

    pub fn iter(&self) -> Iter<'_, V> {
        return Iter {
            sequence: self,
            leaf_order: self.collect_leaves_in_order(),
            leaf_pos: 0,
            item_idx: 0,
        };
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        return self.iter().map(|(handle, _)| handle);
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        return self.iter().map(|(_, value)| value);
    }

    fn alloc_slot(&mut self, value: V) -> SlotIdx {
        if let Some(idx) = self.free_slots.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.value = Some(value);
            slot.leaf = NONE;
            slot.offset = 0;
            return idx;
        }
        let idx = self.slots.len() as SlotIdx;
        self.slots.push(Slot { value: Some(value), generation: 0, leaf: NONE, offset: 0 });
        return idx;
    }

    fn free_slot(&mut self, idx: SlotIdx) -> Option<V> {
        let slot = &mut self.slots[idx as usize];
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.leaf = NONE;
        self.free_slots.push(idx);
        return Some(value);
    }

    fn alloc_leaf(&mut self) -> LeafIdx {
        if let Some(idx) = self.free_leaves.pop() {
            self.leaves[idx as usize] = Leaf::new();
            return idx;
        }
        let idx = self.leaves.len() as LeafIdx;
        self.leaves.push(Leaf::new());
        return idx;
    }

    fn alloc_node(&mut self) -> NodeIdx {
        if let Some(idx) = self.free_nodes.pop() {
            self.nodes[idx as usize] = Node::new();
            return idx;
        }
        let idx = self.nodes.len() as NodeIdx;
        self.nodes.push(Node::new());
        return idx;
    }

    /// Drop every node, leaving a single empty root leaf. Slots keep their
    /// values but must be relinked.
    fn reset_layout(&mut self) {
        self.leaves.clear();
        self.leaves.push(Leaf::new());
        self.free_leaves.clear();
        self.nodes.clear();
        self.free_nodes.clear();
        self.root = 0;
        self.height = 0;
        self.len = 0;
    }

    #[inline]
    fn test<P>(&self, slot: SlotIdx, pred: &mut P) -> bool
    where
        P: FnMut(Handle, &V) -> bool,
    {
        let Some(value) = self.slots.get(slot as usize).and_then(|s| s.value.as_ref()) else {
            return false;
        };
        return pred(self.handle_of(slot), value);
    }

    /// First slot of a non-empty subtree.
    fn first_slot(&self, mut id: u32, mut height: usize) -> SlotIdx {
        while height > 0 {
            let node = &self.nodes[id as usize];
            let i = node.child_counts.iter().position(|&count| count > 0).unwrap_or(0);
            id = node.children[i];
            height -= 1;
        }
        return self.leaves[id as usize].items.first().copied().unwrap_or(NONE);
    }

    /// Find the leaf containing the given item index.
    /// Returns (leaf_idx, index_in_leaf).
    #[inline]
    fn find_leaf_by_index(&self, index: usize) -> (LeafIdx, usize) {
        if index >= self.len {
            // For insert at end
            if self.height == 0 {
                return (self.root, self.leaves[self.root as usize].len());
            }
            // Find the rightmost leaf
            let mut node_idx = self.root;
            let mut current_height = self.height;
            loop {
                let node = &self.nodes[node_idx as usize];
                let last = node.children[node.children.len() - 1];
                if current_height == 1 {
                    return (last, self.leaves[last as usize].len());
                }
                node_idx = last;
                current_height -= 1;
            }
        }

        if self.height == 0 {
            return (self.root, index);
        }

        let mut node_idx = self.root;
        let mut offset = index;
        let mut current_height = self.height;

        while current_height > 1 {
            let node = &self.nodes[node_idx as usize];
            let (child_idx, new_offset) = node.find_child_by_index(offset);
            node_idx = node.children[child_idx];
            offset = new_offset;
            current_height -= 1;
        }

        // At height 1, children are leaves
        let node = &self.nodes[node_idx as usize];
        let (child_idx, new_offset) = node.find_child_by_index(offset);
        return (node.children[child_idx], new_offset);
    }

    /// Update counts in ancestors after a leaf gained or lost items.
    #[inline]
    fn update_ancestors(&mut self, leaf_idx: LeafIdx, delta: isize) {
        let leaf = &self.leaves[leaf_idx as usize];
        let mut parent = leaf.parent;
        let mut child_index = leaf.index_in_parent as usize;

        while parent != NONE {
            let node = &mut self.nodes[parent as usize];
            node.child_counts[child_index] = node.child_counts[child_index].wrapping_add_signed(delta);
            node.total_count = node.total_count.wrapping_add_signed(delta);
            child_index = node.index_in_parent as usize;
            parent = node.parent;
        }
    }

    /// Place an unlinked slot at the given index.
    fn link(&mut self, index: usize, slot: SlotIdx) {
        let (leaf_idx, offset) = self.find_leaf_by_index(index);

        let leaf = &mut self.leaves[leaf_idx as usize];
        leaf.items.insert(offset, slot);
        for i in offset..leaf.items.len() {
            let shifted = &mut self.slots[leaf.items[i] as usize];
            shifted.leaf = leaf_idx;
            shifted.offset = i as u32;
        }
        self.len += 1;

        if self.height > 0 {
            self.update_ancestors(leaf_idx, 1);
        }

        if self.leaves[leaf_idx as usize].is_full() {
            self.split_leaf(leaf_idx);
        }
    }

    /// Take a linked slot out of the tree, keeping its value.
    fn unlink(&mut self, slot: SlotIdx) {
        let leaf_idx = self.slots[slot as usize].leaf;
        let offset = self.slots[slot as usize].offset as usize;

        let leaf = &mut self.leaves[leaf_idx as usize];
        leaf.items.remove(offset);
        for i in offset..leaf.items.len() {
            self.slots[leaf.items[i] as usize].offset = i as u32;
        }
        self.slots[slot as usize].leaf = NONE;
        self.len -= 1;

        if self.height > 0 {
            self.update_ancestors(leaf_idx, -1);
        }

        // Underflowed nodes are never merged. Empty ones are pruned, and an
        // emptied tree starts over.
        if self.len == 0 {
            self.reset_layout();
            return;
        }
        let leaf = &self.leaves[leaf_idx as usize];
        if leaf.items.is_empty() && leaf.parent != NONE {
            let (parent, child_index) = (leaf.parent, leaf.index_in_parent as usize);
            self.free_leaves.push(leaf_idx);
            self.remove_child(parent, child_index, 1);
            self.collapse_root();
        }
    }

    /// Drop the empty child at `child_index` of `node_idx`, whose children
    /// sit `height` levels above the leaves. Pruning cascades upward while
    /// nodes run out of children.
    fn remove_child(&mut self, node_idx: NodeIdx, child_index: usize, height: usize) {
        let node = &mut self.nodes[node_idx as usize];
        debug_assert_eq!(node.child_counts[child_index], 0);
        node.children.remove(child_index);
        node.child_counts.remove(child_index);

        for i in child_index..self.nodes[node_idx as usize].children.len() {
            let child = self.nodes[node_idx as usize].children[i] as usize;
            if height == 1 {
                self.leaves[child].index_in_parent = i as u8;
            } else {
                self.nodes[child].index_in_parent = i as u8;
            }
        }

        let node = &self.nodes[node_idx as usize];
        if node.children.is_empty() && node.parent != NONE {
            let (parent, index_in_parent) = (node.parent, node.index_in_parent as usize);
            self.free_nodes.push(node_idx);
            self.remove_child(parent, index_in_parent, height + 1);
        }
    }

    /// Replace a root node that has a single child by that child.
    fn collapse_root(&mut self) {
        while self.height > 0 && self.nodes[self.root as usize].children.len() == 1 {
            let child = self.nodes[self.root as usize].children[0];
            self.free_nodes.push(self.root);
            if self.height == 1 {
                self.leaves[child as usize].parent = NONE;
                self.leaves[child as usize].index_in_parent = 0;
            } else {
                self.nodes[child as usize].parent = NONE;
                self.nodes[child as usize].index_in_parent = 0;
            }
            self.root = child;
            self.height -= 1;
        }
    }

    /// Split a full leaf.
    fn split_leaf(&mut self, leaf_idx: LeafIdx) {
        let leaf = &mut self.leaves[leaf_idx as usize];
        let mid = leaf.items.len() / 2;
        let right_items: Vec<SlotIdx> = leaf.items.drain(mid..).collect();
        let left_count = leaf.items.len();
        let right_count = right_items.len();

        let right_idx = self.alloc_leaf();
        for (i, &slot) in right_items.iter().enumerate() {
            let moved = &mut self.slots[slot as usize];
            moved.leaf = right_idx;
            moved.offset = i as u32;
        }
        self.leaves[right_idx as usize].items = right_items;

        if self.height == 0 {
            // Root is a leaf, need to create a new root node
            let new_root = self.alloc_node();
            let root = &mut self.nodes[new_root as usize];
            root.children.push(leaf_idx);
            root.children.push(right_idx);
            root.child_counts.push(left_count);
            root.child_counts.push(right_count);
            root.total_count = left_count + right_count;

            self.leaves[leaf_idx as usize].parent = new_root;
            self.leaves[leaf_idx as usize].index_in_parent = 0;
            self.leaves[right_idx as usize].parent = new_root;
            self.leaves[right_idx as usize].index_in_parent = 1;

            self.root = new_root;
            self.height = 1;
        } else {
            // Insert right leaf into parent
            let parent = self.leaves[leaf_idx as usize].parent;
            let idx_in_parent = self.leaves[leaf_idx as usize].index_in_parent as usize;

            let node = &mut self.nodes[parent as usize];
            node.child_counts[idx_in_parent] = left_count;
            node.children.insert(idx_in_parent + 1, right_idx);
            node.child_counts.insert(idx_in_parent + 1, right_count);

            // Update indices for siblings after the insertion
            for i in (idx_in_parent + 2)..node.children.len() {
                self.leaves[node.children[i] as usize].index_in_parent = i as u8;
            }

            self.leaves[right_idx as usize].parent = parent;
            self.leaves[right_idx as usize].index_in_parent = (idx_in_parent + 1) as u8;

            if self.nodes[parent as usize].is_full() {
                self.split_node(parent, 1);
            }
        }
    }

    /// Split a full internal node whose children sit `height` levels above
    /// the leaves (1 means the children are leaves).
    fn split_node(&mut self, node_idx: NodeIdx, height: usize) {
        let right = self.nodes[node_idx as usize].split();
        let right_count = right.total_count;
        let left_count = self.nodes[node_idx as usize].total_count;

        let right_idx = self.alloc_node();
        self.nodes[right_idx as usize] = right;

        // Update parent pointers for children in the right node
        let right_children: Vec<u32> = self.nodes[right_idx as usize].children.clone();
        if height == 1 {
            for (i, &child_idx) in right_children.iter().enumerate() {
                self.leaves[child_idx as usize].parent = right_idx;
                self.leaves[child_idx as usize].index_in_parent = i as u8;
            }
        } else {
            for (i, &child_idx) in right_children.iter().enumerate() {
                self.nodes[child_idx as usize].parent = right_idx;
                self.nodes[child_idx as usize].index_in_parent = i as u8;
            }
        }

        if self.nodes[node_idx as usize].parent == NONE {
            // This is the root, create new root
            let new_root = self.alloc_node();
            let root = &mut self.nodes[new_root as usize];
            root.children.push(node_idx);
            root.children.push(right_idx);
            root.child_counts.push(left_count);
            root.child_counts.push(right_count);
            root.total_count = left_count + right_count;

            self.nodes[node_idx as usize].parent = new_root;
            self.nodes[node_idx as usize].index_in_parent = 0;
            self.nodes[right_idx as usize].parent = new_root;
            self.nodes[right_idx as usize].index_in_parent = 1;

            self.root = new_root;
            self.height += 1;
        } else {
            // Insert right node into parent
            let parent = self.nodes[node_idx as usize].parent;
            let idx_in_parent = self.nodes[node_idx as usize].index_in_parent as usize;

            let node = &mut self.nodes[parent as usize];
            node.child_counts[idx_in_parent] = left_count;
            node.children.insert(idx_in_parent + 1, right_idx);
            node.child_counts.insert(idx_in_parent + 1, right_count);

            let shifted: Vec<u32> = node.children[idx_in_parent + 2..].to_vec();
            for (k, child_idx) in shifted.into_iter().enumerate() {
                self.nodes[child_idx as usize].index_in_parent = (idx_in_parent + 2 + k) as u8;
            }

            self.nodes[right_idx as usize].parent = parent;
            self.nodes[right_idx as usize].index_in_parent = (idx_in_parent + 1) as u8;

            if self.nodes[parent as usize].is_full() {
                self.split_node(parent, height + 1);
            }
        }
    }

    /// Collect leaf indices in sequence order by traversing the tree.
    fn collect_leaves_in_order(&self) -> Vec<LeafIdx> {
        let mut result = Vec::new();
        if self.height == 0 {
            result.push(self.root);
        } else {
            self.collect_leaves_recursive(self.root, self.height, &mut result);
        }
        return result;
    }

    /// Recursively collect leaf indices from a subtree.
    fn collect_leaves_recursive(&self, node_idx: NodeIdx, height: usize, result: &mut Vec<LeafIdx>) {
        let node = &self.nodes[node_idx as usize];
        if height == 1 {
            result.extend_from_slice(&node.children);
        } else {
            for &child_idx in &node.children {
                self.collect_leaves_recursive(child_idx, height - 1, result);
            }
        }
    }
}

impl<V> Default for OrderedSequence<V> {
    fn default() -> Self {
        return Self::new();
    }
}

/// Iterator over `(handle, value)` pairs in sequence order.
pub struct Iter<'a, V> {
    sequence: &'a OrderedSequence<V>,
    /// Leaf indices in sequence order.
    leaf_order: Vec<LeafIdx>,
    /// Current position in leaf_order.
    leaf_pos: usize,
    /// Current position within the leaf.
    item_idx: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (Handle, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let sequence = self.sequence;
        while self.leaf_pos < self.leaf_order.len() {
            let leaf = &sequence.leaves[self.leaf_order[self.leaf_pos] as usize];
            if let Some(&slot) = leaf.items.get(self.item_idx) {
                self.item_idx += 1;
                if let Some(value) = sequence.slots[slot as usize].value.as_ref() {
                    return Some((sequence.handle_of(slot), value));
                }
                continue;
            }
            self.leaf_pos += 1;
            self.item_idx = 0;
        }
        return None;
    }
}
