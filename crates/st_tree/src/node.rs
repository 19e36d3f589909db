//! Node model for the virtual trees: arena, handles, and the forest
//! registry.
//!
//! Every preferred path is represented by a strictly binary virtual tree
//! whose leaves are the path's vertices and whose internal nodes stand
//! for the solid edges between consecutive vertices. Both kinds live in
//! one arena addressed by stable [`Id`] handles; vertices are allocated
//! once and never reclaimed, edge nodes are minted by `concatenate` and
//! retired to a free list by `split`.

use std::collections::{HashMap, HashSet};

use crate::forest::StTree;
use crate::partition::Partition;

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Id(pub(crate) u32);

impl Id {
    pub(crate) const NIL: Self = Self(u32::MAX);

    #[inline(always)]
    pub(crate) fn is_nil(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline(always)]
    pub(crate) fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a vertex of the forest. The index doubles as the vertex's
/// unique name.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub(crate) u32);

impl VertexId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub(crate) fn id(self) -> Id {
        Id(self.0)
    }
}

/// Identifier of a multi-vertex preferred path, minted by the registry's
/// monotone counter. Singleton paths are stood in for by their sole
/// vertex and carry no identifier.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PathId(pub(crate) u64);

/// A vertex: a leaf of some virtual tree.
#[derive(Clone, Debug)]
pub(crate) struct Leaf {
    /// Vertex count of the represented subtree at construction time.
    /// Only ever read back as the initial weight seed.
    pub(crate) size: u64,
    /// Current balancing weight: the vertex itself plus the subtrees
    /// hanging off it through dashed edges. Adjusted only while the
    /// vertex is a singleton path.
    pub(crate) weight: u64,
    /// Parent in the virtual tree; `NIL` iff the vertex is the sole
    /// element of its path.
    pub(crate) vparent: Id,
    /// Dashed edge to the parent in the represented tree; `NIL` iff the
    /// vertex is a tree root or its parent edge is currently solid.
    pub(crate) dparent: Id,
    /// Cost of the dashed parent edge; meaningful iff `dparent` is set.
    pub(crate) dcost: i64,
    /// Tails of the paths hanging off this vertex through dashed edges.
    /// Maintained only under partitioning by size.
    pub(crate) path_set: Vec<Id>,
}

/// A solid edge: an internal node of some virtual tree spanning the
/// vertices between `bhead` and `btail`.
#[derive(Clone, Debug)]
pub(crate) struct Edge {
    pub(crate) ch: [Id; 2],
    pub(crate) parent: Id,
    /// Leftmost / rightmost spanned vertex under the node's current
    /// orientation. Swapped together with the children by `apply_rev`.
    pub(crate) bhead: Id,
    pub(crate) btail: Id,
    /// Lazy cost decomposition: the cost of this edge equals `netcost`
    /// plus the sum of `netmin` from this node up to its virtual root.
    pub(crate) netmin: i64,
    pub(crate) netcost: i64,
    pub(crate) rank: u32,
    /// Sum of the children's weights.
    pub(crate) weight: u64,
    /// Pending orientation flip for the whole subtree.
    pub(crate) rev: bool,
    /// Path identifier; meaningful while this node is a virtual root.
    pub(crate) path: PathId,
}

#[derive(Clone, Debug)]
pub(crate) enum Node {
    Leaf(Leaf),
    Edge(Edge),
}

impl Node {
    /// Balance rank, uniform over both node kinds: a vertex reports the
    /// log2-floor of its weight, an edge its stored rank.
    #[inline]
    pub(crate) fn rank(&self) -> u32 {
        match self {
            Node::Leaf(l) => 63 - l.weight.max(1).leading_zeros(),
            Node::Edge(e) => e.rank,
        }
    }

    /// Net-min, uniform over both node kinds: vertices carry no real
    /// net-min, so they report a sentinel greater than any edge cost and
    /// never win a min search.
    #[inline]
    pub(crate) fn net_min(&self) -> i64 {
        match self {
            Node::Leaf(_) => i64::MAX,
            Node::Edge(e) => e.netmin,
        }
    }

    #[inline]
    pub(crate) fn weight(&self) -> u64 {
        match self {
            Node::Leaf(l) => l.weight,
            Node::Edge(e) => e.weight,
        }
    }
}

/// The collection of vertex-disjoint trees: singleton-path vertices,
/// multi-vertex path roots, and the counter minting path identifiers.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub(crate) path_roots: HashMap<PathId, Id>,
    pub(crate) basic_roots: HashSet<Id>,
    next_path: u64,
}

impl Registry {
    pub(crate) fn mint_path_id(&mut self) -> PathId {
        self.next_path += 1;
        PathId(self.next_path)
    }
}

impl<S: Partition> StTree<S> {
    #[inline(always)]
    pub(crate) fn node(&self, x: Id) -> &Node {
        debug_assert!(!x.is_nil());
        debug_assert!(x.idx() < self.nodes.len());
        if cfg!(debug_assertions) {
            &self.nodes[x.idx()]
        } else {
            // SAFETY: `Id` values are only created from valid indices and `NIL` is checked.
            unsafe { self.nodes.get_unchecked(x.idx()) }
        }
    }

    #[inline(always)]
    pub(crate) fn node_mut(&mut self, x: Id) -> &mut Node {
        debug_assert!(!x.is_nil());
        debug_assert!(x.idx() < self.nodes.len());
        if cfg!(debug_assertions) {
            &mut self.nodes[x.idx()]
        } else {
            // SAFETY: `Id` values are only created from valid indices and `NIL` is checked.
            unsafe { self.nodes.get_unchecked_mut(x.idx()) }
        }
    }

    #[inline(always)]
    pub(crate) fn leaf(&self, x: Id) -> &Leaf {
        match self.node(x) {
            Node::Leaf(l) => l,
            Node::Edge(_) => unreachable!("vertex handle resolved to an edge node"),
        }
    }

    #[inline(always)]
    pub(crate) fn leaf_mut(&mut self, x: Id) -> &mut Leaf {
        match self.node_mut(x) {
            Node::Leaf(l) => l,
            Node::Edge(_) => unreachable!("vertex handle resolved to an edge node"),
        }
    }

    #[inline(always)]
    pub(crate) fn edge(&self, x: Id) -> &Edge {
        match self.node(x) {
            Node::Edge(e) => e,
            Node::Leaf(_) => unreachable!("edge handle resolved to a vertex"),
        }
    }

    #[inline(always)]
    pub(crate) fn edge_mut(&mut self, x: Id) -> &mut Edge {
        match self.node_mut(x) {
            Node::Edge(e) => e,
            Node::Leaf(_) => unreachable!("edge handle resolved to a vertex"),
        }
    }

    #[inline(always)]
    pub(crate) fn is_leaf(&self, x: Id) -> bool {
        matches!(self.node(x), Node::Leaf(_))
    }

    #[inline(always)]
    pub(crate) fn rank_of(&self, x: Id) -> u32 {
        self.node(x).rank()
    }

    #[inline(always)]
    pub(crate) fn net_min_of(&self, x: Id) -> i64 {
        self.node(x).net_min()
    }

    #[inline(always)]
    pub(crate) fn weight_of(&self, x: Id) -> u64 {
        self.node(x).weight()
    }

    /// Virtual-tree parent, uniform over both node kinds.
    #[inline(always)]
    pub(crate) fn parent_of(&self, x: Id) -> Id {
        match self.node(x) {
            Node::Leaf(l) => l.vparent,
            Node::Edge(e) => e.parent,
        }
    }

    #[inline(always)]
    pub(crate) fn set_parent(&mut self, x: Id, p: Id) {
        match self.node_mut(x) {
            Node::Leaf(l) => l.vparent = p,
            Node::Edge(e) => e.parent = p,
        }
    }

    /// Head (leftmost vertex) of the subtree rooted at `x`, honoring
    /// pending orientation flips. O(1): boundary vertices are maintained
    /// on every edge node.
    #[inline(always)]
    pub(crate) fn head_of(&self, x: Id) -> Id {
        match self.node(x) {
            Node::Leaf(_) => x,
            Node::Edge(e) => e.bhead,
        }
    }

    /// Tail (rightmost vertex) of the subtree rooted at `x`.
    #[inline(always)]
    pub(crate) fn tail_of(&self, x: Id) -> Id {
        match self.node(x) {
            Node::Leaf(_) => x,
            Node::Edge(e) => e.btail,
        }
    }

    /// Root of the virtual tree containing `x`; `x` itself for a
    /// singleton path.
    pub(crate) fn path_root(&self, x: Id) -> Id {
        let mut y = x;
        loop {
            let p = self.parent_of(y);
            if p.is_nil() {
                return y;
            }
            y = p;
        }
    }

    pub(crate) fn alloc_edge(&mut self, e: Edge) -> Id {
        if let Some(slot) = self.free.pop() {
            *self.node_mut(slot) = Node::Edge(e);
            return slot;
        }
        debug_assert!(self.nodes.len() < u32::MAX as usize);
        let id = Id(self.nodes.len() as u32);
        self.nodes.push(Node::Edge(e));
        id
    }

    pub(crate) fn free_edge(&mut self, x: Id) {
        debug_assert!(!self.is_leaf(x));
        self.free.push(x);
    }

    /// Record `x` as a path root: singletons join the basic-root set,
    /// edge roots get a path identifier (a fresh one unless the caller
    /// passes one through, as `concatenate` does for its left operand).
    pub(crate) fn make_root(&mut self, x: Id, keep: Option<PathId>) {
        if self.is_leaf(x) {
            self.registry.basic_roots.insert(x);
        } else {
            let pid = keep.unwrap_or_else(|| self.registry.mint_path_id());
            self.edge_mut(x).path = pid;
            self.registry.path_roots.insert(pid, x);
        }
    }

    /// Remove `x` from the registry ahead of a structural change.
    /// Returns the path identifier an edge root held.
    pub(crate) fn unroot(&mut self, x: Id) -> Option<PathId> {
        if self.is_leaf(x) {
            self.registry.basic_roots.remove(&x);
            None
        } else {
            let pid = self.edge(x).path;
            self.registry.path_roots.remove(&pid);
            Some(pid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::SizePartition;

    #[test]
    fn leaf_rank_is_weight_log2_floor() {
        let mut t = StTree::<SizePartition>::new();
        for (size, rank) in [(1, 0), (2, 1), (3, 1), (4, 2), (1024, 10), (1025, 10)] {
            let v = t.add_vertex(size);
            assert_eq!(t.node(v.id()).rank(), rank, "size {size}");
        }
    }

    #[test]
    fn leaf_net_min_is_maximal_sentinel() {
        let mut t = StTree::<SizePartition>::new();
        let v = t.add_vertex(1);
        assert_eq!(t.net_min_of(v.id()), i64::MAX);
    }

    #[test]
    fn registry_mints_increasing_path_ids() {
        let mut reg = Registry::default();
        let a = reg.mint_path_id();
        let b = reg.mint_path_id();
        assert!(b.0 > a.0);
    }

    #[test]
    fn new_vertices_are_basic_roots() {
        let mut t = StTree::<SizePartition>::new();
        let v = t.add_vertex(3);
        let u = t.add_vertex(1);
        assert!(t.registry.basic_roots.contains(&v.id()));
        assert!(t.registry.basic_roots.contains(&u.id()));
        assert_eq!(t.weight_of(v.id()), 3);
        assert_eq!(t.leaf(v.id()).size, 3);
    }
}
