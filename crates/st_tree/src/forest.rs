//! The forest structure and its eight public tree operations.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use crate::node::{Id, Leaf, Node, Registry, VertexId};
use crate::partition::{Partition, SizePartition};

/// Precondition violations surfaced by the tree operations. All of them
/// are checked before any mutation of the represented forest begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForestError {
    /// A query or cut expecting a parent edge hit a represented-tree
    /// root.
    RootHasNoParent,
    /// `link` between two vertices already in the same represented tree
    /// (including a vertex with itself or with its own descendant).
    SameTreeLink,
    /// `link` whose child endpoint is not the root of its represented
    /// tree; rerooting with `evert` first makes any vertex linkable.
    LinkNonRoot,
    /// A vertex handle not tracked by this forest.
    VertexNotFound,
    /// A structural invariant breach detected by [`StTree::check_invariants`].
    InvariantViolation(&'static str),
}

impl fmt::Display for ForestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootHasNoParent => write!(f, "vertex is a tree root and has no parent edge"),
            Self::SameTreeLink => write!(f, "vertices already belong to the same tree"),
            Self::LinkNonRoot => write!(f, "link child is not the root of its tree"),
            Self::VertexNotFound => write!(f, "vertex is not tracked by this forest"),
            Self::InvariantViolation(what) => write!(f, "invariant violation: {what}"),
        }
    }
}

impl std::error::Error for ForestError {}

/// A forest of rooted, vertex-disjoint trees under link/cut/evert and
/// root-path queries, each in amortized logarithmic time.
///
/// Generic over a [`Partition`] strategy fixed at construction time.
pub struct StTree<S: Partition = SizePartition> {
    pub(crate) nodes: Vec<Node>,
    pub(crate) free: Vec<Id>,
    pub(crate) registry: Registry,
    pub(crate) stack: Vec<Id>,
    pub(crate) n_vertices: usize,
    strategy: PhantomData<S>,
}

impl<S: Partition> Default for StTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Partition> StTree<S> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            registry: Registry::default(),
            stack: Vec::new(),
            n_vertices: 0,
            strategy: PhantomData,
        }
    }

    /// Forest of isolated vertices with the given represented-subtree
    /// sizes as weight seeds.
    pub fn with_sizes(sizes: &[u64]) -> Self {
        let mut t = Self::new();
        t.nodes.reserve(sizes.len().saturating_mul(2));
        for &s in sizes {
            t.add_vertex(s);
        }
        t
    }

    /// New isolated vertex; `size` seeds its balancing weight.
    pub fn add_vertex(&mut self, size: u64) -> VertexId {
        debug_assert!(size >= 1);
        debug_assert!(self.nodes.len() < u32::MAX as usize);
        let id = Id(self.nodes.len() as u32);
        self.nodes.push(Node::Leaf(Leaf {
            size,
            weight: size,
            vparent: Id::NIL,
            dparent: Id::NIL,
            dcost: 0,
            path_set: Vec::new(),
        }));
        self.n_vertices += 1;
        self.registry.basic_roots.insert(id);
        VertexId(id.0)
    }

    /// Number of vertices in the forest.
    pub fn len(&self) -> usize {
        self.n_vertices
    }

    pub fn is_empty(&self) -> bool {
        self.n_vertices == 0
    }

    /// Size the vertex was constructed with.
    pub fn size(&self, v: VertexId) -> Result<u64, ForestError> {
        let id = self.check_vertex(v)?;
        Ok(self.leaf(id).size)
    }

    /// Current balancing weight of the vertex.
    pub fn weight(&self, v: VertexId) -> Result<u64, ForestError> {
        let id = self.check_vertex(v)?;
        Ok(self.leaf(id).weight)
    }

    fn check_vertex(&self, v: VertexId) -> Result<Id, ForestError> {
        let id = v.id();
        if id.idx() >= self.nodes.len() || !matches!(self.nodes[id.idx()], Node::Leaf(_)) {
            return Err(ForestError::VertexNotFound);
        }
        Ok(id)
    }

    fn root_id(&mut self, id: Id) -> Id {
        let p = self.expose(id);
        let r = self.tail_of(p);
        self.conceal(p);
        r
    }

    /// Parent of `v` in its represented tree, `None` at the root.
    pub fn parent(&mut self, v: VertexId) -> Result<Option<VertexId>, ForestError> {
        let id = self.check_vertex(v)?;
        let pr = self.path_root(id);
        if self.tail_of(pr) == id {
            let dp = self.leaf(id).dparent;
            Ok((!dp.is_nil()).then_some(VertexId(dp.0)))
        } else {
            Ok(self.after(id).map(|x| VertexId(x.0)))
        }
    }

    /// Root of the represented tree containing `v`.
    pub fn root(&mut self, v: VertexId) -> Result<VertexId, ForestError> {
        let id = self.check_vertex(v)?;
        Ok(VertexId(self.root_id(id).0))
    }

    /// Cost of the edge between `v` and its parent.
    pub fn cost(&mut self, v: VertexId) -> Result<i64, ForestError> {
        let id = self.check_vertex(v)?;
        let pr = self.path_root(id);
        if self.tail_of(pr) == id {
            let lf = self.leaf(id);
            if lf.dparent.is_nil() {
                Err(ForestError::RootHasNoParent)
            } else {
                Ok(lf.dcost)
            }
        } else {
            Ok(self
                .pcost(id)
                .expect("interior path vertex has a successor edge"))
        }
    }

    /// Vertex whose parent edge is the minimum-cost edge on the path
    /// from `v` to its tree root; `None` when `v` is the root itself.
    pub fn mincost(&mut self, v: VertexId) -> Result<Option<VertexId>, ForestError> {
        let id = self.check_vertex(v)?;
        let p = self.expose(id);
        let m = self.pmincost(p);
        self.conceal(p);
        Ok(m.map(|x| VertexId(x.0)))
    }

    /// Add `delta` to the cost of every edge on the path from `v` to its
    /// tree root.
    pub fn update(&mut self, v: VertexId, delta: i64) -> Result<(), ForestError> {
        let id = self.check_vertex(v)?;
        let p = self.expose(id);
        self.pupdate(p, delta);
        self.conceal(p);
        Ok(())
    }

    /// Combine two trees with a new edge of the given cost, making `u`
    /// a child of `v`. `u` must be the root of its tree and the trees
    /// must be distinct.
    pub fn link(&mut self, u: VertexId, v: VertexId, cost: i64) -> Result<(), ForestError> {
        let uid = self.check_vertex(u)?;
        let vid = self.check_vertex(v)?;
        let ru = self.root_id(uid);
        let rv = self.root_id(vid);
        if ru == rv {
            return Err(ForestError::SameTreeLink);
        }
        if ru != uid {
            return Err(ForestError::LinkNonRoot);
        }
        let q = self.expose(vid);
        let p0 = self.path_root(uid);
        let p = self.concatenate(p0, q, cost);
        self.conceal(p);
        Ok(())
    }

    /// Remove the edge between `v` and its parent, returning its cost;
    /// `v` becomes the root of its own tree.
    pub fn cut(&mut self, v: VertexId) -> Result<i64, ForestError> {
        let id = self.check_vertex(v)?;
        let p = self.expose(id);
        if p == id {
            self.conceal(p);
            return Err(ForestError::RootHasNoParent);
        }
        let parts = self.split(id);
        debug_assert!(parts.left.is_none());
        let cost = parts.rcost.expect("a non-root vertex has a parent edge");
        {
            let lf = self.leaf_mut(id);
            lf.dparent = Id::NIL;
            lf.dcost = 0;
        }
        if let Some(r) = parts.right {
            self.conceal(r);
        }
        self.conceal(id);
        Ok(cost)
    }

    /// Make `v` the root of its represented tree without adding or
    /// removing any edge.
    pub fn evert(&mut self, v: VertexId) -> Result<(), ForestError> {
        let id = self.check_vertex(v)?;
        let p = self.expose(id);
        self.reverse(p);
        {
            let lf = self.leaf_mut(id);
            lf.dparent = Id::NIL;
            lf.dcost = 0;
        }
        self.conceal(p);
        Ok(())
    }

    /// Validate the structural invariants of every virtual tree and the
    /// registry. Test-harness aid; operations assume the invariants
    /// rather than checking them.
    pub fn check_invariants(&mut self) -> Result<(), ForestError> {
        fn fail(what: &'static str) -> Result<(), ForestError> {
            Err(ForestError::InvariantViolation(what))
        }
        let free: HashSet<Id> = self.free.iter().copied().collect();
        let mut roots: Vec<Id> = self.registry.basic_roots.iter().copied().collect();
        roots.extend(self.registry.path_roots.values().copied());
        let mut visited: HashSet<Id> = HashSet::new();
        let mut seen_leaves = 0usize;
        let mut seen_edges = 0usize;
        let mut stack = Vec::new();
        for &root in &roots {
            if !self.parent_of(root).is_nil() {
                return fail("registered root has a virtual parent");
            }
            let mut path_leaves = 0usize;
            stack.push(root);
            while let Some(x) = stack.pop() {
                if free.contains(&x) {
                    return fail("retired edge node still reachable");
                }
                if !visited.insert(x) {
                    return fail("node reachable from two roots");
                }
                match self.node(x) {
                    Node::Leaf(l) => {
                        seen_leaves += 1;
                        path_leaves += 1;
                        if !l.dparent.is_nil() {
                            if self.tail_of(self.path_root(x)) != x {
                                return fail("dashed parent on a non-tail vertex");
                            }
                            if S::BY_SIZE && !self.leaf(l.dparent).path_set.contains(&x) {
                                return fail("dashed child missing from parent's path set");
                            }
                        }
                    }
                    Node::Edge(e) => {
                        seen_edges += 1;
                        for &c in &e.ch {
                            if c.is_nil() {
                                return fail("edge node missing a child");
                            }
                            if self.parent_of(c) != x {
                                return fail("child's parent link broken");
                            }
                            stack.push(c);
                        }
                        if e.weight != self.weight_of(e.ch[0]) + self.weight_of(e.ch[1]) {
                            return fail("weight is not the sum of the children");
                        }
                        if e.rank != self.rank_of(e.ch[0]).max(self.rank_of(e.ch[1])) + 1 {
                            return fail("rank is not one above the taller child");
                        }
                        if e.bhead != self.head_of(e.ch[0]) || e.btail != self.tail_of(e.ch[1]) {
                            return fail("boundary vertices out of date");
                        }
                        if e.netcost < 0 {
                            return fail("negative netcost");
                        }
                        let mut m = e.netcost;
                        for &c in &e.ch {
                            if let Node::Edge(ce) = self.node(c) {
                                if ce.netmin < 0 {
                                    return fail("negative netmin below a root");
                                }
                                m = m.min(ce.netmin);
                            }
                        }
                        if m != 0 {
                            return fail("netmin decomposition not canonical");
                        }
                    }
                }
            }
            // traversal order must agree with head/tail from both ends
            let mut fwd = vec![self.head_of(root)];
            while let Some(n) = self.after(*fwd.last().unwrap()) {
                fwd.push(n);
            }
            let mut bwd = vec![self.tail_of(root)];
            while let Some(n) = self.before(*bwd.last().unwrap()) {
                bwd.push(n);
            }
            if fwd.len() != path_leaves || bwd.len() != path_leaves {
                return fail("successor chain does not span the path");
            }
            if !fwd.iter().rev().zip(&bwd).all(|(a, b)| a == b) {
                return fail("predecessor chain disagrees with successor chain");
            }
        }
        if seen_leaves != self.n_vertices {
            return fail("vertex unreachable from every registered root");
        }
        if seen_edges + free.len() + self.n_vertices != self.nodes.len() {
            return fail("edge arena leak");
        }
        if S::BY_SIZE {
            for (i, n) in self.nodes.iter().enumerate() {
                let id = Id(i as u32);
                if free.contains(&id) {
                    continue;
                }
                if let Node::Leaf(l) = n {
                    for &t in &l.path_set {
                        if self.leaf(t).dparent != id {
                            return fail("stale dashed-child record");
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
