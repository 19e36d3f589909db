//! The thirteen path primitives plus the composed `splice`/`expose`.
//!
//! Cost bookkeeping invariant: for an edge node `e`, the cost of the
//! solid edge it represents is `netcost(e)` plus the sum of `netmin`
//! from `e` up to its virtual root. Canonical form, restored after every
//! restructure: `netcost >= 0`, non-root `netmin >= 0`, and at every
//! edge node `min(netcost, netmin of edge children) == 0`. A path-wide
//! cost update therefore touches only the root's `netmin`.
//!
//! Orientation is a lazy bit: `apply_rev` swaps children and boundary
//! vertices in O(1), `push` propagates one level down, and every up-walk
//! first normalizes the root-to-leaf path with `push_path`.

use crate::forest::StTree;
use crate::node::{Edge, Id, PathId};
use crate::partition::Partition;

/// Result of cutting a path at a vertex: the fragment strictly before
/// it, the fragment strictly after it, and the cost of the incident
/// edge on each side. `left`/`lcost` are `None` iff the vertex was the
/// head, `right`/`rcost` iff it was the tail.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SplitParts {
    pub(crate) left: Option<Id>,
    pub(crate) right: Option<Id>,
    pub(crate) lcost: Option<i64>,
    pub(crate) rcost: Option<i64>,
}

impl<S: Partition> StTree<S> {
    pub(crate) fn apply_rev(&mut self, x: Id) {
        if let crate::node::Node::Edge(e) = self.node_mut(x) {
            e.ch.swap(0, 1);
            std::mem::swap(&mut e.bhead, &mut e.btail);
            e.rev ^= true;
        }
    }

    pub(crate) fn push(&mut self, x: Id) {
        let (rev, l, r) = match self.node(x) {
            crate::node::Node::Leaf(_) => return,
            crate::node::Node::Edge(e) => (e.rev, e.ch[0], e.ch[1]),
        };
        if rev {
            self.apply_rev(l);
            self.apply_rev(r);
            self.edge_mut(x).rev = false;
        }
    }

    /// Normalize orientation along the root-to-`x` path so physical
    /// child order equals logical path order for every ancestor of `x`.
    /// Leaves the ancestor chain (leaf first) in `self.stack`.
    pub(crate) fn push_path(&mut self, x: Id) {
        self.stack.clear();
        let mut y = x;
        self.stack.push(y);
        loop {
            let p = self.parent_of(y);
            if p.is_nil() {
                break;
            }
            y = p;
            self.stack.push(y);
        }
        for i in (0..self.stack.len()).rev() {
            let v = self.stack[i];
            self.push(v);
        }
    }

    /// Successor of `v` along its path, `None` if `v` is the tail.
    pub(crate) fn after(&mut self, v: Id) -> Option<Id> {
        self.push_path(v);
        let mut prev = v;
        let mut a = self.parent_of(v);
        while !a.is_nil() {
            let e = self.edge(a);
            if e.ch[0] == prev {
                return Some(self.head_of(e.ch[1]));
            }
            prev = a;
            a = e.parent;
        }
        None
    }

    /// Predecessor of `v` along its path, `None` if `v` is the head.
    pub(crate) fn before(&mut self, v: Id) -> Option<Id> {
        self.push_path(v);
        let mut prev = v;
        let mut a = self.parent_of(v);
        while !a.is_nil() {
            let e = self.edge(a);
            if e.ch[1] == prev {
                return Some(self.tail_of(e.ch[0]));
            }
            prev = a;
            a = e.parent;
        }
        None
    }

    /// Cost of the solid edge between `v` and its successor, `None` if
    /// `v` is the tail of its path.
    pub(crate) fn pcost(&mut self, v: Id) -> Option<i64> {
        self.push_path(v);
        let mut prev = v;
        let mut a = self.parent_of(v);
        let mut cost = None;
        let mut acc = 0i64;
        while !a.is_nil() {
            let e = self.edge(a);
            if cost.is_none() && e.ch[0] == prev {
                cost = Some(e.netcost);
            }
            if cost.is_some() {
                acc += e.netmin;
            }
            prev = a;
            a = e.parent;
        }
        cost.map(|c| c + acc)
    }

    /// Lower endpoint of the minimum-cost solid edge of the path rooted
    /// at `p`; ties resolve to the rightmost such edge. `None` for a
    /// singleton path.
    pub(crate) fn pmincost(&mut self, p: Id) -> Option<Id> {
        if self.is_leaf(p) {
            return None;
        }
        let mut u = p;
        loop {
            self.push(u);
            let e = self.edge(u);
            let (lc, rc, netcost) = (e.ch[0], e.ch[1], e.netcost);
            if !self.is_leaf(rc) && self.edge(rc).netmin == 0 {
                u = rc;
                continue;
            }
            if netcost == 0 {
                break;
            }
            debug_assert!(!self.is_leaf(lc) && self.edge(lc).netmin == 0);
            u = lc;
        }
        Some(self.tail_of(self.edge(u).ch[0]))
    }

    /// Add `x` to every solid edge cost of the path rooted at `p`. O(1);
    /// a singleton path has no edges and is left untouched.
    pub(crate) fn pupdate(&mut self, p: Id, x: i64) {
        if !self.is_leaf(p) {
            self.edge_mut(p).netmin += x;
        }
    }

    /// Reverse the path rooted at `p`, swapping head/tail and the
    /// meaning of before/after.
    pub(crate) fn reverse(&mut self, p: Id) {
        self.apply_rev(p);
    }

    /// Clear a virtual parent link and fold the lost ancestors' netmin
    /// contribution into `c`, leaving it a standalone canonical root.
    fn detach_absorb(&mut self, c: Id, gross: i64) {
        self.set_parent(c, Id::NIL);
        if let crate::node::Node::Edge(e) = self.node_mut(c) {
            e.netmin += gross;
        }
    }

    /// New edge node over two standalone roots, decomposing the edge
    /// cost `x` into netcost/netmin so the reconstruction invariant
    /// holds beneath it.
    fn mk_edge(&mut self, l: Id, x: i64, r: Id) -> Id {
        let m = x.min(self.net_min_of(l)).min(self.net_min_of(r));
        let weight = self.weight_of(l) + self.weight_of(r);
        let rank = self.rank_of(l).max(self.rank_of(r)) + 1;
        let bhead = self.head_of(l);
        let btail = self.tail_of(r);
        let e = self.alloc_edge(Edge {
            ch: [l, r],
            parent: Id::NIL,
            bhead,
            btail,
            netmin: m,
            netcost: x - m,
            rank,
            weight,
            rev: false,
            path: PathId(0),
        });
        self.set_parent(l, e);
        self.set_parent(r, e);
        if let crate::node::Node::Edge(c) = self.node_mut(l) {
            c.netmin -= m;
        }
        if let crate::node::Node::Edge(c) = self.node_mut(r) {
            c.netmin -= m;
        }
        e
    }

    /// Detach a standalone root's children, absorbing its netmin so both
    /// come out standalone; frees the node and returns them with the
    /// node's own reconstructed edge cost.
    fn detach_top(&mut self, e: Id) -> (Id, Id, i64) {
        self.push(e);
        let (l, r, netmin, netcost) = {
            let n = self.edge(e);
            (n.ch[0], n.ch[1], n.netmin, n.netcost)
        };
        self.detach_absorb(l, netmin);
        self.detach_absorb(r, netmin);
        self.free_edge(e);
        (l, r, netcost + netmin)
    }

    /// Left rotation on a standalone root: (a, (b, c)) -> ((a, b), c),
    /// preserving every reconstructed edge cost.
    fn rotate_left(&mut self, e: Id) -> Id {
        let (a, t, ce) = self.detach_top(e);
        let (b, c, ct) = self.detach_top(t);
        let inner = self.mk_edge(a, ce, b);
        self.mk_edge(inner, ct, c)
    }

    /// Right rotation on a standalone root: ((a, b), c) -> (a, (b, c)).
    fn rotate_right(&mut self, e: Id) -> Id {
        let (t, c, ce) = self.detach_top(e);
        let (a, b, ct) = self.detach_top(t);
        let inner = self.mk_edge(b, ce, c);
        self.mk_edge(a, ct, inner)
    }

    /// Rotate toward the shorter side until sibling ranks differ by at
    /// most one or the taller side is a single vertex (whose rank is
    /// intrinsic and cannot be rotated away). Zig-zag shapes take a
    /// double rotation, as in a height-balanced tree.
    fn rebalance(&mut self, e: Id) -> Id {
        let mut e = e;
        loop {
            let (l, r) = {
                let n = self.edge(e);
                (n.ch[0], n.ch[1])
            };
            let (kl, kr) = (self.rank_of(l), self.rank_of(r));
            if kr > kl + 1 && !self.is_leaf(r) {
                self.push(r);
                let (b, c) = {
                    let n = self.edge(r);
                    (n.ch[0], n.ch[1])
                };
                if self.rank_of(b) > self.rank_of(c) && !self.is_leaf(b) {
                    let (a, t, ce) = self.detach_top(e);
                    let t2 = self.rotate_right(t);
                    let e2 = self.mk_edge(a, ce, t2);
                    e = self.rotate_left(e2);
                } else {
                    e = self.rotate_left(e);
                }
            } else if kl > kr + 1 && !self.is_leaf(l) {
                self.push(l);
                let (b, c) = {
                    let n = self.edge(l);
                    (n.ch[0], n.ch[1])
                };
                if self.rank_of(c) > self.rank_of(b) && !self.is_leaf(c) {
                    let (t, a, ce) = self.detach_top(e);
                    let t2 = self.rotate_left(t);
                    let e2 = self.mk_edge(t2, ce, a);
                    e = self.rotate_right(e2);
                } else {
                    e = self.rotate_right(e);
                }
            } else {
                return e;
            }
        }
    }

    /// Join two standalone roots with a connecting edge of cost `x`.
    /// Near-equal ranks (or a taller side that is a single vertex) merge
    /// directly; otherwise the shorter tree folds into the taller one's
    /// spine, rebalancing on the way back up. Recursion depth is bounded
    /// by the virtual-tree height.
    fn join(&mut self, l: Id, x: i64, r: Id) -> Id {
        let (kl, kr) = (self.rank_of(l), self.rank_of(r));
        if kl.abs_diff(kr) <= 1 || (kl > kr && self.is_leaf(l)) || (kr > kl && self.is_leaf(r)) {
            return self.mk_edge(l, x, r);
        }
        if kl > kr {
            let (a, b, own) = self.detach_top(l);
            let t = self.join(b, x, r);
            let e = self.mk_edge(a, own, t);
            self.rebalance(e)
        } else {
            let (b, c, own) = self.detach_top(r);
            let t = self.join(l, x, b);
            let e = self.mk_edge(t, own, c);
            self.rebalance(e)
        }
    }

    /// Cut the path containing `v` at `v`, detaching it as a shared
    /// boundary. The two incident edge nodes are retired; every other
    /// ancestor folds into the fragment on its side with its subtree
    /// absorbing the lost ancestors' netmin, so all reconstructed costs
    /// survive. Fragments that collapse to a single vertex land in the
    /// registry's basic-root set.
    pub(crate) fn split(&mut self, v: Id) -> SplitParts {
        debug_assert!(self.is_leaf(v));
        if self.parent_of(v).is_nil() {
            return SplitParts::default();
        }
        let old_root = self.path_root(v);
        self.unroot(old_root);
        self.push_path(v);
        let anc: Vec<Id> = self.stack[1..].to_vec();
        let mut gross = vec![0i64; anc.len()];
        let mut acc = 0i64;
        for i in (0..anc.len()).rev() {
            acc += self.edge(anc[i]).netmin;
            gross[i] = acc;
        }
        let mut left = Id::NIL;
        let mut right = Id::NIL;
        let mut lcost = None;
        let mut rcost = None;
        let mut prev = v;
        for (i, &a) in anc.iter().enumerate() {
            let (c0, c1, netcost) = {
                let e = self.edge(a);
                (e.ch[0], e.ch[1], e.netcost)
            };
            let came_right = c1 == prev;
            debug_assert!(came_right || c0 == prev);
            let other = if came_right { c0 } else { c1 };
            let cost = netcost + gross[i];
            self.detach_absorb(other, gross[i]);
            self.free_edge(a);
            if came_right {
                if lcost.is_none() {
                    left = other;
                    lcost = Some(cost);
                } else {
                    left = self.join(other, cost, left);
                }
            } else if rcost.is_none() {
                right = other;
                rcost = Some(cost);
            } else {
                right = self.join(right, cost, other);
            }
            prev = a;
        }
        self.leaf_mut(v).vparent = Id::NIL;
        self.registry.basic_roots.insert(v);
        if !left.is_nil() {
            self.make_root(left, None);
        }
        if !right.is_nil() {
            self.make_root(right, None);
        }
        SplitParts {
            left: (!left.is_nil()).then_some(left),
            right: (!right.is_nil()).then_some(right),
            lcost,
            rcost,
        }
    }

    /// Join `tail(p)` to `head(q)` with a new solid edge of cost `x`.
    /// The combined path keeps `p`'s identifier; `tail(p)`'s dashed edge
    /// is superseded by the new solid one.
    pub(crate) fn concatenate(&mut self, p: Id, q: Id, x: i64) -> Id {
        let t = self.tail_of(p);
        let keep = self.unroot(p);
        self.unroot(q);
        let root = self.join(p, x, q);
        self.make_root(root, keep);
        let lf = self.leaf_mut(t);
        lf.dparent = Id::NIL;
        lf.dcost = 0;
        root
    }

    /// Re-hang a detached fragment below `v` as a dashed child. `v` must
    /// currently be a singleton path, so its weight may shift freely.
    pub(crate) fn dash_under(&mut self, frag: Id, v: Id, cost: i64) {
        debug_assert!(self.parent_of(v).is_nil());
        let t = self.tail_of(frag);
        let w = self.weight_of(frag);
        let lf = self.leaf_mut(t);
        lf.dparent = v;
        lf.dcost = cost;
        let lv = self.leaf_mut(v);
        lv.weight += w;
        if S::BY_SIZE {
            lv.path_set.push(t);
        }
    }

    /// Absorb one more level of the represented tree: the dashed edge at
    /// `tail(p)` becomes solid, and the preferred child it displaces
    /// becomes dashed.
    pub(crate) fn splice(&mut self, p: Id) -> Id {
        let t = self.tail_of(p);
        let v = self.leaf(t).dparent;
        debug_assert!(!v.is_nil());
        let dc = self.leaf(t).dcost;
        let parts = self.split(v);
        let pw = self.weight_of(p);
        {
            let lf = self.leaf_mut(v);
            debug_assert!(lf.weight >= pw);
            lf.weight -= pw;
        }
        if S::BY_SIZE {
            self.remove_from_path_set(v, t);
        }
        if let Some(q) = parts.left {
            let cost = parts.lcost.expect("left fragment carries its adjoining cost");
            self.dash_under(q, v, cost);
        }
        let mut p2 = self.concatenate(p, v, dc);
        if let Some(r) = parts.right {
            let cost = parts.rcost.expect("right fragment carries its adjoining cost");
            p2 = self.concatenate(p2, r, cost);
        }
        p2
    }

    /// Materialize the path from `v` to the root of its represented
    /// tree as one balanced structure and return its root.
    pub(crate) fn expose(&mut self, v: Id) -> Id {
        let parts = self.split(v);
        if let Some(q) = parts.left {
            let cost = parts.lcost.expect("left fragment carries its adjoining cost");
            self.dash_under(q, v, cost);
        }
        let mut p = match parts.right {
            Some(r) => {
                let cost = parts.rcost.expect("right fragment carries its adjoining cost");
                self.concatenate(v, r, cost)
            }
            None => v,
        };
        while !self.leaf(self.tail_of(p)).dparent.is_nil() {
            p = self.splice(p);
        }
        p
    }
}
