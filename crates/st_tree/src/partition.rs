//! Partitioning strategies and the heavy-path maintenance operations.
//!
//! Under naive partitioning the virtual-tree rebalancing alone provides
//! the amortized bound and everything here is a no-op. Partitioning by
//! size additionally keeps every solid edge heavy, so the number of
//! dashed children per vertex stays amortized-bounded: after each tree
//! operation `conceal` demotes light solid edges to dashed and promotes
//! dashed children that have come to dominate their parent's weight.

use crate::forest::StTree;
use crate::node::Id;

/// Strategy choice for a whole forest, fixed at construction time
/// through the type parameter of [`StTree`].
pub trait Partition {
    /// Whether the heavy-path invariant is actively maintained.
    const BY_SIZE: bool;
}

/// No heavy-path maintenance; paths are shaped purely by `expose`.
#[derive(Clone, Copy, Debug)]
pub enum NaivePartition {}

impl Partition for NaivePartition {
    const BY_SIZE: bool = false;
}

/// Heavy-path maintenance by subtree weight.
#[derive(Clone, Copy, Debug)]
pub enum SizePartition {}

impl Partition for SizePartition {
    const BY_SIZE: bool = true;
}

impl<S: Partition> StTree<S> {
    pub(crate) fn remove_from_path_set(&mut self, v: Id, t: Id) {
        let lf = self.leaf_mut(v);
        if let Some(pos) = lf.path_set.iter().position(|&x| x == t) {
            lf.path_set.swap_remove(pos);
        }
    }

    /// Locate a light solid edge in the path rooted at `p`, scanning
    /// right to left. Returns the successor-side vertex of the first
    /// light edge, or `None` if the path is entirely heavy (singleton
    /// paths included).
    pub(crate) fn light(&mut self, p: Id) -> Option<Id> {
        if self.is_leaf(p) {
            return None;
        }
        self.find_light(p, 0)
    }

    /// `before` is the weight of every path vertex preceding this
    /// subtree. The edge represented by `e` joins the tail of its left
    /// subtree to the head of its right subtree; it is light iff the
    /// lower side's accumulated weight does not dominate the upper
    /// vertex's weight. Recursion depth is bounded by the virtual-tree
    /// height.
    fn find_light(&mut self, e: Id, before: u64) -> Option<Id> {
        self.push(e);
        let (l, r) = {
            let n = self.edge(e);
            (n.ch[0], n.ch[1])
        };
        let wl = self.weight_of(l);
        if !self.is_leaf(r)
            && let Some(x) = self.find_light(r, before + wl)
        {
            return Some(x);
        }
        let upper = self.head_of(r);
        if before + wl <= self.leaf(upper).weight {
            return Some(upper);
        }
        if !self.is_leaf(l)
            && let Some(x) = self.find_light(l, before)
        {
            return Some(x);
        }
        None
    }

    /// Heaviest path hanging off `v` through a dashed edge, as
    /// (tail vertex, path weight). `None` if `v` has no dashed children.
    pub(crate) fn maxwt(&self, v: Id) -> Option<(Id, u64)> {
        let mut best: Option<(Id, u64)> = None;
        for i in 0..self.leaf(v).path_set.len() {
            let t = self.leaf(v).path_set[i];
            let w = self.weight_of(self.path_root(t));
            if best.is_none_or(|(_, bw)| w > bw) {
                best = Some((t, w));
            }
        }
        best
    }

    /// Demote one light solid edge to dashed. The path is split at the
    /// light edge's upper vertex `v`; the lower fragment re-hangs off
    /// `v` as a dashed child, and if some dashed child of `v` now
    /// carries more than half of `v`'s weight it is promoted to solid in
    /// its stead. Returns the demoted lower fragment (the remaining
    /// candidate for further slicing), or `None` if no light edge
    /// exists.
    pub(crate) fn slice(&mut self, p: Id) -> Option<Id> {
        let v = self.light(p)?;
        let parts = self.split(v);
        let head_side = parts.left.expect("a light edge's lower side is never empty");
        let lcost = parts.lcost.expect("left fragment carries its adjoining cost");
        self.dash_under(head_side, v, lcost);
        let promote = self.maxwt(v).filter(|&(_, w)| 2 * w > self.leaf(v).weight);
        let mut s = v;
        if let Some((qt, qw)) = promote {
            let q = self.path_root(qt);
            let dc = self.leaf(qt).dcost;
            self.leaf_mut(v).weight -= qw;
            self.remove_from_path_set(v, qt);
            s = self.concatenate(q, s, dc);
        }
        if let Some(r) = parts.right {
            let rcost = parts.rcost.expect("right fragment carries its adjoining cost");
            self.concatenate(s, r, rcost);
        }
        Some(head_side)
    }

    /// Restore the heavy-path invariant disturbed by `expose`/`splice`:
    /// slice until no light edge remains, then check the head vertex for
    /// a dashed child that should be solid.
    pub(crate) fn conceal(&mut self, p: Id) {
        if !S::BY_SIZE {
            return;
        }
        let mut cur = p;
        while let Some(next) = self.slice(cur) {
            cur = next;
        }
        let h = self.head_of(cur);
        if let Some((st, sw)) = self.maxwt(h)
            && 2 * sw > self.leaf(h).weight
        {
            let parts = self.split(h);
            debug_assert!(parts.left.is_none());
            let q = self.path_root(st);
            let dc = self.leaf(st).dcost;
            self.leaf_mut(h).weight -= sw;
            self.remove_from_path_set(h, st);
            let joined = self.concatenate(q, h, dc);
            if let Some(r) = parts.right {
                let rcost = parts.rcost.expect("right fragment carries its adjoining cost");
                self.concatenate(joined, r, rcost);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::partition::{NaivePartition, SizePartition};
    use crate::{ForestError, StTree};

    #[test]
    fn heavy_chain_has_no_light_edge() {
        let mut t = StTree::<SizePartition>::new();
        let v0 = t.add_vertex(8);
        let v1 = t.add_vertex(4);
        let v2 = t.add_vertex(2);
        let v3 = t.add_vertex(1);
        t.link(v0, v1, 1).unwrap();
        t.link(v1, v2, 1).unwrap();
        t.link(v2, v3, 1).unwrap();
        let p = t.expose(v0.id());
        assert_eq!(t.light(p), None);
        t.check_invariants().unwrap();
        // the whole chain survives concealment as one solid path
        t.conceal(p);
        t.check_invariants().unwrap();
        let p = t.path_root(v0.id());
        assert_eq!(t.head_of(p), v0.id());
        assert_eq!(t.tail_of(p), v3.id());
    }

    #[test]
    fn light_edge_is_found_and_sliced() {
        let mut t = StTree::<SizePartition>::new();
        let u = t.add_vertex(1);
        let v = t.add_vertex(4);
        // a unit-weight child under a weight-4 vertex is a light edge;
        // linking conceals, which demotes it to dashed immediately
        t.link(u, v, 9).unwrap();
        t.check_invariants().unwrap();
        assert_eq!(t.path_root(u.id()), u.id());
        assert_eq!(t.leaf(u.id()).dparent, v.id());
        assert_eq!(t.leaf(u.id()).dcost, 9);
        assert_eq!(t.leaf(v.id()).weight, 5);
        assert_eq!(t.parent(u).unwrap(), Some(v));
        assert_eq!(t.cost(u).unwrap(), 9);
    }

    #[test]
    fn slice_promotes_dominant_dashed_child() {
        let mut t = StTree::<SizePartition>::new();
        let heavy = t.add_vertex(10);
        let v = t.add_vertex(1);
        let light = t.add_vertex(1);
        t.link(heavy, v, 5).unwrap();
        // the second link exposes v, demoting the heavy child to dashed;
        // concealment slices the new light edge and promotes the heavy
        // child back to solid
        t.link(light, v, 7).unwrap();
        t.check_invariants().unwrap();
        assert_eq!(t.path_root(heavy.id()), t.path_root(v.id()));
        assert_eq!(t.path_root(light.id()), light.id());
        assert_eq!(t.leaf(light.id()).dparent, v.id());
        assert_eq!(t.cost(heavy).unwrap(), 5);
        assert_eq!(t.cost(light).unwrap(), 7);
        assert_eq!(t.parent(light).unwrap(), Some(v));
        assert_eq!(t.parent(heavy).unwrap(), Some(v));
    }

    #[test]
    fn conceal_promotes_at_the_head() {
        let mut t = StTree::<SizePartition>::new();
        let c = t.add_vertex(10);
        let h = t.add_vertex(1);
        let r = t.add_vertex(12);
        t.link(c, h, 5).unwrap();
        // root's expose of h dashes c below it; the closing conceal must
        // promote c straight back
        t.link(h, r, 2).unwrap();
        t.check_invariants().unwrap();
        assert_eq!(t.path_root(c.id()), t.path_root(h.id()));
        assert_eq!(t.cost(c).unwrap(), 5);
        assert_eq!(t.root(c).unwrap(), r);
    }

    #[test]
    fn naive_partitioning_keeps_light_edges_solid() {
        let mut t = StTree::<NaivePartition>::new();
        let u = t.add_vertex(1);
        let v = t.add_vertex(4);
        t.link(u, v, 9).unwrap();
        let p = t.expose(u.id());
        assert_eq!(t.light(p), Some(v.id()));
        t.conceal(p);
        // still one solid path
        assert_eq!(t.path_root(u.id()), t.path_root(v.id()));
        t.check_invariants().unwrap();
    }

    #[test]
    fn maxwt_reports_the_heaviest_dashed_child() {
        let mut t = StTree::<SizePartition>::new();
        let a = t.add_vertex(2);
        let b = t.add_vertex(3);
        let v = t.add_vertex(100);
        t.link(a, v, 1).unwrap();
        t.link(b, v, 1).unwrap();
        t.check_invariants().unwrap();
        // both children are light against weight 100 and end up dashed
        let (tail, w) = t.maxwt(v.id()).expect("two dashed children");
        assert_eq!(tail, b.id());
        assert_eq!(w, 3);
        assert_eq!(t.maxwt(a.id()), None);
    }

    #[test]
    fn strategies_agree_on_forest_semantics() {
        fn drive<S: crate::Partition>() -> Vec<Result<i64, ForestError>> {
            let mut t = StTree::<S>::new();
            let vs: Vec<_> = (0..6).map(|_| t.add_vertex(1)).collect();
            t.link(vs[0], vs[1], 3).unwrap();
            t.link(vs[1], vs[2], 5).unwrap();
            t.link(vs[3], vs[2], 2).unwrap();
            t.link(vs[4], vs[3], 8).unwrap();
            t.evert(vs[0]).unwrap();
            let mut out = Vec::new();
            for &v in &vs {
                out.push(t.cost(v));
            }
            t.check_invariants().unwrap();
            out
        }
        assert_eq!(drive::<NaivePartition>(), drive::<SizePartition>());
    }
}
