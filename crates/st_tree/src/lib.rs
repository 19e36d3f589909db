//! Sleator–Tarjan trees (link-cut trees) over a forest of rooted,
//! vertex-disjoint trees.
//!
//! Supports structural updates (`link`, `cut`, `evert`) and root-path
//! queries (`parent`, `root`, `cost`, `mincost`, `update`) in amortized
//! logarithmic time. Each preferred path is kept as a rank-balanced
//! virtual tree with lazily decomposed edge costs; `expose` surfaces
//! the path from a vertex to its tree root, and — under partitioning by
//! size — `conceal` restores the heavy-path decomposition afterwards.

pub mod partition;

mod forest;
mod node;
mod path;

pub use forest::{ForestError, StTree};
pub use node::VertexId;
pub use partition::{NaivePartition, Partition, SizePartition};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const NONE: usize = usize::MAX;

    /// Naive reference forest: parent array plus parent-edge costs.
    struct Model {
        parent: Vec<usize>,
        cost: Vec<i64>,
    }

    impl Model {
        fn new(n: usize) -> Self {
            Self {
                parent: vec![NONE; n],
                cost: vec![0; n],
            }
        }

        fn root(&self, mut v: usize) -> usize {
            while self.parent[v] != NONE {
                v = self.parent[v];
            }
            v
        }

        /// Vertices from `v` to its root, inclusive.
        fn path(&self, v: usize) -> Vec<usize> {
            let mut out = vec![v];
            let mut cur = v;
            while self.parent[cur] != NONE {
                cur = self.parent[cur];
                out.push(cur);
            }
            out
        }

        fn evert(&mut self, v: usize) {
            let mut prev = NONE;
            let mut prev_cost = 0i64;
            let mut cur = v;
            while cur != NONE {
                let next = self.parent[cur];
                let c = self.cost[cur];
                self.parent[cur] = prev;
                self.cost[cur] = prev_cost;
                prev = cur;
                prev_cost = c;
                cur = next;
            }
        }
    }

    fn run_model<S: Partition>(seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = 32_usize;
        let steps = 4_000_usize;

        let mut t = StTree::<S>::new();
        let vs: Vec<VertexId> = (0..n)
            .map(|_| t.add_vertex(rng.random_range(1..=4)))
            .collect();
        let mut model = Model::new(n);

        for it in 0..steps {
            let op = rng.random_range(0..9);
            match op {
                0 => {
                    // link, valid or not
                    let u = rng.random_range(0..n);
                    let v = rng.random_range(0..n);
                    let c = rng.random_range(-20_i64..=20);
                    let got = t.link(vs[u], vs[v], c);
                    if model.root(u) == model.root(v) {
                        assert_eq!(got, Err(ForestError::SameTreeLink), "it={it} link({u},{v})");
                    } else if model.parent[u] != NONE {
                        assert_eq!(got, Err(ForestError::LinkNonRoot), "it={it} link({u},{v})");
                    } else {
                        assert_eq!(got, Ok(()), "it={it} link({u},{v})");
                        model.parent[u] = v;
                        model.cost[u] = c;
                    }
                }
                1 => {
                    // evert + link joins any two distinct trees
                    let u = rng.random_range(0..n);
                    let v = rng.random_range(0..n);
                    if model.root(u) == model.root(v) {
                        continue;
                    }
                    let c = rng.random_range(-20_i64..=20);
                    t.evert(vs[u]).unwrap();
                    model.evert(u);
                    assert_eq!(t.link(vs[u], vs[v], c), Ok(()), "it={it} link({u},{v})");
                    model.parent[u] = v;
                    model.cost[u] = c;
                }
                2 => {
                    // cut
                    let v = rng.random_range(0..n);
                    let got = t.cut(vs[v]);
                    if model.parent[v] == NONE {
                        assert_eq!(got, Err(ForestError::RootHasNoParent), "it={it} cut({v})");
                    } else {
                        assert_eq!(got, Ok(model.cost[v]), "it={it} cut({v})");
                        model.parent[v] = NONE;
                        model.cost[v] = 0;
                    }
                }
                3 => {
                    let v = rng.random_range(0..n);
                    t.evert(vs[v]).unwrap();
                    model.evert(v);
                }
                4 => {
                    let v = rng.random_range(0..n);
                    let expected = match model.parent[v] {
                        NONE => None,
                        p => Some(vs[p]),
                    };
                    assert_eq!(t.parent(vs[v]).unwrap(), expected, "it={it} parent({v})");
                }
                5 => {
                    let v = rng.random_range(0..n);
                    let expected = vs[model.root(v)];
                    assert_eq!(t.root(vs[v]).unwrap(), expected, "it={it} root({v})");
                }
                6 => {
                    let v = rng.random_range(0..n);
                    let got = t.cost(vs[v]);
                    if model.parent[v] == NONE {
                        assert_eq!(got, Err(ForestError::RootHasNoParent), "it={it} cost({v})");
                    } else {
                        assert_eq!(got, Ok(model.cost[v]), "it={it} cost({v})");
                    }
                }
                7 => {
                    let v = rng.random_range(0..n);
                    let delta = rng.random_range(-10_i64..=10);
                    t.update(vs[v], delta).unwrap();
                    for &x in &model.path(v) {
                        if model.parent[x] != NONE {
                            model.cost[x] += delta;
                        }
                    }
                }
                _ => {
                    let v = rng.random_range(0..n);
                    let path = model.path(v);
                    let edge_vertices: Vec<usize> = path
                        .iter()
                        .copied()
                        .filter(|&x| model.parent[x] != NONE)
                        .collect();
                    let got = t.mincost(vs[v]).unwrap();
                    if edge_vertices.is_empty() {
                        assert_eq!(got, None, "it={it} mincost({v})");
                    } else {
                        let min = edge_vertices.iter().map(|&x| model.cost[x]).min().unwrap();
                        let got = got.unwrap();
                        let gx = got.index();
                        assert!(
                            edge_vertices.contains(&gx),
                            "it={it} mincost({v}) returned {gx}, not on the root path"
                        );
                        assert_eq!(model.cost[gx], min, "it={it} mincost({v})");
                    }
                }
            }
            if it % 64 == 0 {
                t.check_invariants().unwrap();
            }
        }
        t.check_invariants().unwrap();
    }

    #[test]
    fn random_ops_match_naive_model_size_partitioning() {
        run_model::<SizePartition>(0x5EED_2026);
    }

    #[test]
    fn random_ops_match_naive_model_naive_partitioning() {
        run_model::<NaivePartition>(0xC0FFEE);
    }

    #[test]
    fn random_long_chains_stay_consistent() {
        // chains stress the rank-balanced join harder than random trees
        let mut rng = StdRng::seed_from_u64(0x7A11_2026);
        let n = 64_usize;
        let mut t = StTree::<SizePartition>::new();
        let vs: Vec<VertexId> = (0..n).map(|_| t.add_vertex(1)).collect();
        for i in 1..n {
            t.link(vs[i - 1], vs[i], i as i64).unwrap();
        }
        t.check_invariants().unwrap();
        assert_eq!(t.root(vs[0]).unwrap(), vs[n - 1]);
        for _ in 0..200 {
            let v = rng.random_range(0..n - 1);
            assert_eq!(t.cost(vs[v]).unwrap(), (v + 1) as i64);
            let m = t.mincost(vs[v]).unwrap().unwrap();
            assert_eq!(m, vs[v], "minimum edge on a suffix of 1..n is the first");
        }
        t.check_invariants().unwrap();
    }
}
