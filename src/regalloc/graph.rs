//! The interference graph: a symmetric bit-matrix for O(1) membership tests plus
//! adjacency lists for the degree-counting that Simplify/Select need.
//!
//! Grounded on `original_source/pork/src/bytecode.c`'s `add_interference`/
//! `remove_interference`/`get_interference`/`count_active_interferences`. The
//! original pools its adjacency nodes from an arena free list so the lists can be
//! rebuilt every coalesce pass without reallocating; here a plain `Vec<Vec<u32>>`
//! cleared and refilled in place gets the same effect, since `Vec::clear` retains
//! its backing allocation.
pub struct InterferenceGraph {
    n: usize,
    /// `n x n` symmetric matrix: whether an edge currently exists at all.
    matrix: Vec<bool>,
    /// `n x n` symmetric matrix: whether an existing edge still counts toward
    /// degree (Simplify deactivates edges as it pushes nodes onto the stack).
    active: Vec<bool>,
    adjacency: Vec<Vec<u32>>,
}

impl InterferenceGraph {
    pub fn new(n: usize) -> Self {
        InterferenceGraph {
            n,
            matrix: vec![false; n * n],
            active: vec![false; n * n],
            adjacency: vec![Vec::new(); n],
        }
    }

    fn index(&self, a: u32, b: u32) -> usize {
        a as usize * self.n + b as usize
    }

    /// Drops every edge, ready for a fresh build pass (spec.md §4.H step 1).
    pub fn clear(&mut self) {
        self.matrix.iter_mut().for_each(|b| *b = false);
        self.active.iter_mut().for_each(|b| *b = false);
        self.adjacency.iter_mut().for_each(Vec::clear);
    }

    pub fn interferes(&self, a: u32, b: u32) -> bool {
        self.matrix[self.index(a, b)]
    }

    /// Adds an edge if one is not already present. A no-op for `a == b`, since a
    /// live range never interferes with itself.
    pub fn add_edge(&mut self, a: u32, b: u32) {
        if a == b || self.interferes(a, b) {
            return;
        }
        let (ab, ba) = (self.index(a, b), self.index(b, a));
        self.matrix[ab] = true;
        self.matrix[ba] = true;
        self.active[ab] = true;
        self.active[ba] = true;
        self.adjacency[a as usize].push(b);
        self.adjacency[b as usize].push(a);
    }

    /// Used only by coalescing, to move an edge incident to the absorbed live
    /// range over to the one it's merged into (spec.md §4.H step 4's inner loop
    /// over `lr3`).
    pub fn remove_edge(&mut self, a: u32, b: u32) {
        debug_assert!(self.interferes(a, b), "no edge exists between {a} and {b}");
        let (ab, ba) = (self.index(a, b), self.index(b, a));
        self.matrix[ab] = false;
        self.matrix[ba] = false;
        self.active[ab] = false;
        self.active[ba] = false;
        self.adjacency[a as usize].retain(|&v| v != b);
        self.adjacency[b as usize].retain(|&v| v != a);
    }

    pub fn neighbors(&self, a: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency[a as usize].iter().copied()
    }

    /// Whether the edge `a`-`b` is currently counted toward degree. Used by
    /// Select to decide whether a neighbor has already been assigned a color
    /// (spec.md §4.H Select: "collect colors of neighbors whose color is already
    /// assigned").
    pub fn is_active(&self, a: u32, b: u32) -> bool {
        self.active[self.index(a, b)]
    }

    pub fn active_degree(&self, a: u32) -> usize {
        self.adjacency[a as usize]
            .iter()
            .filter(|&&b| self.active[self.index(a, b)])
            .count()
    }

    /// Deactivates every edge incident to `a` on both endpoints (Simplify, when
    /// it pushes `a` onto the select stack).
    pub fn deactivate_incident(&mut self, a: u32) {
        let neighbors: Vec<u32> = self.adjacency[a as usize].clone();
        for b in neighbors {
            let (ab, ba) = (self.index(a, b), self.index(b, a));
            self.active[ab] = false;
            self.active[ba] = false;
        }
    }

    /// Reactivates every edge incident to `a` that is still a real edge (Select,
    /// as it pops `a` back off the stack).
    pub fn reactivate_incident(&mut self, a: u32) {
        let neighbors: Vec<u32> = self.adjacency[a as usize].clone();
        for b in neighbors {
            let (ab, ba) = (self.index(a, b), self.index(b, a));
            self.active[ab] = true;
            self.active[ba] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_edge_is_symmetric_and_idempotent() {
        let mut g = InterferenceGraph::new(4);
        g.add_edge(0, 1);
        g.add_edge(1, 0);
        assert!(g.interferes(0, 1));
        assert!(g.interferes(1, 0));
        assert_eq!(g.neighbors(0).count(), 1);
        assert_eq!(g.neighbors(1).count(), 1);
    }

    #[test]
    fn self_edges_are_never_added() {
        let mut g = InterferenceGraph::new(4);
        g.add_edge(2, 2);
        assert!(!g.interferes(2, 2));
        assert_eq!(g.neighbors(2).count(), 0);
    }

    #[test]
    fn deactivate_then_reactivate_restores_active_degree() {
        let mut g = InterferenceGraph::new(3);
        g.add_edge(0, 1);
        g.add_edge(0, 2);
        assert_eq!(g.active_degree(0), 2);
        g.deactivate_incident(0);
        assert_eq!(g.active_degree(0), 0);
        g.reactivate_incident(0);
        assert_eq!(g.active_degree(0), 2);
    }

    #[test]
    fn clear_removes_every_edge() {
        let mut g = InterferenceGraph::new(3);
        g.add_edge(0, 1);
        g.clear();
        assert!(!g.interferes(0, 1));
        assert_eq!(g.neighbors(0).count(), 0);
    }
}
