//! Simplify and Select (spec.md §4.H): reduce the live-range graph to a select
//! stack of degree-`< k` nodes, then pop them back off assigning the smallest
//! free color each time.
//!
//! Grounded on `original_source/pork/src/bytecode.c`'s `allocate_registers` tail
//! half: the `count_active_interferences` worklist loop and the `occupied_colors`
//! scan on Select.

use itertools::Itertools;

use crate::error::AllocError;
use crate::regalloc::graph::InterferenceGraph;
use crate::regalloc::lr::LiveRanges;

/// Runs Simplify then Select. Returns `colors[representative] = assigned color`
/// for every live-range representative; entries for non-representative registers
/// are left at `-1` and must not be read directly — look up through
/// `lr.find(reg)` first.
pub fn color(graph: &mut InterferenceGraph, lr: &mut LiveRanges, k: u32) -> Result<Vec<i64>, AllocError> {
    let register_count = lr.register_count();

    let mut to_select: Vec<u32> = (0..register_count).map(|r| lr.find(r)).unique().collect();

    let mut stack: Vec<u32> = Vec::new();

    loop {
        let mut removed_any = false;
        let mut remaining = Vec::new();

        for &candidate in &to_select {
            if (graph.active_degree(candidate) as u32) < k {
                stack.push(candidate);
                graph.deactivate_incident(candidate);
                removed_any = true;
            } else {
                remaining.push(candidate);
            }
        }

        to_select = remaining;
        if !removed_any {
            break;
        }
    }

    if !to_select.is_empty() {
        return Err(AllocError::Uncolorable {
            live_ranges: to_select,
            k,
        });
    }

    let mut colors: Vec<i64> = vec![-1; register_count as usize];

    while let Some(candidate) = stack.pop() {
        let mut occupied = vec![false; k as usize];

        for neighbor in graph.neighbors(candidate) {
            if graph.is_active(candidate, neighbor) {
                let assigned = colors[neighbor as usize];
                debug_assert!(assigned >= 0, "neighbor must be colored before its already-active edge is visible");
                occupied[assigned as usize] = true;
            }
        }

        graph.reactivate_incident(candidate);

        let chosen = (0..k)
            .find(|&c| !occupied[c as usize])
            .expect("a free color exists: active degree was < k when simplified");
        colors[candidate as usize] = chosen as i64;
    }

    Ok(colors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_triangle_of_three_needs_three_colors() {
        let mut graph = InterferenceGraph::new(3);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(0, 2);
        let mut lr = LiveRanges::new(3);
        let colors = color(&mut graph, &mut lr, 3).expect("three registers suffice for a triangle");
        assert_eq!(colors[0..3].iter().filter(|&&c| c >= 0).count(), 3);
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn a_triangle_of_three_is_uncolorable_with_two_registers() {
        let mut graph = InterferenceGraph::new(3);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(0, 2);
        let mut lr = LiveRanges::new(3);
        let result = color(&mut graph, &mut lr, 2);
        assert!(result.is_err());
    }

    #[test]
    fn disjoint_registers_can_share_one_color() {
        let mut graph = InterferenceGraph::new(2);
        let mut lr = LiveRanges::new(2);
        let colors = color(&mut graph, &mut lr, 1).expect("non-interfering registers share a color");
        assert_eq!(colors[0], 0);
        assert_eq!(colors[1], 0);
    }
}
