// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incrementally maintained "must be placed after" relation between objects.

use alloc::vec::Vec;

use crate::grid::BucketGrid;
use crate::object::ObjectId;
use crate::occlusion;
use crate::ordered_set::OrderedSet;
use crate::types::IsoBox;

#[derive(Clone, Debug, Default)]
struct Edges {
    /// Objects this one is placed after (its occluders).
    self_depends: OrderedSet<ObjectId>,
    /// Objects placed after this one (reverse of `self_depends`).
    their_depends: OrderedSet<ObjectId>,
}

/// Symmetric dependency edges, stored per object slot.
///
/// If `a` depends on `b` then `b` appears in `a`'s self-depends and `a` in
/// `b`'s their-depends. Edges are rebuilt per object and torn down when an
/// object leaves the visible set.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<Edges>,
    scratch: Vec<ObjectId>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects `id` must be placed after.
    pub fn self_depends(&self, id: ObjectId) -> &[ObjectId] {
        self.nodes
            .get(id.idx())
            .map_or(&[], |e| e.self_depends.as_slice())
    }

    /// Objects that must be placed after `id`.
    pub fn their_depends(&self, id: ObjectId) -> &[ObjectId] {
        self.nodes
            .get(id.idx())
            .map_or(&[], |e| e.their_depends.as_slice())
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|e| e.self_depends.len()).sum()
    }

    /// Record that `after` must be placed after `before`.
    pub fn add_edge(&mut self, after: ObjectId, before: ObjectId) {
        debug_assert_ne!(after, before, "an object cannot depend on itself");
        self.node_mut(after).self_depends.insert(before);
        self.node_mut(before).their_depends.insert(after);
    }

    /// Remove every edge touching `id`, on both sides.
    pub fn clear(&mut self, id: ObjectId) {
        let Some(node) = self.nodes.get_mut(id.idx()) else {
            return;
        };
        let Edges {
            mut self_depends,
            mut their_depends,
        } = core::mem::take(node);
        for other in &their_depends {
            if let Some(n) = self.nodes.get_mut(other.idx()) {
                n.self_depends.remove(&id);
            }
        }
        for other in &self_depends {
            if let Some(n) = self.nodes.get_mut(other.idx()) {
                n.their_depends.remove(&id);
            }
        }
        // Hand the emptied sets back so their allocations are reused.
        self_depends.clear();
        their_depends.clear();
        self.nodes[id.idx()] = Edges {
            self_depends,
            their_depends,
        };
    }

    /// Rebuild the edges of `id` from its neighborhood in `grid`.
    ///
    /// Objects found along the forward cone that `id` lies behind become its
    /// occluders; objects found along the backward cone that lie behind `id`
    /// get `id` as an occluder. Both passes run because the comparator is only
    /// one-sided for unrelated boxes, and a partner may be reachable from one
    /// cone only. `bounds_of` resolves a candidate to its iso box.
    pub fn rebuild(
        &mut self,
        id: ObjectId,
        grid: &BucketGrid,
        bounds_of: impl Fn(ObjectId) -> IsoBox,
    ) {
        self.clear(id);
        let Some(range) = grid.range_of(id) else {
            return;
        };
        let bounds = bounds_of(id);
        let mut found = core::mem::take(&mut self.scratch);

        found.clear();
        range.for_each(|index| {
            grid.visit_forward(index, |objects| {
                for &other in objects {
                    if other != id && occlusion::is_behind(&bounds, &bounds_of(other)) {
                        found.push(other);
                    }
                }
            });
        });
        for &other in &found {
            self.add_edge(id, other);
        }

        found.clear();
        range.for_each(|index| {
            grid.visit_backward(index, |objects| {
                for &other in objects {
                    if other != id && occlusion::is_behind(&bounds_of(other), &bounds) {
                        found.push(other);
                    }
                }
            });
        });
        for &other in &found {
            self.add_edge(other, id);
        }

        found.clear();
        self.scratch = found;
    }

    fn node_mut(&mut self, id: ObjectId) -> &mut Edges {
        if self.nodes.len() <= id.idx() {
            self.nodes.resize_with(id.idx() + 1, Edges::default);
        }
        &mut self.nodes[id.idx()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;
    use alloc::vec;

    fn id(i: u32) -> ObjectId {
        ObjectId::new(i, 1)
    }

    fn unit(x: f64, y: f64, z: f64) -> IsoBox {
        IsoBox::new(Vec3::new(x, y, z), Vec3::ONE)
    }

    fn assert_symmetric(graph: &DependencyGraph, ids: &[ObjectId]) {
        for &a in ids {
            for &b in graph.self_depends(a) {
                assert!(graph.their_depends(b).contains(&a), "{a:?} -> {b:?} lacks a reverse edge");
            }
            for &b in graph.their_depends(a) {
                assert!(graph.self_depends(b).contains(&a), "{b:?} -> {a:?} lacks a forward edge");
            }
        }
    }

    #[test]
    fn add_and_clear_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(id(1), id(0));
        graph.add_edge(id(2), id(1));
        graph.add_edge(id(2), id(1));
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.self_depends(id(2)), &[id(1)]);
        assert_eq!(graph.their_depends(id(1)), &[id(2)]);

        graph.clear(id(1));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.self_depends(id(2)).is_empty());
        assert!(graph.their_depends(id(0)).is_empty());
        assert!(graph.self_depends(id(9)).is_empty());
        graph.clear(id(9));
    }

    #[test]
    fn rebuild_finds_edge_from_both_sides() {
        let boxes = [unit(0.0, 0.0, 0.0), unit(1.0, 0.0, 0.0)];
        let items = [(id(0), boxes[0]), (id(1), boxes[1])];
        let mut grid = BucketGrid::new();
        grid.rebuild(&items);
        let lookup = |o: ObjectId| boxes[o.idx()];

        // Only the near object is rebuilt: the edge is found by its backward pass.
        let mut graph = DependencyGraph::new();
        graph.rebuild(id(0), &grid, lookup);
        assert_eq!(graph.self_depends(id(1)), &[id(0)]);
        assert!(graph.self_depends(id(0)).is_empty());

        // Rebuilding the far object replaces, not duplicates, the edge.
        graph.rebuild(id(1), &grid, lookup);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.self_depends(id(1)), &[id(0)]);
        assert_eq!(graph.their_depends(id(0)), &[id(1)]);
        assert_symmetric(&graph, &[id(0), id(1)]);
    }

    #[test]
    fn rebuild_of_isolated_objects_has_no_edges() {
        let boxes = [unit(0.0, 0.0, 0.0), unit(10.0, -10.0, 0.0), unit(-10.0, 10.0, 0.0)];
        let items: Vec<_> = boxes.iter().enumerate().map(|(i, b)| (id(i as u32), *b)).collect();
        let mut grid = BucketGrid::new();
        grid.rebuild(&items);
        let mut graph = DependencyGraph::new();
        for &(o, _) in &items {
            graph.rebuild(o, &grid, |o| boxes[o.idx()]);
        }
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn stack_of_cubes_chains() {
        let boxes = [unit(0.0, 0.0, 0.0), unit(0.0, 0.0, 1.0), unit(0.0, 0.0, 2.0)];
        let items: Vec<_> = boxes.iter().enumerate().map(|(i, b)| (id(i as u32), *b)).collect();
        let mut grid = BucketGrid::new();
        grid.rebuild(&items);
        let mut graph = DependencyGraph::new();
        for &(o, _) in &items {
            graph.rebuild(o, &grid, |o| boxes[o.idx()]);
        }
        // Lower cubes are placed after the ones stacked on them.
        assert!(graph.self_depends(id(0)).contains(&id(1)));
        assert!(graph.self_depends(id(1)).contains(&id(2)));
        assert!(graph.self_depends(id(2)).is_empty());
        assert_symmetric(&graph, &[id(0), id(1), id(2)]);
        let ids = vec![id(0), id(1), id(2)];
        for &o in &ids {
            graph.clear(o);
        }
        assert_eq!(graph.edge_count(), 0);
    }
}
