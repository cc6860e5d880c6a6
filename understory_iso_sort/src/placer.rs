// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-first depth assignment over the dependency graph.

use alloc::vec::Vec;

use crate::graph::DependencyGraph;
use crate::object::{Entry, ObjectFlags, ObjectId};
use crate::types::DepthMode;

/// Assigns strictly increasing depths so every object follows its occluders.
///
/// Each object is marked placed *before* its dependencies are visited. A
/// cycle in the graph therefore ends at the first revisited member, which
/// keeps the pass terminating at the cost of one out-of-order depth.
#[derive(Clone, Debug, Default)]
pub(crate) struct DepthPlacer {
    /// Pending objects and the next dependency to visit for each.
    stack: Vec<(ObjectId, usize)>,
}

impl DepthPlacer {
    /// Place every object reachable from `order`, starting at `start`.
    ///
    /// Flat objects advance the running depth by `step`; volumetric objects
    /// by `step` plus their cached extent, and are centered on that span.
    /// Objects already flagged [`ObjectFlags::PLACED`] are skipped. Returns
    /// the running depth after the last object.
    pub(crate) fn place_all(
        &mut self,
        order: &[ObjectId],
        graph: &DependencyGraph,
        entries: &mut [Option<Entry>],
        start: f64,
        step: f64,
    ) -> f64 {
        let mut depth = start;
        for &root in order {
            if !mark_placed(entries, root) {
                continue;
            }
            self.stack.push((root, 0));
            while let Some((id, next)) = self.stack.last_mut() {
                let id = *id;
                let deps = graph.self_depends(id);
                if let Some(&dep) = deps.get(*next) {
                    *next += 1;
                    if mark_placed(entries, dep) {
                        self.stack.push((dep, 0));
                    }
                    continue;
                }
                self.stack.pop();
                if let Some(entry) = entry_mut(entries, id) {
                    depth = assign(entry, depth, step);
                }
            }
        }
        depth
    }
}

fn entry_mut(entries: &mut [Option<Entry>], id: ObjectId) -> Option<&mut Entry> {
    entries
        .get_mut(id.idx())?
        .as_mut()
        .filter(|e| e.generation == id.1)
}

/// Flag `id` as placed; `false` if it already was (or is stale).
fn mark_placed(entries: &mut [Option<Entry>], id: ObjectId) -> bool {
    match entry_mut(entries, id) {
        Some(e) if !e.flags.contains(ObjectFlags::PLACED) => {
            e.flags.insert(ObjectFlags::PLACED);
            true
        }
        _ => false,
    }
}

fn assign(entry: &mut Entry, depth: f64, step: f64) -> f64 {
    match entry.object.mode {
        DepthMode::Flat => {
            entry.depth = Some(depth);
            depth + step
        }
        DepthMode::Volumetric => {
            let extent = entry.volume.extent.size();
            entry.depth = Some(depth + extent * 0.5 + entry.volume.offset);
            depth + extent + step
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::IsoObject;
    use crate::types::{RenderBounds, Vec3};
    use alloc::vec;

    fn entries(n: u32) -> (Vec<Option<Entry>>, Vec<ObjectId>) {
        let entries = (0..n)
            .map(|_| Some(Entry::new(1, IsoObject::unit(Vec3::ZERO))))
            .collect();
        let ids = (0..n).map(|i| ObjectId::new(i, 1)).collect();
        (entries, ids)
    }

    fn depth(entries: &[Option<Entry>], id: ObjectId) -> f64 {
        entries[id.idx()].as_ref().unwrap().depth.unwrap()
    }

    #[test]
    fn independent_objects_follow_order() {
        let (mut entries, ids) = entries(3);
        let graph = DependencyGraph::new();
        let end = DepthPlacer::default().place_all(&ids, &graph, &mut entries, 1.0, 2.0);
        assert_eq!(depth(&entries, ids[0]), 1.0);
        assert_eq!(depth(&entries, ids[1]), 3.0);
        assert_eq!(depth(&entries, ids[2]), 5.0);
        assert_eq!(end, 7.0);
    }

    #[test]
    fn dependencies_are_placed_first() {
        let (mut entries, ids) = entries(4);
        let mut graph = DependencyGraph::new();
        // Diamond: 0 after 1 and 2, both after 3.
        graph.add_edge(ids[0], ids[1]);
        graph.add_edge(ids[0], ids[2]);
        graph.add_edge(ids[1], ids[3]);
        graph.add_edge(ids[2], ids[3]);
        DepthPlacer::default().place_all(&ids, &graph, &mut entries, 0.0, 1.0);

        let d: Vec<f64> = ids.iter().map(|&i| depth(&entries, i)).collect();
        assert_eq!(d, vec![3.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn cycles_terminate() {
        let (mut entries, ids) = entries(3);
        let mut graph = DependencyGraph::new();
        graph.add_edge(ids[0], ids[1]);
        graph.add_edge(ids[1], ids[2]);
        graph.add_edge(ids[2], ids[0]);
        let end = DepthPlacer::default().place_all(&ids, &graph, &mut entries, 0.0, 1.0);
        assert_eq!(end, 3.0);

        // Every object got exactly one distinct depth.
        let mut d: Vec<f64> = ids.iter().map(|&i| depth(&entries, i)).collect();
        d.sort_by(f64::total_cmp);
        assert_eq!(d, vec![0.0, 1.0, 2.0]);
        // The cycle is cut at the root: its dependency chain goes first.
        assert_eq!(depth(&entries, ids[2]), 0.0);
        assert_eq!(depth(&entries, ids[0]), 2.0);
    }

    #[test]
    fn already_placed_objects_are_skipped() {
        let (mut entries, ids) = entries(2);
        entries[0].as_mut().unwrap().flags.insert(ObjectFlags::PLACED);
        let graph = DependencyGraph::new();
        DepthPlacer::default().place_all(&ids, &graph, &mut entries, 5.0, 1.0);
        assert!(entries[0].as_ref().unwrap().depth.is_none());
        assert_eq!(depth(&entries, ids[1]), 5.0);
    }

    #[test]
    fn volumetric_objects_span_their_extent() {
        let (mut entries, ids) = entries(2);
        {
            let e = entries[0].as_mut().unwrap();
            e.object.mode = DepthMode::Volumetric;
            e.volume.refresh(&[RenderBounds::new(
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.5, 0.5, 2.0),
            )]);
        }
        let graph = DependencyGraph::new();
        let end = DepthPlacer::default().place_all(&ids, &graph, &mut entries, 10.0, 1.0);

        // Extent [-1, 3]: size 4, centered at 1. The parts then cover [10, 14].
        assert_eq!(depth(&entries, ids[0]), 10.0 + 2.0 - 1.0);
        assert_eq!(depth(&entries, ids[1]), 15.0);
        assert_eq!(end, 16.0);
    }
}
