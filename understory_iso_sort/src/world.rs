// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The sorting world: object registry and per-frame driver.

use alloc::vec::Vec;

use kurbo::Point;

use crate::graph::DependencyGraph;
use crate::grid::{BucketGrid, BucketRange};
use crate::object::{Entry, IsoObject, ObjectFlags, ObjectId};
use crate::ordered_set::OrderedSet;
use crate::placer::DepthPlacer;
use crate::projection::IsoProjection;
use crate::settings::SortSettings;
use crate::types::{DepthMode, IsoBox, RenderBounds, Vec3};
use crate::visibility::Visibility;

/// Owns the isometric objects of one scene and keeps their depths sorted.
///
/// Mutations (moving, resizing, changing render bounds) are cheap and only
/// flag work; [`World::step`] runs once per frame and:
/// 1. recomputes the visible set through a [`Visibility`] provider,
/// 2. repartitions the visible objects into a [`BucketGrid`],
/// 3. rebuilds dependency edges for objects that are new or moved,
/// 4. drops the edges of objects that left the view, and
/// 5. if anything changed, reassigns every visible object's depth.
///
/// Depth grows away from the viewer: an object that occludes another
/// always gets the smaller depth.
///
/// ## Example
///
/// ```rust
/// use understory_iso_sort::{AllVisible, IsoObject, SortSettings, Vec3, World};
///
/// let mut world = World::new(SortSettings::with_step(0.0, 1.0));
/// let near = world.insert(IsoObject::unit(Vec3::new(0.0, 0.0, 0.0)));
/// let far = world.insert(IsoObject::unit(Vec3::new(1.0, 0.0, 0.0)));
///
/// assert!(world.step(Some(&AllVisible)));
/// assert!(world.depth(near).unwrap() < world.depth(far).unwrap());
///
/// // Nothing changed: the second step is a no-op.
/// assert!(!world.step(Some(&AllVisible)));
/// ```
pub struct World {
    settings: SortSettings,
    projection: IsoProjection,
    /// slots
    objects: Vec<Option<Entry>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    visible: OrderedSet<ObjectId>,
    old_visible: OrderedSet<ObjectId>,
    grid: BucketGrid,
    graph: DependencyGraph,
    placer: DepthPlacer,
    /// Forces placement on the next step.
    dirty: bool,
    scratch: Vec<(ObjectId, IsoBox)>,
}

impl core::fmt::Debug for World {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.objects.len();
        let alive = self.objects.iter().filter(|o| o.is_some()).count();
        f.debug_struct("World")
            .field("settings", &self.settings)
            .field("objects_total", &total)
            .field("objects_alive", &alive)
            .field("visible", &self.visible.len())
            .field("edges", &self.graph.edge_count())
            .field("grid", &self.grid)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SortSettings::default())
    }
}

impl World {
    /// Create an empty world.
    ///
    /// Invalid settings are logged and used as given, except that the tile
    /// size is clamped to a tiny positive value.
    pub fn new(settings: SortSettings) -> Self {
        check_settings(&settings);
        Self {
            settings,
            projection: IsoProjection::new(settings.tile_size),
            objects: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            visible: OrderedSet::new(),
            old_visible: OrderedSet::new(),
            grid: BucketGrid::new(),
            graph: DependencyGraph::new(),
            placer: DepthPlacer::default(),
            dirty: true,
            scratch: Vec::new(),
        }
    }

    /// Current settings.
    #[inline]
    pub fn settings(&self) -> &SortSettings {
        &self.settings
    }

    /// Replace the settings; the next step re-places every visible object.
    pub fn set_settings(&mut self, settings: SortSettings) {
        check_settings(&settings);
        self.settings = settings;
        self.projection = IsoProjection::new(settings.tile_size);
        self.dirty = true;
    }

    /// Projection derived from the tile size.
    #[inline]
    pub fn projection(&self) -> &IsoProjection {
        &self.projection
    }

    /// Force the next step to re-place every visible object.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Add an object. It joins the visible set on the next step.
    pub fn insert(&mut self, object: IsoObject) -> ObjectId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.objects[idx] = Some(Entry::new(generation, object));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ObjectId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.objects.push(Some(Entry::new(generation, object)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ObjectId uses 32-bit indices by design."
            )]
            ((self.objects.len() - 1) as u32, generation)
        };
        ObjectId::new(idx, generation)
    }

    /// Remove an object. Its edges are dropped immediately.
    pub fn remove(&mut self, id: ObjectId) {
        if !self.is_alive(id) {
            return;
        }
        if self.visible.remove(&id) {
            self.dirty = true;
        }
        self.graph.clear(id);
        self.objects[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Returns true if `id` refers to a live object.
    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.entry(id).is_some()
    }

    /// The object description, if `id` is live.
    pub fn object(&self, id: ObjectId) -> Option<&IsoObject> {
        self.entry(id).map(|e| &e.object)
    }

    /// Iterate live objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &IsoObject)> + '_ {
        self.objects.iter().enumerate().filter_map(|(i, slot)| {
            let e = slot.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ObjectId uses 32-bit indices by design."
            )]
            Some((ObjectId::new(i as u32, e.generation), &e.object))
        })
    }

    /// Move an object.
    pub fn set_position(&mut self, id: ObjectId, position: Vec3) {
        if let Some(e) = self.entry_mut(id)
            && e.object.bounds.position() != position
        {
            e.object.bounds = e.object.bounds.with_position(position);
            self.mark_moved(id);
        }
    }

    /// Resize an object. Negative components are clamped to zero.
    pub fn set_size(&mut self, id: ObjectId, size: Vec3) {
        if let Some(e) = self.entry_mut(id) {
            let bounds = e.object.bounds.with_size(size);
            if bounds != e.object.bounds {
                e.object.bounds = bounds;
                self.mark_moved(id);
            }
        }
    }

    /// Switch between flat and volumetric depth.
    pub fn set_mode(&mut self, id: ObjectId, mode: DepthMode) {
        if let Some(e) = self.entry_mut(id)
            && e.object.mode != mode
        {
            e.object.mode = mode;
            if self.visible.contains(&id) {
                self.dirty = true;
            }
        }
    }

    /// Replace the render bounds of an object's visual parts (object-local space).
    ///
    /// Only volumetric objects use them; the cached depth extent is refreshed
    /// on the next step and only counts as a change beyond a small tolerance.
    pub fn set_render_bounds(&mut self, id: ObjectId, parts: &[RenderBounds]) {
        if let Some(e) = self.entry_mut(id) {
            e.render_bounds.clear();
            e.render_bounds.extend_from_slice(parts);
        }
    }

    /// Depth assigned by the last placement, or `None` if never placed.
    pub fn depth(&self, id: ObjectId) -> Option<f64> {
        self.entry(id)?.depth
    }

    /// Screen position of the object's origin.
    pub fn screen_position(&self, id: ObjectId) -> Option<Point> {
        self.entry(id)
            .map(|e| self.projection.iso_to_screen(e.object.bounds.position()))
    }

    /// Nearest tile to the object's origin.
    pub fn tile_position(&self, id: ObjectId) -> Option<Vec3> {
        self.entry(id).map(|e| e.object.bounds.position().round())
    }

    /// Whether the object was visible in the last step.
    pub fn is_visible(&self, id: ObjectId) -> bool {
        self.visible.contains(&id)
    }

    /// Objects visible in the last step.
    ///
    /// Ordered by visibility collection (slot order), with removals filled
    /// by the last entry. Depth order follows the dependency edges instead.
    pub fn visible(&self) -> &[ObjectId] {
        self.visible.as_slice()
    }

    /// Objects `id` is placed after (those occluding it).
    pub fn self_depends(&self, id: ObjectId) -> &[ObjectId] {
        if !self.is_alive(id) {
            return &[];
        }
        self.graph.self_depends(id)
    }

    /// Objects placed after `id` (those it occludes).
    pub fn their_depends(&self, id: ObjectId) -> &[ObjectId] {
        if !self.is_alive(id) {
            return &[];
        }
        self.graph.their_depends(id)
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Bucket range of a visible object as of the last step.
    pub fn bucket_range(&self, id: ObjectId) -> Option<BucketRange> {
        if !self.is_alive(id) {
            return None;
        }
        self.grid.range_of(id)
    }

    /// The bucket grid built by the last step.
    pub fn grid(&self) -> &BucketGrid {
        &self.grid
    }

    /// Run one sort step. Returns `true` if depths were reassigned.
    ///
    /// `view` of `None` means there is no camera: nothing is visible, and
    /// every previously visible object drops its edges.
    pub fn step(&mut self, view: Option<&dyn Visibility>) -> bool {
        self.collect_visible(view);

        self.scratch.clear();
        for &id in &self.visible {
            let bounds = bounds_in(&self.objects, id);
            self.scratch.push((id, bounds));
        }
        self.grid.rebuild(&self.scratch);
        log::trace!(
            "bucket grid: edge {} extent {:?} for {} objects",
            self.grid.edge(),
            self.grid.extent(),
            self.scratch.len()
        );

        let mut changed = core::mem::take(&mut self.dirty);
        let (mut entered, mut moved, mut left) = (0_usize, 0_usize, 0_usize);

        for &id in &self.visible {
            let is_new = !self.old_visible.contains(&id);
            let Some(entry) = slot_mut(&mut self.objects, id) else {
                continue;
            };
            let is_moved = entry.flags.contains(ObjectFlags::MOVED);
            entry.flags.remove(ObjectFlags::MOVED);
            if entry.object.mode == DepthMode::Volumetric && entry.volume.refresh(&entry.render_bounds) {
                changed = true;
            }
            if is_new || is_moved {
                let objects = &self.objects;
                self.graph.rebuild(id, &self.grid, |o| bounds_in(objects, o));
                changed = true;
                if is_new {
                    entered += 1;
                } else {
                    moved += 1;
                }
            }
        }

        for &id in &self.old_visible {
            if !self.visible.contains(&id) {
                self.graph.clear(id);
                changed = true;
                left += 1;
            }
        }

        if changed {
            log::debug!(
                "iso sort: {entered} entered, {moved} moved, {left} left, {} visible, {} edges",
                self.visible.len(),
                self.graph.edge_count()
            );
            let (start, step) = self.settings.depth.start_and_step(self.visible.len());
            self.placer.place_all(
                self.visible.as_slice(),
                &self.graph,
                &mut self.objects,
                start,
                step,
            );
        }
        changed
    }

    /// Swap the visible buffers and refill the current one from `view`.
    fn collect_visible(&mut self, view: Option<&dyn Visibility>) {
        self.old_visible.clear();
        if let Some(view) = view {
            for (i, slot) in self.objects.iter_mut().enumerate() {
                let Some(e) = slot else {
                    continue;
                };
                let screen = self.projection.screen_bounds(&e.object.bounds);
                if view.is_visible(&e.object.bounds, screen) {
                    e.flags.remove(ObjectFlags::PLACED);
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "ObjectId uses 32-bit indices by design."
                    )]
                    self.old_visible.insert(ObjectId::new(i as u32, e.generation));
                }
            }
        }
        core::mem::swap(&mut self.visible, &mut self.old_visible);
    }

    fn mark_moved(&mut self, id: ObjectId) {
        if !self.visible.contains(&id) {
            return;
        }
        if let Some(e) = slot_mut(&mut self.objects, id) {
            e.flags.insert(ObjectFlags::MOVED);
            self.dirty = true;
        }
    }

    fn entry(&self, id: ObjectId) -> Option<&Entry> {
        self.objects
            .get(id.idx())?
            .as_ref()
            .filter(|e| e.generation == id.1)
    }

    fn entry_mut(&mut self, id: ObjectId) -> Option<&mut Entry> {
        slot_mut(&mut self.objects, id)
    }
}

fn check_settings(settings: &SortSettings) {
    if let Err(err) = settings.validate() {
        log::warn!("iso sort settings {settings:?}: {err}");
    }
}

fn slot_mut(objects: &mut [Option<Entry>], id: ObjectId) -> Option<&mut Entry> {
    objects
        .get_mut(id.idx())?
        .as_mut()
        .filter(|e| e.generation == id.1)
}

fn bounds_in(objects: &[Option<Entry>], id: ObjectId) -> IsoBox {
    objects
        .get(id.idx())
        .and_then(|slot| slot.as_ref())
        .filter(|e| e.generation == id.1)
        .map(|e| e.object.bounds)
        .expect("world invariant violated: visible set references a removed object")
}
