// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene objects: identifiers, host-facing description, and per-object sort state.

use smallvec::SmallVec;

use crate::types::{DepthExtent, DepthMode, IsoBox, RenderBounds, Vec3};

/// Tolerance used when deciding whether cached volumetric bounds changed.
pub(crate) const BOUNDS_EPSILON: f64 = 1e-5;

/// Identifier for an object in a [`World`](crate::World) (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32, pub(crate) u32);

impl ObjectId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Host-facing description of an isometric object.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsoObject {
    /// Occupied box in iso space.
    pub bounds: IsoBox,
    /// Whether the object is a flat sprite or spans a depth range.
    pub mode: DepthMode,
}

impl IsoObject {
    /// A flat object at `position` with `size` (negative components clamp to zero).
    pub fn new(position: Vec3, size: Vec3) -> Self {
        Self {
            bounds: IsoBox::new(position, size),
            mode: DepthMode::Flat,
        }
    }

    /// A flat unit cube at `position`.
    pub fn unit(position: Vec3) -> Self {
        Self::new(position, Vec3::ONE)
    }

    /// Returns a copy using `mode`.
    pub fn with_mode(mut self, mode: DepthMode) -> Self {
        self.mode = mode;
        self
    }
}

bitflags::bitflags! {
    /// Per-object sort bookkeeping.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub(crate) struct ObjectFlags: u8 {
        /// Position or size changed while visible; edges need a rebuild.
        const MOVED  = 0b0000_0001;
        /// Already assigned a depth in the current placement pass.
        const PLACED = 0b0000_0010;
    }
}

/// Cached depth range of a volumetric object.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct VolumeCache {
    /// Union of the render bounds along the depth axis.
    pub(crate) extent: DepthExtent,
    /// Offset from the object's depth to the center of `extent`.
    pub(crate) offset: f64,
}

impl VolumeCache {
    /// Recompute from `parts`; returns `true` if the cache changed beyond tolerance.
    pub(crate) fn refresh(&mut self, parts: &[RenderBounds]) -> bool {
        let extent = DepthExtent::from_render_bounds(parts);
        let offset = -extent.center();
        if self.extent.approx_eq(&extent, BOUNDS_EPSILON)
            && crate::util::approx_eq(self.offset, offset, BOUNDS_EPSILON)
        {
            return false;
        }
        self.extent = extent;
        self.offset = offset;
        true
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Entry {
    pub(crate) generation: u32,
    pub(crate) object: IsoObject,
    pub(crate) flags: ObjectFlags,
    pub(crate) depth: Option<f64>,
    pub(crate) render_bounds: SmallVec<[RenderBounds; 2]>,
    pub(crate) volume: VolumeCache,
}

impl Entry {
    pub(crate) fn new(generation: u32, object: IsoObject) -> Self {
        Self {
            generation,
            object,
            flags: ObjectFlags::empty(),
            depth: None,
            render_bounds: SmallVec::new(),
            volume: VolumeCache::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_cache_ignores_tiny_changes() {
        let mut cache = VolumeCache::default();
        let parts = [RenderBounds::new(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(1.0, 1.0, 1.0),
        )];
        assert!(cache.refresh(&parts));
        assert_eq!(cache.extent, DepthExtent::new(1.0, 3.0));
        assert_eq!(cache.offset, -2.0);
        assert!(!cache.refresh(&parts));

        let nudged = [RenderBounds::new(
            Vec3::new(0.0, 0.0, 2.0 + 1e-7),
            Vec3::new(1.0, 1.0, 1.0),
        )];
        assert!(!cache.refresh(&nudged));

        let moved = [RenderBounds::new(
            Vec3::new(0.0, 0.0, 2.5),
            Vec3::new(1.0, 1.0, 1.0),
        )];
        assert!(cache.refresh(&moved));
        assert_eq!(cache.offset, -2.5);
    }

    #[test]
    fn iso_object_clamps_size() {
        let o = IsoObject::new(Vec3::ZERO, Vec3::new(-2.0, 1.0, 1.0));
        assert_eq!(o.bounds.size(), Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(o.mode, DepthMode::Flat);
        let o = o.with_mode(DepthMode::Volumetric);
        assert_eq!(o.mode, DepthMode::Volumetric);
    }
}
