// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Iso ↔ screen projection.
//!
//! Screen space has `x` to the right and `y` up. One iso unit along `x` maps
//! to `(tile, tile / 2)` on screen, along `y` to `(-tile, tile / 2)`, and
//! along `z` to `(0, tile)`.

use kurbo::{Point, Rect};

use crate::types::{IsoBox, Vec3};

/// Smallest accepted tile size.
const MIN_TILE_SIZE: f64 = f64::EPSILON;

/// Dimetric 2:1 projection scaled by a tile size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsoProjection {
    tile_size: f64,
}

impl Default for IsoProjection {
    fn default() -> Self {
        Self::new(32.0)
    }
}

impl IsoProjection {
    /// Create a projection; `tile_size` is clamped to a tiny positive value.
    pub fn new(tile_size: f64) -> Self {
        Self {
            tile_size: tile_size.max(MIN_TILE_SIZE),
        }
    }

    /// Screen size of one iso unit.
    #[inline]
    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Project an iso point to the screen.
    #[inline]
    pub fn iso_to_screen(&self, p: Vec3) -> Point {
        Point::new(
            (p.x - p.y) * self.tile_size,
            ((p.x + p.y) * 0.5 + p.z) * self.tile_size,
        )
    }

    /// Unproject a screen point onto the ground plane (`z = 0`).
    #[inline]
    pub fn screen_to_iso(&self, s: Point) -> Vec3 {
        Vec3::new(
            (s.x * 0.5 + s.y) / self.tile_size,
            (s.y - s.x * 0.5) / self.tile_size,
            0.0,
        )
    }

    /// Unproject a screen point onto the plane at height `iso_z`.
    #[inline]
    pub fn screen_to_iso_at(&self, s: Point, iso_z: f64) -> Vec3 {
        let ground = self.screen_to_iso(Point::new(s.x, s.y - iso_z * self.tile_size));
        Vec3::new(ground.x, ground.y, iso_z)
    }

    /// Screen rectangle enclosing the projection of `bounds`.
    pub fn screen_bounds(&self, bounds: &IsoBox) -> Rect {
        let min = bounds.min();
        let max = bounds.max();
        let t = self.tile_size;
        Rect::new(
            (min.x - max.y) * t,
            ((min.x + min.y) * 0.5 + min.z) * t,
            (max.x - min.y) * t,
            ((max.x + max.y) * 0.5 + max.z) * t,
        )
    }
}
