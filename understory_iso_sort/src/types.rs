// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive iso-space value types.

use core::ops::{Add, Mul, Neg, Sub};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::util;

/// A 3D vector in iso space.
///
/// `x` and `y` span the ground plane, `z` is height.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// Ground axis running down-right on screen.
    pub x: f64,
    /// Ground axis running down-left on screen.
    pub y: f64,
    /// Height above the ground plane.
    pub z: f64,
}

impl Vec3 {
    /// All components zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// All components one.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Create a vector from components.
    #[inline(always)]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    /// Component-wise minimum.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Largest of the three components.
    #[inline]
    pub fn max_element(self) -> f64 {
        self.x.max(self.y).max(self.z)
    }

    /// Component-wise absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Round each component to the nearest integer (halves away from zero).
    ///
    /// Applied to a position this yields the tile the object snaps to.
    #[inline]
    pub fn round(self) -> Self {
        Self::new(self.x.round(), self.y.round(), self.z.round())
    }

    /// Whether every component is within `epsilon` of `other`.
    #[inline]
    pub fn approx_eq(self, other: Self, epsilon: f64) -> bool {
        util::approx_eq(self.x, other.x, epsilon)
            && util::approx_eq(self.y, other.y, epsilon)
            && util::approx_eq(self.z, other.z, epsilon)
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Axis-aligned box in iso space, stored as origin and size.
///
/// The size is never negative: constructors clamp each component to zero.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IsoBox {
    position: Vec3,
    size: Vec3,
}

impl IsoBox {
    /// Create a box from its minimum corner and size.
    #[inline]
    pub fn new(position: Vec3, size: Vec3) -> Self {
        Self {
            position,
            size: size.max(Vec3::ZERO),
        }
    }

    /// Minimum corner.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Extent along each axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Minimum corner (same as [`position`](Self::position)).
    #[inline]
    pub fn min(&self) -> Vec3 {
        self.position
    }

    /// Maximum corner.
    #[inline]
    pub fn max(&self) -> Vec3 {
        self.position + self.size
    }

    /// Returns a copy moved to `position`.
    #[inline]
    pub fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }

    /// Returns a copy resized to `size` (clamped non-negative).
    #[inline]
    pub fn with_size(self, size: Vec3) -> Self {
        Self::new(self.position, size)
    }
}

/// How an object's depth is derived from its placement slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthMode {
    /// The object occupies a single depth value.
    #[default]
    Flat,
    /// The object spans a depth range taken from its render bounds.
    Volumetric,
}

/// Visual bounds of one renderable part of an object, in object-local space.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RenderBounds {
    /// Center of the bounds.
    pub center: Vec3,
    /// Half extents of the bounds.
    pub extents: Vec3,
}

impl RenderBounds {
    /// Create bounds from center and half extents.
    #[inline]
    pub const fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Whether any extent is positive. Degenerate parts are ignored.
    #[inline]
    pub fn has_volume(&self) -> bool {
        self.extents.x > 0.0 || self.extents.y > 0.0 || self.extents.z > 0.0
    }
}

/// A closed interval along the depth axis.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DepthExtent {
    /// Lower end.
    pub min: f64,
    /// Upper end.
    pub max: f64,
}

impl DepthExtent {
    /// The empty extent at zero.
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    /// Create an extent.
    #[inline]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Length of the interval.
    #[inline]
    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    /// Midpoint of the interval.
    #[inline]
    pub fn center(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// Union of the depth ranges of all parts with volume, or [`DepthExtent::ZERO`].
    pub fn from_render_bounds(parts: &[RenderBounds]) -> Self {
        parts
            .iter()
            .filter(|b| b.has_volume())
            .map(|b| Self::new(b.center.z - b.extents.z, b.center.z + b.extents.z))
            .reduce(|acc, e| Self::new(acc.min.min(e.min), acc.max.max(e.max)))
            .unwrap_or(Self::ZERO)
    }

    /// Whether both ends are within `epsilon` of `other`.
    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        util::approx_eq(self.min, other.min, epsilon) && util::approx_eq(self.max, other.max, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_size_is_clamped() {
        let b = IsoBox::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 2.0, -0.5));
        assert_eq!(b.size(), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(b.max(), Vec3::new(1.0, 4.0, 3.0));

        let b = b.with_size(Vec3::new(3.0, -3.0, 1.0));
        assert_eq!(b.size(), Vec3::new(3.0, 0.0, 1.0));
    }

    #[test]
    fn tile_position_rounds() {
        let p = Vec3::new(1.4, -0.6, 2.5);
        assert_eq!(p.round(), Vec3::new(1.0, -1.0, 3.0));
        // Halves round away from zero on both sides.
        assert_eq!(Vec3::new(-2.5, 0.5, -0.4).round(), Vec3::new(-3.0, 1.0, 0.0));
        assert_eq!(Vec3::new(-1.5, 2.0, -0.0).abs(), Vec3::new(1.5, 2.0, 0.0));
    }

    #[test]
    fn depth_extent_unions_parts_with_volume() {
        let parts = [
            RenderBounds::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 0.5)),
            // Degenerate: ignored even though it would widen the range.
            RenderBounds::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO),
            RenderBounds::new(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0)),
        ];
        let e = DepthExtent::from_render_bounds(&parts);
        assert_eq!(e, DepthExtent::new(-2.0, 1.5));
        assert_eq!(e.size(), 3.5);
        assert_eq!(e.center(), -0.25);
    }

    #[test]
    fn depth_extent_without_parts_is_zero() {
        assert_eq!(DepthExtent::from_render_bounds(&[]), DepthExtent::ZERO);
        let flat = [RenderBounds::default()];
        assert_eq!(DepthExtent::from_render_bounds(&flat), DepthExtent::ZERO);
    }
}
