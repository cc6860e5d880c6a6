// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform 3D bucket grid over the visible objects.
//!
//! The grid is rebuilt every frame. Its cubic buckets are sized from the
//! average footprint of the visible set, so each object touches only a
//! handful of buckets, and occlusion tests are limited to objects found
//! along two conic neighborhoods:
//! - *forward*: buckets that may hold an object in front of the probe
//!   (lower x/y, higher z), and
//! - *backward*: the mirror image, buckets that may hold an object behind it.
//!
//! Bucket storage is pooled: a rebuild recycles the previous frame's buckets
//! instead of reallocating them.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use smallvec::SmallVec;

use crate::object::ObjectId;
use crate::types::{IsoBox, Vec3};
use crate::util;

/// Smallest bucket edge length.
const MIN_BUCKET_EDGE: f64 = 3.0;

/// Most buckets a grid may hold; sparser scenes get a coarser edge.
const MAX_BUCKETS: usize = 1 << 18;

/// Same-level neighbors probed before the cone, as `(dx, dy)`.
const LEVEL_OFFSETS: [(i32, i32); 3] = [(-1, 0), (0, -1), (-1, -1)];

/// Cone cross-section probed at every level step, as `(dx, dy)`.
///
/// The 3x3 block `{0,-1,-2}²` minus the two pure-axis cells `(-2, 0)` and `(0, -2)`.
const CONE_OFFSETS: [(i32, i32); 7] = [
    (0, 0),
    (-1, 0),
    (0, -1),
    (-1, -1),
    (-2, -1),
    (-1, -2),
    (-2, -2),
];

/// Integer coordinate of a bucket.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BucketIndex {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BucketIndex {
    /// Create an index from coordinates.
    #[inline(always)]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.z.saturating_add(dz),
        )
    }

    #[inline]
    fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    #[inline]
    fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(
            self.x.saturating_sub(other.x),
            self.y.saturating_sub(other.y),
            self.z.saturating_sub(other.z),
        )
    }
}

/// Half-open box of buckets `[min, max)` spanned by one object.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BucketRange {
    /// First bucket (inclusive).
    pub min: BucketIndex,
    /// Last bucket (exclusive).
    pub max: BucketIndex,
}

impl BucketRange {
    /// Call `f` for every bucket index in the range, x fastest.
    pub fn for_each(&self, mut f: impl FnMut(BucketIndex)) {
        for z in self.min.z..self.max.z {
            for y in self.min.y..self.max.y {
                for x in self.min.x..self.max.x {
                    f(BucketIndex::new(x, y, z));
                }
            }
        }
    }

    /// Whether `index` lies in the range.
    #[inline]
    pub fn contains(&self, index: BucketIndex) -> bool {
        (self.min.x..self.max.x).contains(&index.x)
            && (self.min.y..self.max.y).contains(&index.y)
            && (self.min.z..self.max.z).contains(&index.z)
    }
}

#[derive(Clone, Debug, Default)]
struct Bucket {
    objects: SmallVec<[ObjectId; 8]>,
}

/// Spatial partition of the visible set into cubic buckets.
pub struct BucketGrid {
    edge: f64,
    origin: BucketIndex,
    extent: BucketIndex,
    buckets: Vec<Bucket>,
    pool: Vec<Bucket>,
    ranges: HashMap<ObjectId, BucketRange>,
}

impl Debug for BucketGrid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BucketGrid")
            .field("edge", &self.edge)
            .field("origin", &self.origin)
            .field("extent", &self.extent)
            .field("buckets", &self.buckets.len())
            .field("pooled", &self.pool.len())
            .field("objects", &self.ranges.len())
            .finish_non_exhaustive()
    }
}

impl Default for BucketGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketGrid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self {
            edge: MIN_BUCKET_EDGE,
            origin: BucketIndex::default(),
            extent: BucketIndex::new(1, 1, 1),
            buckets: Vec::new(),
            pool: Vec::new(),
            ranges: HashMap::new(),
        }
    }

    /// Bucket edge length chosen by the last rebuild.
    #[inline]
    pub fn edge(&self) -> f64 {
        self.edge
    }

    /// Global bucket coordinate of local bucket `(0, 0, 0)`.
    #[inline]
    pub fn origin(&self) -> BucketIndex {
        self.origin
    }

    /// Number of buckets along each axis.
    #[inline]
    pub fn extent(&self) -> BucketIndex {
        self.extent
    }

    /// Bucket range of `id` in the local frame, if it took part in the last rebuild.
    #[inline]
    pub fn range_of(&self, id: ObjectId) -> Option<BucketRange> {
        self.ranges.get(&id).copied()
    }

    /// Objects stored in the bucket at `index`, or `None` when out of range.
    pub fn bucket(&self, index: BucketIndex) -> Option<&[ObjectId]> {
        self.slot(index).map(|s| self.buckets[s].objects.as_slice())
    }

    /// Repartition the grid around `items`.
    ///
    /// Bucket edge: `max(3, round(mean(max(size.x, size.y, size.z))))`.
    /// Each object spans `floor(pos / edge)` to `ceil((pos + max(size, 1)) / edge)`
    /// per axis; the grid covers the union of those spans and the origin cell.
    /// If that would exceed 2^18 buckets, the edge is doubled until
    /// it does not.
    pub fn rebuild(&mut self, items: &[(ObjectId, IsoBox)]) {
        self.edge = bucket_edge(items);
        let (lo, hi) = loop {
            let (lo, hi) = global_bounds(items, self.edge);
            if bucket_count(hi.sub(lo).max(BucketIndex::new(1, 1, 1))).is_some() {
                break (lo, hi);
            }
            log::debug!(
                "bucket grid: {} objects span too many buckets at edge {}, doubling",
                items.len(),
                self.edge
            );
            self.edge *= 2.0;
        };
        self.origin = lo;
        self.extent = hi.sub(lo).max(BucketIndex::new(1, 1, 1));

        self.ranges.clear();
        for &(id, bounds) in items {
            let global = global_range(&bounds, self.edge);
            let local = BucketRange {
                min: global.min.sub(lo),
                max: global.max.sub(lo),
            };
            self.ranges.insert(id, local);
        }

        self.recycle_buckets();
        let count = bucket_count(self.extent)
            .expect("bucket grid invariant violated: extent was sized to fit the bucket cap");
        self.buckets.reserve(count);
        while self.buckets.len() < count {
            let bucket = self.pool.pop().unwrap_or_default();
            self.buckets.push(bucket);
        }

        for &(id, _) in items {
            let local = self.ranges[&id];
            let buckets = &mut self.buckets;
            let extent = self.extent;
            local.for_each(|index| {
                if let Some(s) = slot_in(extent, index) {
                    buckets[s].objects.push(id);
                }
            });
        }
    }

    /// Visit `index` and the buckets that may hold objects in front of it.
    ///
    /// Order: the bucket itself, its `-x`, `-y` and `-x-y` neighbors on the
    /// same level, then for `i` in `0..=extent.z` the seven-cell cone section
    /// at `(-i, -i, i + 1)`. Nothing is visited if `index` is out of range;
    /// out-of-range neighbors are skipped.
    pub fn visit_forward(&self, index: BucketIndex, f: impl FnMut(&[ObjectId])) {
        self.visit_cone(index, 1, f);
    }

    /// Mirror of [`visit_forward`](Self::visit_forward): buckets that may hold
    /// objects behind `index` (higher x/y, lower z).
    pub fn visit_backward(&self, index: BucketIndex, f: impl FnMut(&[ObjectId])) {
        self.visit_cone(index, -1, f);
    }

    fn visit_cone(&self, index: BucketIndex, sign: i32, mut f: impl FnMut(&[ObjectId])) {
        let Some(s) = self.slot(index) else {
            return;
        };
        f(&self.buckets[s].objects);
        for (dx, dy) in LEVEL_OFFSETS {
            if let Some(b) = self.bucket(index.offset(sign * dx, sign * dy, 0)) {
                f(b);
            }
        }
        for i in 0..=self.extent.z {
            let base = index.offset(-sign * i, -sign * i, sign * (i + 1));
            for (dx, dy) in CONE_OFFSETS {
                if let Some(b) = self.bucket(base.offset(sign * dx, sign * dy, 0)) {
                    f(b);
                }
            }
        }
    }

    fn recycle_buckets(&mut self) {
        for mut bucket in self.buckets.drain(..) {
            bucket.objects.clear();
            self.pool.push(bucket);
        }
    }

    #[inline]
    fn slot(&self, index: BucketIndex) -> Option<usize> {
        slot_in(self.extent, index)
    }
}

/// Flat slot of `index` in a grid of `extent`, x fastest.
#[allow(
    clippy::cast_sign_loss,
    reason = "Negative coordinates are rejected before the casts."
)]
#[inline]
fn slot_in(extent: BucketIndex, index: BucketIndex) -> Option<usize> {
    if index.x < 0 || index.y < 0 || index.z < 0 {
        return None;
    }
    if index.x >= extent.x || index.y >= extent.y || index.z >= extent.z {
        return None;
    }
    let (x, y, z) = (index.x as usize, index.y as usize, index.z as usize);
    Some(x + extent.x as usize * (y + z * extent.y as usize))
}

/// Number of buckets in a grid of `extent`, or `None` above [`MAX_BUCKETS`].
#[allow(
    clippy::cast_sign_loss,
    reason = "Extents are clamped to at least one bucket per axis."
)]
fn bucket_count(extent: BucketIndex) -> Option<usize> {
    (extent.x as usize)
        .checked_mul(extent.y as usize)?
        .checked_mul(extent.z as usize)
        .filter(|&n| n <= MAX_BUCKETS)
}

/// Union of the global bucket ranges of `items` and the origin cell.
fn global_bounds(items: &[(ObjectId, IsoBox)], edge: f64) -> (BucketIndex, BucketIndex) {
    let mut lo = BucketIndex::new(0, 0, 0);
    let mut hi = BucketIndex::new(1, 1, 1);
    for (_, bounds) in items {
        let range = global_range(bounds, edge);
        lo = lo.min(range.min);
        hi = hi.max(range.max);
    }
    (lo, hi)
}

#[allow(
    clippy::cast_precision_loss,
    reason = "Visible sets are far below 2^52 objects."
)]
fn bucket_edge(items: &[(ObjectId, IsoBox)]) -> f64 {
    if items.is_empty() {
        return MIN_BUCKET_EDGE;
    }
    let total: f64 = items.iter().map(|(_, b)| b.size().max_element()).sum();
    (total / items.len() as f64).round().max(MIN_BUCKET_EDGE)
}

fn global_range(bounds: &IsoBox, edge: f64) -> BucketRange {
    let min = bounds.position();
    let max = min + bounds.size().max(Vec3::ONE);
    BucketRange {
        min: BucketIndex::new(
            util::div_floor(min.x, edge),
            util::div_floor(min.y, edge),
            util::div_floor(min.z, edge),
        ),
        max: BucketIndex::new(
            util::div_ceil(max.x, edge),
            util::div_ceil(max.y, edge),
            util::div_ceil(max.z, edge),
        ),
    }
}
