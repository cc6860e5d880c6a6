// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pairwise draw-order test for iso boxes.
//!
//! Box `a` *reaches* box `b` when `a`'s far corner lies beyond `b`'s minimum
//! along x and y, and `a`'s bottom lies below `b`'s top. Two boxes are
//! *related* when each reaches the other. For related boxes
//! the decisive axis is the one with the least mutual overlap, measured as
//! `size_a + size_b - |da - db|` where `da`/`db` are the penetration depths
//! of each box into the other. Ties prefer x, then y, then z.

use crate::types::{IsoBox, Vec3};

/// Per-axis "reaches past" test of `a` against `b`.
#[inline]
fn reaches(a: &IsoBox, b: &IsoBox) -> bool {
    let a_min = a.min();
    let a_max = a.max();
    let b_min = b.min();
    let b_max = b.max();
    a_max.x > b_min.x && a_max.y > b_min.y && b_max.z > a_min.z
}

/// Penetration of `a` into `b` per axis (z uses the mirrored term).
#[inline]
fn penetration(a: &IsoBox, b: &IsoBox) -> Vec3 {
    let a_min = a.min();
    let a_max = a.max();
    let b_min = b.min();
    let b_max = b.max();
    Vec3::new(a_max.x - b_min.x, a_max.y - b_min.y, b_max.z - a_min.z)
}

/// Whether `a` and `b` are comparable in both directions.
#[inline]
pub fn related(a: &IsoBox, b: &IsoBox) -> bool {
    reaches(a, b) && reaches(b, a)
}

/// Whether `a` lies behind `b`, so `b` occludes `a`.
///
/// The dependency graph places `b` before `a`, giving `a` the larger depth.
/// For related boxes exactly one direction holds unless both boxes penetrate
/// each other equally on the decisive axis. For unrelated boxes this falls
/// back to the one-sided reach test; the dependency scan asks both directions
/// so an edge is never lost to that asymmetry.
///
/// ```
/// use understory_iso_sort::{IsoBox, Vec3, occlusion::is_behind};
///
/// let near = IsoBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::ONE);
/// let far = IsoBox::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ONE);
/// assert!(is_behind(&far, &near));
/// assert!(!is_behind(&near, &far));
/// ```
pub fn is_behind(a: &IsoBox, b: &IsoBox) -> bool {
    let a_yes = reaches(a, b);
    if !(a_yes && reaches(b, a)) {
        return a_yes;
    }
    let da = penetration(a, b);
    let db = penetration(b, a);
    let overlap = a.size() + b.size() - (da - db).abs();
    if overlap.x <= overlap.y && overlap.x <= overlap.z {
        da.x > db.x
    } else if overlap.y <= overlap.x && overlap.y <= overlap.z {
        da.y > db.y
    } else {
        da.z > db.z
    }
}
