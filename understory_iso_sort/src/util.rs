// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bucket-coordinate and tolerance helpers.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// `floor(value / cell)` as a saturated `i32`.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Bucket coordinates are intentionally i32; out-of-range values are saturated."
)]
#[inline]
pub(crate) fn div_floor(value: f64, cell: f64) -> i32 {
    debug_assert!(cell > 0.0, "bucket edge must be strictly positive");
    let t = value / cell;
    let coord = t as i32;

    // Round towards -∞ (the cast above has already truncated).
    if t < 0.0 && f64::from(coord) > t {
        coord.saturating_sub(1)
    } else {
        coord
    }
}

/// `ceil(value / cell)` as a saturated `i32`.
#[inline]
pub(crate) fn div_ceil(value: f64, cell: f64) -> i32 {
    div_floor(-value, cell).saturating_neg()
}

/// Whether two values are equal within `epsilon`.
#[inline]
pub(crate) fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}
