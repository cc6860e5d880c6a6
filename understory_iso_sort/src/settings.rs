// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sorting configuration.

/// How placement maps onto depth values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DepthRange {
    /// Spread one pass evenly over `[min, max)`.
    ///
    /// The step is `(max - min) / visible_count`, recomputed every pass.
    Span {
        /// Depth of the first placed object.
        min: f64,
        /// Upper bound of the range (exclusive for flat objects).
        max: f64,
    },
    /// Fixed base offset and increment.
    Step {
        /// Depth of the first placed object.
        start: f64,
        /// Increment between consecutive objects. Must be positive.
        step: f64,
    },
}

impl DepthRange {
    /// Start depth and step for a pass over `count` objects.
    #[allow(
        clippy::cast_precision_loss,
        reason = "Visible sets are far below 2^52 objects."
    )]
    pub fn start_and_step(&self, count: usize) -> (f64, f64) {
        match *self {
            Self::Span { min, max } => (min, (max - min) / count.max(1) as f64),
            Self::Step { start, step } => (start, step),
        }
    }
}

impl Default for DepthRange {
    fn default() -> Self {
        Self::Span {
            min: 1.0,
            max: 100.0,
        }
    }
}

/// Tunables for a [`World`](crate::World).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SortSettings {
    /// Screen size of one iso unit. Defaults to 32.
    pub tile_size: f64,
    /// Depth assignment policy. Defaults to `Span { min: 1, max: 100 }`.
    pub depth: DepthRange,
}

impl Default for SortSettings {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            depth: DepthRange::default(),
        }
    }
}

/// Reasons a [`SortSettings`] cannot produce a consistent ordering.
#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum SettingsError {
    /// A value is NaN or infinite.
    #[error("sort settings contain a non-finite value")]
    NonFinite,
    /// `tile_size <= 0`.
    #[error("tile size must be positive, got {0}")]
    NonPositiveTileSize(f64),
    /// `DepthRange::Step` with `step <= 0`.
    #[error("depth step must be positive, got {0}")]
    NonPositiveStep(f64),
    /// `DepthRange::Span` with `max <= min`.
    #[error("depth span is empty: min {min} >= max {max}")]
    EmptySpan {
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },
}

impl SortSettings {
    /// Settings with an explicit start depth and step.
    pub fn with_step(start: f64, step: f64) -> Self {
        Self {
            depth: DepthRange::Step { start, step },
            ..Self::default()
        }
    }

    /// Settings spreading each pass over `[min, max)`.
    pub fn with_span(min: f64, max: f64) -> Self {
        Self {
            depth: DepthRange::Span { min, max },
            ..Self::default()
        }
    }

    /// Returns a copy using `tile_size`.
    pub fn tile_size(mut self, tile_size: f64) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Check that the settings yield strictly increasing depths.
    ///
    /// ```
    /// use understory_iso_sort::{SettingsError, SortSettings};
    ///
    /// assert!(SortSettings::default().validate().is_ok());
    /// assert_eq!(
    ///     SortSettings::with_step(0.0, -1.0).validate(),
    ///     Err(SettingsError::NonPositiveStep(-1.0)),
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), SettingsError> {
        let values = match self.depth {
            DepthRange::Span { min, max } => [self.tile_size, min, max],
            DepthRange::Step { start, step } => [self.tile_size, start, step],
        };
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SettingsError::NonFinite);
        }
        if self.tile_size <= 0.0 {
            return Err(SettingsError::NonPositiveTileSize(self.tile_size));
        }
        match self.depth {
            DepthRange::Span { min, max } if max <= min => Err(SettingsError::EmptySpan { min, max }),
            DepthRange::Step { step, .. } if step <= 0.0 => Err(SettingsError::NonPositiveStep(step)),
            _ => Ok(()),
        }
    }
}
