// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Iso Sort: incremental depth sorting for isometric scenes.
//!
//! Objects are axis-aligned boxes in iso space (`x` and `y` on the ground,
//! `z` up). Every frame the [`World`] assigns each visible object a scalar
//! depth so that an object occluding another always gets the smaller depth.
//!
//! - A [`BucketGrid`] partitions visible objects into coarse cubic buckets so
//!   only nearby objects are compared.
//! - The pairwise comparator [`occlusion::is_behind`] decides which of two
//!   boxes is drawn first.
//! - A [`DependencyGraph`] keeps the resulting edges and is only rebuilt for
//!   objects that moved or came into view.
//! - Placement walks the graph depth-first and hands out strictly increasing
//!   depths, optionally stretched by the depth extent of volumetric objects.
//!
//! Rendering, cameras and host integration are left to the caller: visibility
//! comes in through the [`Visibility`] trait and depths go out through
//! [`World::depth`].
//!
//! # Example
//!
//! ```rust
//! use understory_iso_sort::{AllVisible, IsoObject, SortSettings, Vec3, World};
//!
//! let mut world = World::new(SortSettings::with_span(1.0, 100.0));
//! let floor = world.insert(IsoObject::new(Vec3::ZERO, Vec3::new(2.0, 2.0, 0.0)));
//! let crate_ = world.insert(IsoObject::unit(Vec3::new(0.0, 0.0, 0.0)));
//! world.step(Some(&AllVisible));
//!
//! // The crate rests on the floor and is drawn on top of it.
//! assert!(world.depth(crate_).unwrap() < world.depth(floor).unwrap());
//! assert_eq!(world.self_depends(floor), &[crate_]);
//! ```
//!
//! The comparator can be used on its own:
//!
//! ```rust
//! use understory_iso_sort::{IsoBox, Vec3, occlusion::is_behind};
//!
//! let near = IsoBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::ONE);
//! let far = IsoBox::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ONE);
//! assert!(is_behind(&far, &near));
//! assert!(!is_behind(&near, &far));
//! ```
//!
//! ## Features
//!
//! - `std` *(default)*: enables `kurbo/std`.
//! - `libm`: enables `kurbo/libm` for `no_std` targets.
//!
//! ### Float semantics
//!
//! Positions and sizes are assumed finite. Settings that cannot produce
//! increasing depths are reported by [`SortSettings::validate`] and logged
//! when handed to a [`World`].

#![no_std]

extern crate alloc;

mod graph;
mod grid;
mod object;
pub mod occlusion;
mod ordered_set;
mod placer;
mod projection;
mod settings;
mod types;
pub(crate) mod util;
mod visibility;
mod world;

pub use graph::DependencyGraph;
pub use grid::{BucketGrid, BucketIndex, BucketRange};
pub use object::{IsoObject, ObjectId};
pub use ordered_set::OrderedSet;
pub use projection::IsoProjection;
pub use settings::{DepthRange, SettingsError, SortSettings};
pub use types::{DepthExtent, DepthMode, IsoBox, RenderBounds, Vec3};
pub use visibility::{AllVisible, ScreenView, Visibility};
pub use world::World;
