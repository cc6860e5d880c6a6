// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sorting a small isometric scene across a few frames.
//!
//! This example shows how to:
//! - register floor tiles, crates and a volumetric pillar with a `World`,
//! - step it with a screen-space view so off-screen objects are skipped,
//! - move an object and observe that only its edges are rebuilt.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example iso_scene`

use kurbo::Rect;
use understory_iso_sort::{
    DepthMode, IsoObject, ObjectId, RenderBounds, ScreenView, SortSettings, Vec3, World,
};

fn print_depths(world: &World, names: &[(&str, ObjectId)]) {
    let mut rows: Vec<_> = names
        .iter()
        .filter_map(|&(name, id)| Some((world.depth(id)?, name, world.is_visible(id))))
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (depth, name, visible) in rows {
        let marker = if visible { "" } else { " (hidden)" };
        println!("  {depth:>8.3}  {name}{marker}");
    }
}

fn main() {
    env_logger::init();

    let mut world = World::new(SortSettings::with_span(1.0, 100.0).tile_size(32.0));
    let mut names = Vec::new();

    for y in 0..3 {
        for x in 0..3 {
            let pos = Vec3::new(f64::from(x), f64::from(y), 0.0);
            let id = world.insert(IsoObject::new(pos, Vec3::new(1.0, 1.0, 0.0)));
            names.push(("tile", id));
        }
    }

    let crate_a = world.insert(IsoObject::unit(Vec3::new(0.0, 0.0, 0.0)));
    let crate_b = world.insert(IsoObject::unit(Vec3::new(2.0, 1.0, 0.0)));
    let pillar = world.insert(
        IsoObject::new(Vec3::new(1.0, 2.0, 0.0), Vec3::new(1.0, 1.0, 3.0))
            .with_mode(DepthMode::Volumetric),
    );
    world.set_render_bounds(
        pillar,
        &[RenderBounds::new(Vec3::new(0.0, 0.0, 1.5), Vec3::new(0.5, 0.5, 1.5))],
    );
    let far_away = world.insert(IsoObject::unit(Vec3::new(40.0, 40.0, 0.0)));
    names.extend([
        ("crate a", crate_a),
        ("crate b", crate_b),
        ("pillar", pillar),
        ("far away", far_away),
    ]);

    let view = ScreenView(Rect::new(-256.0, -256.0, 256.0, 256.0));

    println!("frame 1: placed = {}", world.step(Some(&view)));
    print_depths(&world, &names);

    println!("frame 2 (no changes): placed = {}", world.step(Some(&view)));

    world.set_position(crate_a, Vec3::new(1.0, 1.0, 0.0));
    println!("frame 3 (crate a moved): placed = {}", world.step(Some(&view)));
    print_depths(&world, &names);
    for &(name, id) in &names {
        let deps = world.self_depends(id);
        if !deps.is_empty() {
            println!("  {name} is drawn after {} object(s)", deps.len());
        }
    }

    println!("frame 4 (no camera): placed = {}", world.step(None));
    println!("  visible objects: {}", world.visible().len());
}
