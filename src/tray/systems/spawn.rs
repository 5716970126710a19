//! Randomized launch conditions for a fresh roll

use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

use crate::tray::ports::BodyState;
use crate::tray::types::{ContainmentBounds, SpawnSettings};

/// Pick a random launch state for die number `index`.
///
/// Dice start inside the bounds inset by the spawn margin, above the floor,
/// moving upward with a random horizontal drift and spin. Each die gets its
/// own height band so no two dice start interpenetrating.
pub fn launch_state(
    rng: &mut impl Rng,
    bounds: &ContainmentBounds,
    spawn: &SpawnSettings,
    die_size: f32,
    index: usize,
) -> BodyState {
    let area = bounds.inset(spawn.margin.max(die_size * 0.5));

    let x = if area.half_width > 0.0 {
        rng.gen_range(-area.half_width..=area.half_width)
    } else {
        0.0
    };
    let z = if area.half_depth > 0.0 {
        rng.gen_range(-area.half_depth..=area.half_depth)
    } else {
        0.0
    };
    let jitter = if spawn.height_jitter > 0.0 {
        rng.gen_range(0.0..spawn.height_jitter)
    } else {
        0.0
    };
    let y = spawn.height + index as f32 * die_size * 1.5 + jitter;

    let horizontal = spawn.launch_horizontal.abs();
    let linvel = Vec3::new(
        symmetric(rng, horizontal),
        rng.gen_range(spawn.launch_up_min..=spawn.launch_up_max),
        symmetric(rng, horizontal),
    );

    let spin = spawn.launch_spin.abs();
    let angvel = Vec3::new(
        symmetric(rng, spin),
        symmetric(rng, spin),
        symmetric(rng, spin),
    );

    let rotation = Quat::from_euler(
        EulerRot::XYZ,
        rng.gen_range(0.0..TAU),
        rng.gen_range(0.0..TAU),
        rng.gen_range(0.0..TAU),
    )
    .normalize();

    BodyState {
        position: Vec3::new(x, y, z),
        rotation,
        linvel,
        angvel,
    }
}

fn symmetric(rng: &mut impl Rng, range: f32) -> f32 {
    if range > 0.0 {
        rng.gen_range(-range..=range)
    } else {
        0.0
    }
}
