//! Rendering helpers for face symbols
//!
//! Symbols are built from thin bars laid flat on each face: one bar for
//! minus, two crossed bars for plus, nothing for blank.

use bevy::prelude::*;
use std::f32::consts::FRAC_PI_2;

use crate::tray::types::{Face, FaceSymbol};

/// How far a symbol floats above its face, in die sizes.
const SYMBOL_LIFT: f32 = 0.006;

/// Bar dimensions in die sizes: length, width, thickness.
const BAR_SIZE: Vec3 = Vec3::new(0.56, 0.13, 0.02);

/// Mesh for a single symbol bar, lying in the local XY plane.
pub fn symbol_bar_mesh(die_size: f32) -> Mesh {
    let size = BAR_SIZE * die_size;
    Mesh::from(Cuboid::new(size.x, size.y, size.z))
}

/// Local transforms (relative to the die) of every bar drawing `face`.
pub fn symbol_bar_transforms(face: &Face, die_size: f32) -> Vec<Transform> {
    // The bar mesh faces +Z; turn it to face outward along the face normal.
    let rotation = Quat::from_rotation_arc(Vec3::Z, face.normal);
    let translation = face.normal * die_size * (0.5 + SYMBOL_LIFT);
    let bar = Transform {
        translation,
        rotation,
        scale: Vec3::ONE,
    };

    match face.symbol {
        FaceSymbol::Blank => Vec::new(),
        FaceSymbol::Minus => vec![bar],
        FaceSymbol::Plus => vec![
            bar,
            Transform {
                rotation: rotation * Quat::from_rotation_z(FRAC_PI_2),
                ..bar
            },
        ],
    }
}
