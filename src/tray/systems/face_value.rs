//! Face value extraction
//!
//! Reads which face of a die points toward the viewer (world +Y) and what it
//! is worth.

use bevy::prelude::*;

use crate::tray::types::{DieFaces, Face, FaceSymbol};

/// The face whose rotated normal has the largest dot product with world up.
///
/// Ties keep the first face in table order.
pub fn up_face(faces: &DieFaces, rotation: Quat) -> Face {
    let mut best = faces.faces()[0];
    let mut best_dot = f32::NEG_INFINITY;

    for face in faces.iter() {
        let dot = (rotation * face.normal).dot(Vec3::Y);
        if dot > best_dot {
            best_dot = dot;
            best = *face;
        }
    }

    best
}

pub fn face_value(faces: &DieFaces, rotation: Quat) -> i32 {
    up_face(faces, rotation).symbol.value()
}

/// Face read-out for a whole roll.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollReadout {
    pub symbols: Vec<FaceSymbol>,
    pub total: i32,
}

impl RollReadout {
    pub fn values(&self) -> Vec<i32> {
        self.symbols.iter().map(|s| s.value()).collect()
    }

    /// Compact "+ - 0 +" style rendering.
    pub fn glyphs(&self) -> String {
        self.symbols
            .iter()
            .map(|s| match s {
                FaceSymbol::Blank => '0',
                other => other.glyph(),
            })
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Read every die and sum the values.
pub fn read_roll<I>(faces: &DieFaces, rotations: I) -> RollReadout
where
    I: IntoIterator<Item = Quat>,
{
    let symbols: Vec<FaceSymbol> = rotations
        .into_iter()
        .map(|rotation| up_face(faces, rotation).symbol)
        .collect();
    let total = symbols.iter().map(|s| s.value()).sum();
    RollReadout { symbols, total }
}
