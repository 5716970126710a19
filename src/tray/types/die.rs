//! Die faces and die identity
//!
//! Every die in the tray is a cube with six labeled faces. A face is a fixed
//! outward normal in body-local space plus the symbol printed on it.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of faces on a tray die.
pub const FACE_COUNT: usize = 6;

/// Index of a die inside the tray.
///
/// Physics backends map it to their rigid body and render backends to their
/// visual proxy, so one id names both halves of the same die.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DieId(pub usize);

/// Symbol printed on a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceSymbol {
    Plus,
    Minus,
    Blank,
}

impl FaceSymbol {
    pub fn value(&self) -> i32 {
        match self {
            FaceSymbol::Plus => 1,
            FaceSymbol::Minus => -1,
            FaceSymbol::Blank => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FaceSymbol::Plus => "plus",
            FaceSymbol::Minus => "minus",
            FaceSymbol::Blank => "blank",
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            FaceSymbol::Plus => '+',
            FaceSymbol::Minus => '-',
            FaceSymbol::Blank => ' ',
        }
    }
}

/// One face of a die: body-local outward normal and its symbol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Face {
    pub normal: Vec3,
    pub symbol: FaceSymbol,
}

impl Face {
    pub const fn new(normal: Vec3, symbol: FaceSymbol) -> Self {
        Self { normal, symbol }
    }
}

/// The six faces of a die, in lookup order.
///
/// Order matters: when two faces are equally aligned with "up" the first one
/// wins.
#[derive(Clone, Debug, PartialEq)]
pub struct DieFaces {
    faces: [Face; FACE_COUNT],
}

impl DieFaces {
    pub fn new(faces: [Face; FACE_COUNT]) -> Self {
        Self { faces }
    }

    /// Fate dice: two plus, two minus and two blank faces, plus opposite minus.
    pub fn fate() -> Self {
        Self::new([
            Face::new(Vec3::X, FaceSymbol::Plus),
            Face::new(Vec3::NEG_X, FaceSymbol::Minus),
            Face::new(Vec3::Y, FaceSymbol::Plus),
            Face::new(Vec3::NEG_Y, FaceSymbol::Minus),
            Face::new(Vec3::Z, FaceSymbol::Blank),
            Face::new(Vec3::NEG_Z, FaceSymbol::Blank),
        ])
    }

    pub fn faces(&self) -> &[Face; FACE_COUNT] {
        &self.faces
    }

    pub fn iter(&self) -> impl Iterator<Item = &Face> {
        self.faces.iter()
    }
}

impl Default for DieFaces {
    fn default() -> Self {
        Self::fate()
    }
}
