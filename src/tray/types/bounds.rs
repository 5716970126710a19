//! Containment bounds
//!
//! The playable floor is a rectangle centered at the origin on the XZ plane,
//! sized from the viewport so it always fills the visible area. Walls sit just
//! outside it and a soft clamp keeps dice inside even if a wall is tunneled.

use bevy::prelude::*;

/// Wall height in die sizes.
pub const WALL_HEIGHT_DICE: f32 = 12.0;

/// Wall thickness in die sizes.
pub const WALL_THICKNESS_DICE: f32 = 2.0;

/// Size of the drawing surface in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero, negative or non-finite dimensions cannot produce a tray.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Half extents of the playable floor area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainmentBounds {
    pub half_width: f32,
    pub half_depth: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WallSide {
    Front,
    Back,
    Left,
    Right,
}

/// Placement of one wall collider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSpec {
    pub side: WallSide,
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl ContainmentBounds {
    pub fn new(half_width: f32, half_depth: f32) -> Self {
        Self {
            half_width,
            half_depth,
        }
    }

    /// Derive bounds from the viewport and the fixed vertical world view size.
    ///
    /// Returns `None` for degenerate viewports so callers keep their previous
    /// bounds.
    pub fn from_viewport(viewport: Viewport, view_size: f32) -> Option<Self> {
        if viewport.is_degenerate() || !(view_size > 0.0) {
            return None;
        }
        let half_depth = view_size * 0.5;
        Some(Self::new(half_depth * viewport.aspect(), half_depth))
    }

    /// Bounds shrunk by `margin` on every side, never below zero.
    pub fn inset(&self, margin: f32) -> Self {
        Self::new(
            (self.half_width - margin).max(0.0),
            (self.half_depth - margin).max(0.0),
        )
    }

    pub fn contains(&self, point: Vec3, tolerance: f32) -> bool {
        point.x.abs() <= self.half_width + tolerance && point.z.abs() <= self.half_depth + tolerance
    }

    /// The four walls, placed just outside the half extents.
    pub fn walls(&self, die_size: f32) -> [WallSpec; 4] {
        let thickness = WALL_THICKNESS_DICE * die_size;
        let half_height = WALL_HEIGHT_DICE * die_size * 0.5;
        let half_thickness = thickness * 0.5;
        // Long walls overlap the corners so nothing slips through the seams.
        let span_x = self.half_width + thickness;
        let span_z = self.half_depth + thickness;

        [
            WallSpec {
                side: WallSide::Front,
                center: Vec3::new(0.0, half_height, self.half_depth + half_thickness),
                half_extents: Vec3::new(span_x, half_height, half_thickness),
            },
            WallSpec {
                side: WallSide::Back,
                center: Vec3::new(0.0, half_height, -(self.half_depth + half_thickness)),
                half_extents: Vec3::new(span_x, half_height, half_thickness),
            },
            WallSpec {
                side: WallSide::Left,
                center: Vec3::new(-(self.half_width + half_thickness), half_height, 0.0),
                half_extents: Vec3::new(half_thickness, half_height, span_z),
            },
            WallSpec {
                side: WallSide::Right,
                center: Vec3::new(self.half_width + half_thickness, half_height, 0.0),
                half_extents: Vec3::new(half_thickness, half_height, span_z),
            },
        ]
    }

    /// Soft containment for a body center.
    ///
    /// A body past `half - margin` on X or Z is snapped back onto the limit and
    /// the offending velocity component is reflected and scaled by `damping`.
    /// Returns `true` when anything was changed.
    pub fn contain(
        &self,
        margin: f32,
        damping: f32,
        position: &mut Vec3,
        linvel: &mut Vec3,
    ) -> bool {
        let limit = self.inset(margin);
        let mut changed = false;

        if position.x > limit.half_width {
            position.x = limit.half_width;
            linvel.x = -linvel.x.abs() * damping;
            changed = true;
        } else if position.x < -limit.half_width {
            position.x = -limit.half_width;
            linvel.x = linvel.x.abs() * damping;
            changed = true;
        }

        if position.z > limit.half_depth {
            position.z = limit.half_depth;
            linvel.z = -linvel.z.abs() * damping;
            changed = true;
        } else if position.z < -limit.half_depth {
            position.z = -limit.half_depth;
            linvel.z = linvel.z.abs() * damping;
            changed = true;
        }

        changed
    }
}
