//! Backend ports
//!
//! The sync loop only talks to physics and rendering through these traits, so
//! the state machine runs the same against rapier, a scripted test world, a
//! Bevy scene or nothing at all.

use bevy::prelude::*;

use crate::tray::types::{ColorScheme, ContainmentBounds, DieId};

/// Kinematic state of one die.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
}

impl BodyState {
    pub fn at_rest(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            linvel: Vec3::ZERO,
            angvel: Vec3::ZERO,
        }
    }
}

impl Default for BodyState {
    fn default() -> Self {
        Self::at_rest(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Rigid-body world holding the floor, the four walls and the dice.
pub trait PhysicsWorld {
    fn die_count(&self) -> usize;

    /// Replace the four walls to match `bounds`. Old walls are removed before
    /// new ones are added.
    fn set_bounds(&mut self, bounds: &ContainmentBounds);

    fn wall_count(&self) -> usize;

    /// Advance by a wall-clock delta. Implementations clamp the delta, scale it
    /// by the simulation speed and integrate in fixed sub-steps.
    fn step(&mut self, wall_clock_delta: f32);

    fn body(&self, die: DieId) -> Option<BodyState>;

    /// Teleport a die and set its velocities, waking it up.
    fn place(&mut self, die: DieId, state: BodyState);

    /// Put a die to sleep so it costs nothing while hidden.
    fn sleep(&mut self, die: DieId);

    /// Drop every body and collider. The world is unusable afterwards.
    fn release(&mut self);
}

/// Visual side of the dice.
pub trait RenderProxy {
    fn sync_transform(&mut self, die: DieId, position: Vec3, rotation: Quat);

    fn set_visible(&mut self, die: DieId, visible: bool);

    /// Opacity shared by all dice materials, 0.0..=1.0.
    fn set_opacity(&mut self, opacity: f32);

    fn set_scheme(&mut self, scheme: ColorScheme);

    /// Release meshes, materials and any other render resources.
    fn release(&mut self);
}
