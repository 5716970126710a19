//! Render-side buffer
//!
//! `VisualBuffer` is the render proxy the sync loop writes into. It keeps the
//! latest transform, visibility and material state of every die plus a dirty
//! flag; the Bevy plugin copies it onto entities after each frame and the
//! headless roller simply ignores it.

use bevy::prelude::*;

use crate::tray::ports::RenderProxy;
use crate::tray::types::{ColorScheme, DieId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DieVisual {
    pub translation: Vec3,
    pub rotation: Quat,
    pub visible: bool,
}

impl Default for DieVisual {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            visible: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct VisualBuffer {
    dice: Vec<DieVisual>,
    opacity: f32,
    scheme: ColorScheme,
    dirty: bool,
    released: bool,
}

impl VisualBuffer {
    pub fn new(die_count: usize, scheme: ColorScheme) -> Self {
        Self {
            dice: vec![DieVisual::default(); die_count],
            opacity: 1.0,
            scheme,
            dirty: true,
            released: false,
        }
    }

    pub fn dice(&self) -> &[DieVisual] {
        &self.dice
    }

    pub fn die(&self, die: DieId) -> Option<&DieVisual> {
        self.dice.get(die.0)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn any_visible(&self) -> bool {
        self.dice.iter().any(|d| d.visible)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl RenderProxy for VisualBuffer {
    fn sync_transform(&mut self, die: DieId, position: Vec3, rotation: Quat) {
        if let Some(visual) = self.dice.get_mut(die.0) {
            visual.translation = position;
            visual.rotation = rotation;
            self.dirty = true;
        }
    }

    fn set_visible(&mut self, die: DieId, visible: bool) {
        if let Some(visual) = self.dice.get_mut(die.0) {
            visual.visible = visible;
            self.dirty = true;
        }
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.dirty = true;
    }

    fn set_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
        self.dirty = true;
    }

    fn release(&mut self) {
        self.dice.clear();
        self.released = true;
        self.dirty = true;
    }
}
