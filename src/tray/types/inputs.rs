//! Signals exchanged with the surrounding application

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Palette choice. Cosmetic only, never affects face values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

/// Colors used to draw the tray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub die: Color,
    pub symbol: Color,
    pub background: Color,
}

impl ColorScheme {
    pub fn palette(&self) -> Palette {
        match self {
            ColorScheme::Light => Palette {
                die: Color::srgb(0.96, 0.94, 0.90),
                symbol: Color::srgb(0.12, 0.12, 0.14),
                background: Color::srgb(0.85, 0.87, 0.90),
            },
            ColorScheme::Dark => Palette {
                die: Color::srgb(0.16, 0.17, 0.20),
                symbol: Color::srgb(0.92, 0.78, 0.36),
                background: Color::srgb(0.06, 0.07, 0.09),
            },
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ColorScheme::Light => ColorScheme::Dark,
            ColorScheme::Dark => ColorScheme::Light,
        }
    }
}

/// Everything the caller feeds into the tray.
///
/// Tokens are compared by inequality with the previously observed value; only
/// a change means anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrayInputs {
    pub roll_token: u64,
    pub dismiss_token: u64,
    pub scheme: ColorScheme,
}

impl TrayInputs {
    /// Inputs with the roll token bumped.
    pub fn next_roll(self) -> Self {
        Self {
            roll_token: self.roll_token.wrapping_add(1),
            ..self
        }
    }

    /// Inputs with the dismiss token bumped.
    pub fn next_dismiss(self) -> Self {
        Self {
            dismiss_token: self.dismiss_token.wrapping_add(1),
            ..self
        }
    }
}

/// Notifications produced by the tray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrayEvent {
    /// `true` when dice are spawned, `false` once they are hidden again.
    RollingChanged(bool),
    /// Sum of the face values, emitted once per roll at settlement.
    Result(i32),
}
