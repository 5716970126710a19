//! Settle detection
//!
//! A roll is settled once every die has stayed below the velocity thresholds
//! for a number of consecutive frames. The streak debounces brief pauses at
//! the top of a bounce.

use bevy::prelude::*;

use crate::tray::types::SettleSettings;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SettleThresholds {
    pub linear: f32,
    pub angular: f32,
    pub frames: u32,
}

impl SettleThresholds {
    pub fn from_settings(settings: &SettleSettings) -> Self {
        Self {
            linear: settings.linear_threshold,
            angular: settings.angular_threshold,
            frames: settings.frames,
        }
    }

    /// Compares squared speeds, no square roots needed.
    pub fn is_moving(&self, linvel: Vec3, angvel: Vec3) -> bool {
        linvel.length_squared() > self.linear * self.linear
            || angvel.length_squared() > self.angular * self.angular
    }
}

impl Default for SettleThresholds {
    fn default() -> Self {
        Self::from_settings(&SettleSettings::default())
    }
}

/// Per-roll hysteresis counter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettleDetector {
    streak: u32,
    settled: bool,
}

impl SettleDetector {
    /// Feed one frame of (linear, angular) velocities.
    ///
    /// Returns `true` only on the frame the roll becomes settled. Once settled
    /// the detector ignores further motion for the rest of the roll.
    pub fn observe<I>(&mut self, thresholds: &SettleThresholds, motions: I) -> bool
    where
        I: IntoIterator<Item = (Vec3, Vec3)>,
    {
        if self.settled {
            return false;
        }

        let any_moving = motions
            .into_iter()
            .any(|(linvel, angvel)| thresholds.is_moving(linvel, angvel));

        if any_moving {
            self.streak = 0;
            return false;
        }

        self.streak += 1;
        if self.streak >= thresholds.frames {
            self.settled = true;
            return true;
        }
        false
    }

    /// Declare the roll settled regardless of the streak.
    pub fn force_settle(&mut self) -> bool {
        let was_settled = self.settled;
        self.settled = true;
        !was_settled
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}
