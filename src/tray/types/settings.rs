//! Tray settings and persistence
//!
//! All tunables of the tray live here. Settings are plain JSON; every field is
//! optional in the file and falls back to its default.

use bevy::log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Physics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSettings {
    /// Downward acceleration in world units per second squared.
    #[serde(default = "default_gravity")]
    pub gravity: f32,

    /// Fixed integration sub-step in seconds.
    #[serde(default = "default_fixed_step")]
    pub fixed_step: f32,

    /// Longest wall-clock delta fed to the integrator; longer hitches are clamped.
    #[serde(default = "default_max_frame_delta")]
    pub max_frame_delta: f32,

    /// Multiplier applied to wall-clock time before integrating.
    #[serde(default = "default_simulation_speed")]
    pub simulation_speed: f32,

    #[serde(default = "default_max_substeps")]
    pub max_substeps: u32,

    #[serde(default = "default_solver_iterations")]
    pub solver_iterations: u32,

    /// Die against floor and walls.
    #[serde(default = "default_floor_friction")]
    pub floor_friction: f32,
    #[serde(default = "default_floor_restitution")]
    pub floor_restitution: f32,

    /// Die against die.
    #[serde(default = "default_dice_friction")]
    pub dice_friction: f32,
    #[serde(default = "default_dice_restitution")]
    pub dice_restitution: f32,

    #[serde(default = "default_die_density")]
    pub die_density: f32,
}

fn default_gravity() -> f32 {
    30.0
}
fn default_fixed_step() -> f32 {
    1.0 / 60.0
}
fn default_max_frame_delta() -> f32 {
    1.0 / 30.0
}
fn default_simulation_speed() -> f32 {
    1.0
}
fn default_max_substeps() -> u32 {
    3
}
fn default_solver_iterations() -> u32 {
    10
}
fn default_floor_friction() -> f32 {
    0.35
}
fn default_floor_restitution() -> f32 {
    0.18
}
fn default_dice_friction() -> f32 {
    0.2
}
fn default_dice_restitution() -> f32 {
    0.45
}
fn default_die_density() -> f32 {
    1.0
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            fixed_step: default_fixed_step(),
            max_frame_delta: default_max_frame_delta(),
            simulation_speed: default_simulation_speed(),
            max_substeps: default_max_substeps(),
            solver_iterations: default_solver_iterations(),
            floor_friction: default_floor_friction(),
            floor_restitution: default_floor_restitution(),
            dice_friction: default_dice_friction(),
            dice_restitution: default_dice_restitution(),
            die_density: default_die_density(),
        }
    }
}

// ============================================================================
// Settle detection
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettleSettings {
    /// A die with a linear speed above this is still moving.
    #[serde(default = "default_linear_threshold")]
    pub linear_threshold: f32,

    /// A die with an angular speed above this is still moving.
    #[serde(default = "default_angular_threshold")]
    pub angular_threshold: f32,

    /// Consecutive still frames required before the roll counts as settled.
    #[serde(default = "default_settle_frames")]
    pub frames: u32,

    /// Simulated seconds after which a roll is read as-is.
    #[serde(default = "default_max_roll_seconds")]
    pub max_roll_seconds: f32,
}

fn default_linear_threshold() -> f32 {
    0.12
}
fn default_angular_threshold() -> f32 {
    0.18
}
fn default_settle_frames() -> u32 {
    18
}
fn default_max_roll_seconds() -> f32 {
    10.0
}

impl Default for SettleSettings {
    fn default() -> Self {
        Self {
            linear_threshold: default_linear_threshold(),
            angular_threshold: default_angular_threshold(),
            frames: default_settle_frames(),
            max_roll_seconds: default_max_roll_seconds(),
        }
    }
}

// ============================================================================
// Spawning
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnSettings {
    /// Distance kept from the walls when picking spawn points, in world units.
    #[serde(default = "default_spawn_margin")]
    pub margin: f32,

    /// Drop height of the lowest die.
    #[serde(default = "default_spawn_height")]
    pub height: f32,

    #[serde(default = "default_spawn_height_jitter")]
    pub height_jitter: f32,

    /// Horizontal launch speed range, symmetric around zero.
    #[serde(default = "default_launch_horizontal")]
    pub launch_horizontal: f32,

    #[serde(default = "default_launch_up_min")]
    pub launch_up_min: f32,

    #[serde(default = "default_launch_up_max")]
    pub launch_up_max: f32,

    /// Spin range per axis, symmetric around zero.
    #[serde(default = "default_launch_spin")]
    pub launch_spin: f32,
}

fn default_spawn_margin() -> f32 {
    1.5
}
fn default_spawn_height() -> f32 {
    5.0
}
fn default_spawn_height_jitter() -> f32 {
    1.0
}
fn default_launch_horizontal() -> f32 {
    4.0
}
fn default_launch_up_min() -> f32 {
    1.0
}
fn default_launch_up_max() -> f32 {
    3.0
}
fn default_launch_spin() -> f32 {
    12.0
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            margin: default_spawn_margin(),
            height: default_spawn_height(),
            height_jitter: default_spawn_height_jitter(),
            launch_horizontal: default_launch_horizontal(),
            launch_up_min: default_launch_up_min(),
            launch_up_max: default_launch_up_max(),
            launch_spin: default_launch_spin(),
        }
    }
}

// ============================================================================
// Tray
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraySettings {
    #[serde(default = "default_die_count")]
    pub die_count: usize,

    /// Edge length of a die in world units.
    #[serde(default = "default_die_size")]
    pub die_size: f32,

    /// Vertical extent of the visible floor in world units.
    #[serde(default = "default_view_size")]
    pub view_size: f32,

    /// Velocity factor applied when the soft clamp pushes a die back inside.
    #[serde(default = "default_clamp_damping")]
    pub clamp_damping: f32,

    #[serde(default = "default_fade_duration_ms")]
    pub fade_duration_ms: u64,

    /// Fade out this long after settling even without a dismiss signal.
    #[serde(default)]
    pub auto_fade_after_ms: Option<u64>,

    #[serde(default)]
    pub physics: PhysicsSettings,

    #[serde(default)]
    pub settle: SettleSettings,

    #[serde(default)]
    pub spawn: SpawnSettings,
}

fn default_die_count() -> usize {
    4
}
fn default_die_size() -> f32 {
    1.0
}
fn default_view_size() -> f32 {
    10.0
}
fn default_clamp_damping() -> f32 {
    0.5
}
fn default_fade_duration_ms() -> u64 {
    700
}

impl Default for TraySettings {
    fn default() -> Self {
        Self {
            die_count: default_die_count(),
            die_size: default_die_size(),
            view_size: default_view_size(),
            clamp_damping: default_clamp_damping(),
            fade_duration_ms: default_fade_duration_ms(),
            auto_fade_after_ms: None,
            physics: PhysicsSettings::default(),
            settle: SettleSettings::default(),
            spawn: SpawnSettings::default(),
        }
    }
}

impl TraySettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read settings {}: {e}", path.display()))?;
        let settings: TraySettings = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse settings {}: {e}", path.display()))?;
        info!("Loaded tray settings from {}", path.display());
        Ok(settings.validated())
    }

    /// Load settings, falling back to defaults when the file is missing or bad.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("{err}; using default tray settings");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to encode settings: {e}"))?;
        std::fs::write(path, text)
            .map_err(|e| format!("Failed to write settings {}: {e}", path.display()))
    }

    /// Replace values that would break the simulation with defaults.
    pub fn validated(mut self) -> Self {
        let defaults = TraySettings::default();

        self.die_count = self.die_count.max(1);
        if !(self.die_size > 0.0) {
            self.die_size = defaults.die_size;
        }
        if !(self.view_size > 0.0) {
            self.view_size = defaults.view_size;
        }
        self.clamp_damping = self.clamp_damping.clamp(0.0, 1.0);
        if self.fade_duration_ms == 0 {
            self.fade_duration_ms = 1;
        }

        let physics = &mut self.physics;
        if !(physics.fixed_step > 0.0) {
            physics.fixed_step = defaults.physics.fixed_step;
        }
        if !(physics.max_frame_delta > 0.0) {
            physics.max_frame_delta = defaults.physics.max_frame_delta;
        }
        if !(physics.simulation_speed > 0.0) {
            physics.simulation_speed = defaults.physics.simulation_speed;
        }
        physics.max_substeps = physics.max_substeps.max(1);
        physics.solver_iterations = physics.solver_iterations.max(1);
        if !(physics.die_density > 0.0) {
            physics.die_density = defaults.physics.die_density;
        }

        self.settle.frames = self.settle.frames.max(1);
        if !(self.settle.max_roll_seconds > 0.0) {
            self.settle.max_roll_seconds = defaults.settle.max_roll_seconds;
        }

        if self.spawn.launch_up_max < self.spawn.launch_up_min {
            std::mem::swap(&mut self.spawn.launch_up_min, &mut self.spawn.launch_up_max);
        }

        self
    }

    pub fn fade_duration_seconds(&self) -> f64 {
        self.fade_duration_ms as f64 / 1000.0
    }

    pub fn auto_fade_after_seconds(&self) -> Option<f64> {
        self.auto_fade_after_ms.map(|ms| ms as f64 / 1000.0)
    }

    /// Margin the soft clamp keeps between a die center and the bounds.
    pub fn clamp_margin(&self) -> f32 {
        self.die_size * 0.5
    }
}
