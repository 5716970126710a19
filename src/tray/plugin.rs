//! Bevy plugin wiring for the dice tray
//!
//! The host application owns [`TrayControls`]: bump the roll token to throw,
//! bump the dismiss token to fade the dice away, flip the scheme at will.
//! The tray answers with [`RollingChanged`] and [`RollFinished`] messages.

use bevy::prelude::*;

use super::physics::RapierWorld;
use super::render::VisualBuffer;
use super::systems::{
    apply_tray_visuals, drive_tray, forward_window_resizes, mount_tray, unmount_tray, Tray,
};
use super::types::{DieId, FaceSymbol, TrayInputs, TraySettings};

/// The tray as mounted inside a Bevy app.
pub type BevyTray = Tray<RapierWorld, VisualBuffer>;

/// Caller-owned signals read by the tray every frame.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct TrayControls(pub TrayInputs);

/// Settings and RNG seed the tray is mounted with.
#[derive(Resource, Clone, Debug, Default)]
pub struct TrayConfig {
    pub settings: TraySettings,
    pub seed: Option<u64>,
}

#[derive(Resource)]
pub struct ActiveTray(pub BevyTray);

/// Assets owned by the tray, released on unmount.
#[derive(Resource)]
pub struct TrayHandles {
    pub die_material: Handle<StandardMaterial>,
    pub symbol_material: Handle<StandardMaterial>,
    pub meshes: Vec<Handle<Mesh>>,
}

/// Marker for a die entity.
#[derive(Component, Clone, Copy, Debug)]
pub struct TrayDie(pub DieId);

#[derive(Component)]
pub struct TrayCamera;

/// Emitted when dice appear (`true`) and once they are fully hidden (`false`).
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RollingChanged(pub bool);

/// Emitted exactly once per roll, when the dice come to rest.
#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub struct RollFinished {
    pub total: i32,
    pub faces: Vec<FaceSymbol>,
}

/// Ask the tray to release everything it holds.
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct UnmountTray;

/// Adds the dice tray to an app.
#[derive(Clone, Debug, Default)]
pub struct DiceTrayPlugin {
    pub settings: TraySettings,
    pub seed: Option<u64>,
    pub initial: TrayInputs,
}

impl Plugin for DiceTrayPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(TrayConfig {
            settings: self.settings.clone(),
            seed: self.seed,
        })
        .insert_resource(TrayControls(self.initial))
        .add_message::<RollingChanged>()
        .add_message::<RollFinished>()
        .add_message::<UnmountTray>()
        .add_systems(Startup, mount_tray)
        .add_systems(
            Update,
            (
                forward_window_resizes,
                drive_tray,
                apply_tray_visuals,
                unmount_tray,
            )
                .chain()
                .run_if(resource_exists::<ActiveTray>),
        );
    }
}
