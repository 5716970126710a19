//! Bevy systems that drive the tray every frame
//!
//! The sync loop itself knows nothing about Bevy; these systems feed it the
//! window size, the caller's controls and the frame clock, then copy the
//! visual buffer back onto the die entities.

use bevy::app::AppExit;
use bevy::prelude::*;
use bevy::window::WindowResized;

use super::setup::projection_scale;
use crate::tray::plugin::{
    ActiveTray, RollFinished, RollingChanged, TrayCamera, TrayControls, TrayDie, TrayHandles,
    UnmountTray,
};
use crate::tray::types::{TrayEvent, Viewport};

/// Forward window resizes to the tray and keep the camera showing the same
/// world height.
pub fn forward_window_resizes(
    mut resized: MessageReader<WindowResized>,
    mut tray: ResMut<ActiveTray>,
    mut cameras: Query<&mut Projection, With<TrayCamera>>,
) {
    let Some(latest) = resized.read().last() else {
        return;
    };
    let Some(sync) = tray.0.active_mut() else {
        return;
    };

    let viewport = Viewport::new(latest.width, latest.height);
    sync.post_resize(viewport);
    if viewport.is_degenerate() {
        return;
    }

    let view_size = sync.settings().view_size;
    for mut projection in cameras.iter_mut() {
        if let Projection::Orthographic(ortho) = projection.as_mut() {
            ortho.scale = projection_scale(view_size, viewport.height);
        }
    }
}

/// Hand the caller's controls to the tray and run a frame when one is due.
pub fn drive_tray(
    time: Res<Time>,
    controls: Res<TrayControls>,
    mut tray: ResMut<ActiveTray>,
    mut rolling: MessageWriter<RollingChanged>,
    mut finished: MessageWriter<RollFinished>,
) {
    let Some(sync) = tray.0.active_mut() else {
        return;
    };

    sync.submit(controls.0);
    if !sync.needs_frame() {
        return;
    }

    let report = sync.frame(time.elapsed_secs_f64());
    for event in report.events {
        match event {
            TrayEvent::RollingChanged(value) => {
                rolling.write(RollingChanged(value));
            }
            TrayEvent::Result(total) => {
                let faces = sync
                    .last_readout()
                    .map(|readout| readout.symbols.clone())
                    .unwrap_or_default();
                finished.write(RollFinished { total, faces });
            }
        }
    }
}

/// Copy the visual buffer onto die entities and materials.
pub fn apply_tray_visuals(
    mut tray: ResMut<ActiveTray>,
    handles: Option<Res<TrayHandles>>,
    mut dice: Query<(&TrayDie, &mut Transform, &mut Visibility)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut clear_color: ResMut<ClearColor>,
) {
    let Some(sync) = tray.0.active_mut() else {
        return;
    };
    let Some(handles) = handles else {
        return;
    };
    let buffer = sync.render_mut();
    if !buffer.take_dirty() {
        return;
    }

    for (die, mut transform, mut visibility) in dice.iter_mut() {
        let Some(visual) = buffer.die(die.0) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        transform.translation = visual.translation;
        transform.rotation = visual.rotation;
        *visibility = if visual.visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }

    let palette = buffer.scheme().palette();
    let opacity = buffer.opacity();
    if let Some(material) = materials.get_mut(&handles.die_material) {
        material.base_color = palette.die.with_alpha(opacity);
    }
    if let Some(material) = materials.get_mut(&handles.symbol_material) {
        material.base_color = palette.symbol.with_alpha(opacity);
    }
    clear_color.0 = palette.background;
}

/// Tear the tray down on app exit or when the caller asks for it.
#[allow(clippy::too_many_arguments)]
pub fn unmount_tray(
    mut commands: Commands,
    mut exits: MessageReader<AppExit>,
    mut requests: MessageReader<UnmountTray>,
    mut tray: ResMut<ActiveTray>,
    handles: Option<Res<TrayHandles>>,
    dice: Query<Entity, With<TrayDie>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let exiting = exits.read().count() > 0;
    let requested = requests.read().count() > 0;
    if !exiting && !requested {
        return;
    }

    if let Some(sync) = tray.0.active_mut() {
        sync.unmount();
    }

    for entity in dice.iter() {
        commands.entity(entity).despawn();
    }

    if let Some(handles) = handles {
        materials.remove(&handles.die_material);
        materials.remove(&handles.symbol_material);
        for mesh in &handles.meshes {
            meshes.remove(mesh);
        }
        commands.remove_resource::<TrayHandles>();
    }
}
