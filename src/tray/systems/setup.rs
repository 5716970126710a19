//! Scene setup system
//!
//! Mounts the tray at startup: checks for a rendering surface, spawns the
//! camera, light and die entities, and builds the sync loop around them.

use bevy::prelude::*;
use bevy::render::renderer::RenderDevice;
use bevy::window::PrimaryWindow;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::rendering::{symbol_bar_mesh, symbol_bar_transforms};
use super::sync_loop::SyncLoop;
use crate::tray::physics::RapierWorld;
use crate::tray::plugin::{
    ActiveTray, BevyTray, TrayCamera, TrayConfig, TrayControls, TrayDie, TrayHandles,
};
use crate::tray::render::VisualBuffer;
use crate::tray::types::{DieFaces, DieId, TrayInputs, TraySettings, Viewport};

/// Camera height above the floor; only needs to clear the tallest bounce.
const CAMERA_HEIGHT: f32 = 40.0;

/// Orthographic scale that shows `view_size` world units across the window height.
pub fn projection_scale(view_size: f32, window_height: f32) -> f32 {
    if window_height > 0.0 {
        view_size / window_height
    } else {
        1.0
    }
}

/// Build the rapier-backed tray. The physics world and the render buffer are
/// sized from the same validated settings the loop runs with. `viewport` is
/// `None` when there is no surface to draw on.
pub fn build_tray(
    settings: &TraySettings,
    viewport: Option<Viewport>,
    inputs: TrayInputs,
    rng: StdRng,
) -> BevyTray {
    let settings = settings.clone().validated();
    let physics = RapierWorld::new(&settings.physics, settings.die_count, settings.die_size);
    let render = viewport.map(|_| VisualBuffer::new(settings.die_count, inputs.scheme));
    SyncLoop::mount(
        physics,
        render,
        settings,
        viewport.unwrap_or(Viewport::new(0.0, 0.0)),
        inputs,
        rng,
    )
}

/// Startup system: mount the dice tray.
#[allow(clippy::too_many_arguments)]
pub fn mount_tray(
    mut commands: Commands,
    config: Res<TrayConfig>,
    controls: Res<TrayControls>,
    windows: Query<&Window, With<PrimaryWindow>>,
    render_device: Option<Res<RenderDevice>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let settings = config.settings.clone().validated();
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let window = windows.single().ok();
    let (Some(window), Some(_)) = (window, render_device) else {
        let tray = build_tray(&settings, None, controls.0, rng);
        commands.insert_resource(ActiveTray(tray));
        return;
    };

    let viewport = Viewport::new(window.width(), window.height());
    let palette = controls.0.scheme.palette();
    commands.insert_resource(ClearColor(palette.background));

    commands.spawn((
        Camera3d::default(),
        Projection::Orthographic(OrthographicProjection {
            scale: projection_scale(settings.view_size, viewport.height),
            ..OrthographicProjection::default_3d()
        }),
        // Looking straight down; screen up is world -Z.
        Transform::from_xyz(0.0, CAMERA_HEIGHT, 0.0).looking_at(Vec3::ZERO, Vec3::NEG_Z),
        TrayCamera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 20.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let die_material = materials.add(StandardMaterial {
        base_color: palette.die,
        alpha_mode: AlphaMode::Blend,
        perceptual_roughness: 0.55,
        ..default()
    });
    let symbol_material = materials.add(StandardMaterial {
        base_color: palette.symbol,
        alpha_mode: AlphaMode::Blend,
        perceptual_roughness: 0.8,
        ..default()
    });
    let die_mesh = meshes.add(Cuboid::from_length(settings.die_size));
    let bar_mesh = meshes.add(symbol_bar_mesh(settings.die_size));

    let faces = DieFaces::fate();
    for index in 0..settings.die_count {
        commands
            .spawn((
                Mesh3d(die_mesh.clone()),
                MeshMaterial3d(die_material.clone()),
                Transform::default(),
                Visibility::Hidden,
                TrayDie(DieId(index)),
            ))
            .with_children(|parent| {
                for face in faces.iter() {
                    for bar in symbol_bar_transforms(face, settings.die_size) {
                        parent.spawn((
                            Mesh3d(bar_mesh.clone()),
                            MeshMaterial3d(symbol_material.clone()),
                            bar,
                        ));
                    }
                }
            });
    }

    commands.insert_resource(TrayHandles {
        die_material,
        symbol_material,
        meshes: vec![die_mesh, bar_mesh],
    });

    let tray = build_tray(&settings, Some(viewport), controls.0, rng);
    info!(
        "Dice tray mounted for a {}x{} viewport",
        viewport.width, viewport.height
    );
    commands.insert_resource(ActiveTray(tray));
}
