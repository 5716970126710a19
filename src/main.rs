use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use tossdice::tray::{
    ColorScheme, DiceTrayPlugin, RollFinished, RollingChanged, TrayControls,
    TrayInputs, TraySettings,
};

/// Animated fate dice tray
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of dice to throw
    #[arg(short, long)]
    dice: Option<usize>,

    /// Path to a tray settings JSON file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Start with the dark color scheme
    #[arg(long)]
    dark: bool,

    /// Seed for reproducible launches
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation speed multiplier
    #[arg(long)]
    speed: Option<f32>,

    /// Fade the dice automatically this many milliseconds after they settle
    #[arg(long)]
    auto_fade: Option<u64>,
}

/// On-screen label showing the latest total.
#[derive(Component)]
struct ResultsText;

fn main() {
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => match TraySettings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{} {}", "Warning:".yellow().bold(), e);
                TraySettings::default()
            }
        },
        None => TraySettings::default(),
    };
    if let Some(dice) = args.dice {
        settings.die_count = dice;
    }
    if let Some(speed) = args.speed {
        settings.physics.simulation_speed = speed;
    }
    if args.auto_fade.is_some() {
        settings.auto_fade_after_ms = args.auto_fade;
    }
    let settings = settings.validated();

    let scheme = if args.dark {
        ColorScheme::Dark
    } else {
        ColorScheme::Light
    };

    println!(
        "{} {} fate dice",
        "Tray:".bold().white(),
        settings.die_count.to_string().yellow().bold()
    );
    println!(
        "{} Space to roll, Enter/Esc to dismiss, T to switch colors",
        "Keys:".bold().white()
    );

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Toss the Dice".to_string(),
                        resolution: (1280u32, 720u32).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "wgpu=error,naga=warn,tossdice=debug".to_string(),
                    ..default()
                }),
        )
        .add_plugins(DiceTrayPlugin {
            settings,
            seed: args.seed,
            initial: TrayInputs {
                scheme,
                ..default()
            },
        })
        .add_systems(Startup, setup_results_text)
        .add_systems(Update, (handle_keys, update_results_text))
        .run();
}

fn setup_results_text(mut commands: Commands) {
    commands.spawn((
        Text::new("Press Space to roll"),
        TextFont {
            font_size: 28.0,
            ..default()
        },
        TextColor(Color::srgb(0.45, 0.45, 0.5)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(16.0),
            left: Val::Px(16.0),
            ..default()
        },
        ResultsText,
    ));
}

/// Keyboard driver for the tray's controls.
fn handle_keys(keys: Res<ButtonInput<KeyCode>>, mut controls: ResMut<TrayControls>) {
    if keys.just_pressed(KeyCode::Space) {
        controls.0 = controls.0.next_roll();
    }
    if keys.just_pressed(KeyCode::Enter) || keys.just_pressed(KeyCode::Escape) {
        controls.0 = controls.0.next_dismiss();
    }
    if keys.just_pressed(KeyCode::KeyT) {
        controls.0.scheme = controls.0.scheme.toggled();
    }
}

fn update_results_text(
    mut rolling: MessageReader<RollingChanged>,
    mut finished: MessageReader<RollFinished>,
    mut labels: Query<&mut Text, With<ResultsText>>,
) {
    let mut label = None;
    for RollingChanged(active) in rolling.read() {
        label = Some(if *active {
            "Rolling...".to_string()
        } else {
            "Press Space to roll".to_string()
        });
    }
    for roll in finished.read() {
        let glyphs: Vec<String> = roll
            .faces
            .iter()
            .map(|symbol| symbol.glyph().to_string())
            .collect();
        label = Some(format!("[{}]  Total: {:+}", glyphs.join(" "), roll.total));
    }

    let Some(label) = label else {
        return;
    };
    for mut text in labels.iter_mut() {
        text.0 = label.clone();
    }
}
