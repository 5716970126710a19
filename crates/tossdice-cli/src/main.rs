//! Toss the dice, headless
//!
//! Throws fate dice through the same physics tray the windowed app uses, on a
//! virtual 60 Hz clock, and prints the settled faces.

use bevy::log::tracing_subscriber;
use clap::Parser;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;

use tossdice::tray::{build_tray, FrameScheduler, RunEnd, Tray, TrayInputs, TraySettings, Viewport};

/// Headless fate dice roller
#[derive(Parser)]
#[command(name = "tossroll")]
#[command(author, version, about = "Roll fate dice through a physics simulation")]
struct Cli {
    /// Number of dice to throw
    #[arg(short, long)]
    dice: Option<usize>,

    /// How many rolls to make
    #[arg(short, long, default_value = "1")]
    rolls: u32,

    /// Path to a tray settings JSON file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Seed for reproducible rolls
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation speed multiplier
    #[arg(long)]
    speed: Option<f32>,

    /// Simulated viewport width in pixels
    #[arg(long, default_value = "1280")]
    width: f32,

    /// Simulated viewport height in pixels
    #[arg(long, default_value = "720")]
    height: f32,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log the simulation to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct RollRecord {
    roll: u32,
    total: i32,
    faces: Vec<i32>,
    frames: u64,
    settle_seconds: f32,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("tossdice=debug"))
            .with_writer(std::io::stderr)
            .try_init();
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    match roll_all(&cli, settings) {
        Ok(records) => {
            if cli.json {
                match serde_json::to_string_pretty(&records) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("{} Failed to encode results: {}", "Error:".red().bold(), e);
                        std::process::exit(1);
                    }
                }
            } else {
                for record in &records {
                    print_record(record);
                }
                println!("{}", "═══════════════════════════════════════".cyan());
            }
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn load_settings(cli: &Cli) -> Result<TraySettings, String> {
    let mut settings = match &cli.settings {
        Some(path) => TraySettings::load(path)?,
        None => TraySettings::default(),
    };
    if let Some(dice) = cli.dice {
        settings.die_count = dice;
    }
    if let Some(speed) = cli.speed {
        settings.physics.simulation_speed = speed;
    }
    Ok(settings.validated())
}

fn roll_all(cli: &Cli, settings: TraySettings) -> Result<Vec<RollRecord>, String> {
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut inputs = TrayInputs::default();
    let viewport = Viewport::new(cli.width, cli.height);

    let tray = build_tray(&settings, Some(viewport), inputs, rng);
    let Tray::Active(mut tray) = tray else {
        return Err("Dice tray could not be mounted".to_string());
    };

    let mut scheduler = FrameScheduler::display_rate();
    let mut records = Vec::with_capacity(cli.rolls as usize);

    for roll in 1..=cli.rolls {
        inputs = inputs.next_roll();
        tray.submit(inputs);

        let mut total = None;
        let summary = scheduler.run_until(&mut *tray, |report| {
            total = report.result();
            total.is_some()
        });
        let Some(total) = total else {
            tray.unmount();
            return Err(format!(
                "Roll {} produced no result ({:?} after {} frames, {:.2}s)",
                roll,
                summary.end,
                summary.frames,
                scheduler.now()
            ));
        };

        let faces = tray
            .last_readout()
            .map(|readout| readout.values())
            .unwrap_or_default();
        records.push(RollRecord {
            roll,
            total,
            faces,
            frames: summary.frames,
            settle_seconds: tray.session().simulated_seconds(),
        });

        inputs = inputs.next_dismiss();
        tray.submit(inputs);
        let fade = scheduler.run(&mut *tray);
        if fade.end != RunEnd::Idle {
            tray.unmount();
            return Err(format!("Roll {} did not fade out ({:?})", roll, fade.end));
        }
    }

    tray.unmount();
    Ok(records)
}

fn print_record(record: &RollRecord) {
    println!("\n{}", "═══════════════════════════════════════".cyan());
    println!(
        "{} {}",
        "Roll:".bold().white(),
        format!("#{}", record.roll).yellow().bold()
    );

    let faces: Vec<String> = record
        .faces
        .iter()
        .map(|value| match value {
            1 => "[+]".bright_green().bold().to_string(),
            -1 => "[-]".bright_red().bold().to_string(),
            _ => "[ ]".dimmed().to_string(),
        })
        .collect();
    println!("{} {}", "Dice:".bold().white(), faces.join(" "));

    let total = format!("{:+}", record.total);
    let total = match record.total {
        t if t > 0 => total.green().bold(),
        t if t < 0 => total.red().bold(),
        _ => total.white().bold(),
    };
    println!("{} {}", "Total:".bold().white(), total);
    println!(
        "{} {:.2}s ({} frames)",
        "Settled:".bold().white(),
        record.settle_seconds,
        record.frames
    );
}
