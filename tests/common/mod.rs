//! Shared helpers for the tray integration tests

#![allow(dead_code)]

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;
use std::rc::Rc;

use tossdice::tray::{
    BodyState, ContainmentBounds, DieId, PhysicsWorld, SyncLoop, Tray, TrayEvent, TrayInputs,
    TraySettings, Viewport, VisualBuffer,
};

pub const FRAME: f64 = 1.0 / 60.0;

/// Scripted physics: every die keeps its launch velocity for a fixed number
/// of non-zero steps, then stops dead in its scripted rest orientation.
/// Positions never change, so the soft clamp never fires.
pub struct MockWorld {
    pub bodies: Vec<BodyState>,
    pub rest_rotations: Vec<Quat>,
    pub moving_steps: u32,
    remaining: Vec<u32>,
    pub launches: Vec<Vec<BodyState>>,
    pub sleeping: Vec<bool>,
    pub walls: usize,
    pub bounds_history: Vec<ContainmentBounds>,
    pub steps: u32,
    /// Every delta handed to `step`, zero ones included.
    pub deltas: Vec<f32>,
    pub released: Rc<Cell<bool>>,
}

impl MockWorld {
    pub fn new(rest_rotations: Vec<Quat>, moving_steps: u32) -> Self {
        let count = rest_rotations.len();
        Self {
            bodies: vec![BodyState::default(); count],
            rest_rotations,
            moving_steps,
            remaining: vec![0; count],
            launches: Vec::new(),
            sleeping: vec![true; count],
            walls: 0,
            bounds_history: Vec::new(),
            steps: 0,
            deltas: Vec::new(),
            released: Rc::new(Cell::new(false)),
        }
    }

    /// Four dice that all come to rest with the plus face up.
    pub fn all_plus(moving_steps: u32) -> Self {
        Self::new(vec![Quat::IDENTITY; 4], moving_steps)
    }
}

impl PhysicsWorld for MockWorld {
    fn die_count(&self) -> usize {
        self.bodies.len()
    }

    fn set_bounds(&mut self, bounds: &ContainmentBounds) {
        // Old walls go first, four new ones replace them.
        self.walls = 4;
        self.bounds_history.push(*bounds);
    }

    fn wall_count(&self) -> usize {
        self.walls
    }

    fn step(&mut self, wall_clock_delta: f32) {
        self.deltas.push(wall_clock_delta);
        if wall_clock_delta <= 0.0 {
            return;
        }
        self.steps += 1;
        for (index, body) in self.bodies.iter_mut().enumerate() {
            if self.sleeping[index] {
                continue;
            }
            if self.remaining[index] > 0 {
                self.remaining[index] -= 1;
            } else {
                body.linvel = Vec3::ZERO;
                body.angvel = Vec3::ZERO;
                body.rotation = self.rest_rotations[index];
            }
        }
    }

    fn body(&self, die: DieId) -> Option<BodyState> {
        self.bodies.get(die.0).copied()
    }

    fn place(&mut self, die: DieId, state: BodyState) {
        if die.0 == 0 {
            self.launches.push(Vec::new());
        }
        if let Some(launch) = self.launches.last_mut() {
            launch.push(state);
        }
        self.bodies[die.0] = state;
        self.remaining[die.0] = self.moving_steps;
        self.sleeping[die.0] = false;
    }

    fn sleep(&mut self, die: DieId) {
        self.sleeping[die.0] = true;
    }

    fn release(&mut self) {
        self.bodies.clear();
        self.walls = 0;
        self.released.set(true);
    }
}

pub type MockTray = SyncLoop<MockWorld, VisualBuffer>;

pub fn viewport() -> Viewport {
    Viewport::new(1280.0, 720.0)
}

/// Mount an active tray over `world` with a fixed seed.
pub fn mount(world: MockWorld, settings: TraySettings) -> MockTray {
    let render = VisualBuffer::new(world.die_count(), Default::default());
    match SyncLoop::mount(
        world,
        Some(render),
        settings,
        viewport(),
        TrayInputs::default(),
        StdRng::seed_from_u64(42),
    ) {
        Tray::Active(tray) => *tray,
        Tray::Inert => panic!("tray should mount with a render proxy"),
    }
}

/// Drives a tray the way a host does: one frame per tick, only while the
/// tray asks for frames.
pub struct Host {
    pub now: f64,
    pub frames: u32,
    pub events: Vec<(f64, TrayEvent)>,
}

impl Host {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            frames: 0,
            events: Vec::new(),
        }
    }

    /// Run up to `limit` frames; returns how many ran.
    pub fn run<P: PhysicsWorld>(&mut self, tray: &mut SyncLoop<P, VisualBuffer>, limit: u32) -> u32 {
        let mut ran = 0;
        while ran < limit && tray.needs_frame() {
            let report = tray.frame(self.now);
            for event in report.events {
                self.events.push((self.now, event));
            }
            self.now += FRAME;
            self.frames += 1;
            ran += 1;
        }
        ran
    }

    /// Run until the tray stops asking for frames.
    pub fn run_until_idle<P: PhysicsWorld>(&mut self, tray: &mut SyncLoop<P, VisualBuffer>) {
        self.run(tray, 60 * 60);
    }

    pub fn results(&self) -> Vec<i32> {
        self.events
            .iter()
            .filter_map(|(_, event)| match event {
                TrayEvent::Result(total) => Some(*total),
                _ => None,
            })
            .collect()
    }

    pub fn time_of(&self, wanted: TrayEvent) -> Option<f64> {
        self.events
            .iter()
            .find(|(_, event)| *event == wanted)
            .map(|(at, _)| *at)
    }

    pub fn result_time(&self) -> Option<f64> {
        self.events
            .iter()
            .find(|(_, event)| matches!(event, TrayEvent::Result(_)))
            .map(|(at, _)| *at)
    }
}
