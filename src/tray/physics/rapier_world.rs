//! Rapier-backed physics world
//!
//! Owns the floor, the four walls and one dynamic cuboid per die. Walls are
//! rebuilt whenever the containment bounds change.
//!
//! Contact materials rely on rapier's combine-rule precedence
//! (Average < Min < Multiply < Max): dice use `Average` so die-die pairs keep
//! the dice coefficients, while the floor and walls use `Max` for friction and
//! `Min` for restitution so a die-floor pair resolves to the floor values.

use std::num::NonZeroUsize;

use bevy::log::debug;
use bevy::math::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

use super::step_clock::StepClock;
use crate::tray::ports::{BodyState, PhysicsWorld};
use crate::tray::types::{ContainmentBounds, DieId, PhysicsSettings};

/// Half extent of the floor slab on X and Z; far larger than any tray.
const FLOOR_HALF_EXTENT: f32 = 500.0;

/// Height at which idle dice are parked, well below the floor.
const PARKING_Y: f32 = -100.0;

pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    clock: StepClock,
    settings: PhysicsSettings,
    die_size: f32,
    dice: Vec<RigidBodyHandle>,
    floor: Option<ColliderHandle>,
    walls: Vec<ColliderHandle>,
}

impl RapierWorld {
    /// Build a world with a floor and `die_count` parked, sleeping dice.
    /// Walls are added by the first `set_bounds`.
    pub fn new(settings: &PhysicsSettings, die_count: usize, die_size: f32) -> Self {
        let clock = StepClock::from_settings(settings);
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = clock.fixed_step();
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(settings.solver_iterations as usize).unwrap_or(NonZeroUsize::MIN);

        let mut world = Self {
            gravity: vector![0.0, -settings.gravity, 0.0],
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            clock,
            settings: settings.clone(),
            die_size,
            dice: Vec::with_capacity(die_count),
            floor: None,
            walls: Vec::with_capacity(4),
        };

        world.insert_floor();
        for index in 0..die_count {
            world.insert_die(index);
        }
        world
    }

    fn boundary_collider(&self, builder: ColliderBuilder) -> Collider {
        builder
            .friction(self.settings.floor_friction)
            .friction_combine_rule(CoefficientCombineRule::Max)
            .restitution(self.settings.floor_restitution)
            .restitution_combine_rule(CoefficientCombineRule::Min)
            .build()
    }

    fn insert_floor(&mut self) {
        // Top face sits at y = 0.
        let floor = self.boundary_collider(
            ColliderBuilder::cuboid(FLOOR_HALF_EXTENT, self.die_size, FLOOR_HALF_EXTENT)
                .translation(vector![0.0, -self.die_size, 0.0]),
        );
        self.floor = Some(self.colliders.insert(floor));
    }

    fn insert_die(&mut self, index: usize) {
        let half = self.die_size * 0.5;
        let body = RigidBodyBuilder::dynamic()
            .translation(parking_spot(index, self.die_size))
            .ccd_enabled(true)
            .sleeping(true)
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::cuboid(half, half, half)
            .density(self.settings.die_density)
            .friction(self.settings.dice_friction)
            .friction_combine_rule(CoefficientCombineRule::Average)
            .restitution(self.settings.dice_restitution)
            .restitution_combine_rule(CoefficientCombineRule::Average)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.dice.push(handle);
    }

    fn remove_walls(&mut self) {
        for handle in self.walls.drain(..) {
            self.colliders
                .remove(handle, &mut self.islands, &mut self.bodies, true);
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_sleeping(&self, die: DieId) -> bool {
        self.dice
            .get(die.0)
            .and_then(|handle| self.bodies.get(*handle))
            .map(|body| body.is_sleeping())
            .unwrap_or(true)
    }
}

impl PhysicsWorld for RapierWorld {
    fn die_count(&self) -> usize {
        self.dice.len()
    }

    fn set_bounds(&mut self, bounds: &ContainmentBounds) {
        self.remove_walls();
        for wall in bounds.walls(self.die_size) {
            let collider = self.boundary_collider(
                ColliderBuilder::cuboid(
                    wall.half_extents.x,
                    wall.half_extents.y,
                    wall.half_extents.z,
                )
                .translation(to_vector(wall.center)),
            );
            self.walls.push(self.colliders.insert(collider));
        }
        debug!(
            "Rebuilt tray walls for {:.2} x {:.2}",
            bounds.half_width, bounds.half_depth
        );
    }

    fn wall_count(&self) -> usize {
        self.walls.len()
    }

    fn step(&mut self, wall_clock_delta: f32) {
        let steps = self.clock.advance(wall_clock_delta);
        for _ in 0..steps {
            self.pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
        }
    }

    fn body(&self, die: DieId) -> Option<BodyState> {
        let handle = self.dice.get(die.0)?;
        let body = self.bodies.get(*handle)?;
        Some(BodyState {
            position: to_vec3(body.translation()),
            rotation: to_quat(body.rotation()),
            linvel: to_vec3(body.linvel()),
            angvel: to_vec3(body.angvel()),
        })
    }

    fn place(&mut self, die: DieId, state: BodyState) {
        let Some(handle) = self.dice.get(die.0).copied() else {
            return;
        };
        let Some(body) = self.bodies.get_mut(handle) else {
            return;
        };
        body.set_translation(to_vector(state.position), true);
        body.set_rotation(to_rotation(state.rotation), true);
        body.set_linvel(to_vector(state.linvel), true);
        body.set_angvel(to_vector(state.angvel), true);
        body.wake_up(true);
    }

    fn sleep(&mut self, die: DieId) {
        let Some(handle) = self.dice.get(die.0).copied() else {
            return;
        };
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(vector![0.0, 0.0, 0.0], false);
            body.set_angvel(vector![0.0, 0.0, 0.0], false);
            body.sleep();
        }
    }

    fn release(&mut self) {
        self.remove_walls();
        for handle in self.dice.drain(..) {
            self.bodies.remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
        if let Some(floor) = self.floor.take() {
            self.colliders
                .remove(floor, &mut self.islands, &mut self.bodies, false);
        }
        self.clock.reset();
    }
}

fn parking_spot(index: usize, die_size: f32) -> Vector<Real> {
    vector![index as f32 * die_size * 2.0, PARKING_Y, 0.0]
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_quat(rotation: &Rotation<Real>) -> Quat {
    let c = rotation.coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

fn to_rotation(q: Quat) -> Rotation<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}
