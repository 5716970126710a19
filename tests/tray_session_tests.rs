//! Roll lifecycle tests against a scripted physics world

mod common;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f32::consts::FRAC_PI_2;

use common::{mount, viewport, Host, MockWorld, FRAME};
use tossdice::tray::{
    read_roll, ColorScheme, DieFaces, DieId, Phase, PhysicsWorld, SyncLoop, Tray, TrayEvent,
    TrayInputs, TraySettings, Viewport, VisualBuffer,
};

const MOVING_STEPS: u32 = 30;

fn mixed_rest() -> Vec<Quat> {
    vec![
        Quat::IDENTITY,
        Quat::from_rotation_z(FRAC_PI_2),
        Quat::from_rotation_z(-FRAC_PI_2),
        Quat::from_rotation_x(FRAC_PI_2),
    ]
}

#[test]
fn test_fresh_roll_spawns_visible_dice_moving_up() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    tray.submit(TrayInputs::default().next_roll());
    host.run(&mut tray, 1);

    assert_eq!(host.events, vec![(0.0, TrayEvent::RollingChanged(true))]);
    assert_eq!(tray.phase(), Phase::Simulating);
    for index in 0..4 {
        let visual = tray.render().die(DieId(index)).expect("die visual");
        assert!(visual.visible);
    }
    let launch = tray.physics().launches.last().expect("launch");
    assert_eq!(launch.len(), 4);
    assert!(launch.iter().all(|state| state.linvel.y > 0.0));
}

#[test]
fn test_roll_settles_after_still_streak_and_reports_once() {
    let mut tray = mount(MockWorld::new(mixed_rest(), MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    tray.submit(TrayInputs::default().next_roll());
    host.run(&mut tray, 600);

    let expected = read_roll(&DieFaces::fate(), mixed_rest()).total;
    assert_eq!(expected, 1);
    assert_eq!(host.results(), vec![expected]);

    // Dice stop on the frame after their motion runs out; 18 still frames follow.
    let settled_at = host.result_time().expect("result");
    let first_still = (MOVING_STEPS + 1) as f64 * FRAME;
    assert!(settled_at >= first_still + 17.0 * FRAME - 1e-9);
    assert_eq!(tray.phase(), Phase::Settled);

    let readout = tray.last_readout().expect("readout");
    assert_eq!(readout.values(), vec![1, 1, -1, 0]);
}

#[test]
fn test_settled_roll_waits_for_dismiss() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    tray.submit(TrayInputs::default().next_roll());
    host.run(&mut tray, 600);

    assert_eq!(host.results(), vec![4]);
    assert_eq!(tray.phase(), Phase::Settled);
    assert!(tray.needs_frame());
    assert!(tray.render().any_visible());
    assert_eq!(tray.render().opacity(), 1.0);
}

#[test]
fn test_fade_completes_within_duration() {
    let settings = TraySettings::default();
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), settings.clone());
    let mut host = Host::new();

    let inputs = TrayInputs::default().next_roll();
    tray.submit(inputs);
    host.run(&mut tray, 100);
    assert_eq!(tray.phase(), Phase::Settled);

    let dismissed_at = host.now;
    tray.submit(inputs.next_dismiss());
    host.run_until_idle(&mut tray);

    let hidden_at = host
        .time_of(TrayEvent::RollingChanged(false))
        .expect("dice hidden");
    let deadline = dismissed_at + settings.fade_duration_seconds() + FRAME + 1e-9;
    assert!(hidden_at <= deadline, "hidden at {hidden_at}, deadline {deadline}");
    assert!(hidden_at >= dismissed_at + settings.fade_duration_seconds() - 1e-9);

    assert_eq!(tray.phase(), Phase::Hidden);
    assert!(!tray.render().any_visible());
    assert_eq!(tray.render().opacity(), 0.0);
    assert!(!tray.needs_frame());
    assert!(tray.physics().sleeping.iter().all(|asleep| *asleep));
    assert_eq!(host.results().len(), 1);
}

#[test]
fn test_opacity_ramps_down_during_fade() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    let inputs = TrayInputs::default().next_roll();
    tray.submit(inputs);
    host.run(&mut tray, 100);
    tray.submit(inputs.next_dismiss());

    let mut last = 1.0;
    while tray.phase() != Phase::Hidden {
        host.run(&mut tray, 1);
        let opacity = tray.render().opacity();
        assert!(opacity <= last);
        last = opacity;
    }
    assert_eq!(last, 0.0);
}

#[test]
fn test_preemption_discards_first_result() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    let first = TrayInputs::default().next_roll();
    tray.submit(first);
    host.run(&mut tray, 10);
    assert_eq!(tray.phase(), Phase::Simulating);

    let second = first.next_roll();
    tray.submit(second);
    host.run(&mut tray, 600);

    assert_eq!(host.results(), vec![4]);
    assert_eq!(tray.session().token(), Some(second.roll_token));

    let launches = &tray.physics().launches;
    assert_eq!(launches.len(), 2);
    assert_ne!(launches[0], launches[1]);
    let spawned = host
        .events
        .iter()
        .filter(|(_, event)| *event == TrayEvent::RollingChanged(true))
        .count();
    assert_eq!(spawned, 2);

    // The second roll needs its own full motion and still streak.
    let settled_at = host.result_time().expect("result");
    assert!(settled_at >= (10 + MOVING_STEPS + 18) as f64 * FRAME - 1e-9);
}

#[test]
fn test_preemption_during_fade_restarts_roll() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    let inputs = TrayInputs::default().next_roll();
    tray.submit(inputs);
    host.run(&mut tray, 100);
    let dismissed = inputs.next_dismiss();
    tray.submit(dismissed);
    host.run(&mut tray, 5);
    assert_eq!(tray.phase(), Phase::FadingOut);

    tray.submit(dismissed.next_roll());
    host.run(&mut tray, 1);

    assert_eq!(tray.phase(), Phase::Simulating);
    assert_eq!(tray.render().opacity(), 1.0);
    assert!(tray.render().any_visible());
    assert!(tray.session().fade_started_at().is_none());
}

#[test]
fn test_dismiss_before_settle_still_settles() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    let inputs = TrayInputs::default().next_roll();
    tray.submit(inputs);
    host.run(&mut tray, 5);
    tray.submit(inputs.next_dismiss());
    host.run(&mut tray, 5);

    assert_eq!(tray.phase(), Phase::Simulating);
    assert!(tray.session().dismiss_requested());
    assert_eq!(tray.render().opacity(), 1.0);

    host.run_until_idle(&mut tray);

    let settled_at = host.result_time().expect("result");
    let hidden_at = host
        .time_of(TrayEvent::RollingChanged(false))
        .expect("hidden");
    assert!(settled_at >= (MOVING_STEPS + 18) as f64 * FRAME - 1e-9);
    assert!(hidden_at > settled_at);
    assert_eq!(host.results(), vec![4]);
    assert_eq!(tray.phase(), Phase::Hidden);
}

#[test]
fn test_dismiss_while_idle_is_ignored() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    let inputs = TrayInputs::default().next_dismiss();
    tray.submit(inputs);
    assert!(!tray.needs_frame());

    tray.submit(inputs.next_roll());
    host.run(&mut tray, 600);

    // The stale dismiss must not fade the new roll.
    assert_eq!(tray.phase(), Phase::Settled);
    assert_eq!(host.results(), vec![4]);
}

#[test]
fn test_roll_and_dismiss_together_fade_after_settle() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    tray.submit(TrayInputs::default().next_roll().next_dismiss());
    host.run_until_idle(&mut tray);

    assert_eq!(host.results(), vec![4]);
    assert_eq!(tray.phase(), Phase::Hidden);
}

#[test]
fn test_initial_tokens_are_a_baseline() {
    let world = MockWorld::all_plus(MOVING_STEPS);
    let render = VisualBuffer::new(4, ColorScheme::Light);
    let initial = TrayInputs {
        roll_token: 7,
        dismiss_token: 3,
        scheme: ColorScheme::Light,
    };
    let Tray::Active(mut tray) = SyncLoop::mount(
        world,
        Some(render),
        TraySettings::default(),
        viewport(),
        initial,
        StdRng::seed_from_u64(1),
    ) else {
        panic!("tray should mount");
    };

    tray.submit(initial);
    assert!(!tray.needs_frame());
    assert_eq!(tray.phase(), Phase::Idle);
}

#[test]
fn test_auto_fade_without_dismiss() {
    let settings = TraySettings {
        auto_fade_after_ms: Some(250),
        ..TraySettings::default()
    };
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), settings);
    let mut host = Host::new();

    tray.submit(TrayInputs::default().next_roll());
    host.run_until_idle(&mut tray);

    let settled_at = host.result_time().expect("result");
    let hidden_at = host
        .time_of(TrayEvent::RollingChanged(false))
        .expect("hidden");
    assert!(hidden_at >= settled_at + 0.25 + 0.7 - 1e-9);
    assert_eq!(tray.phase(), Phase::Hidden);
}

#[test]
fn test_timeout_forces_a_single_result() {
    let mut settings = TraySettings::default();
    settings.settle.max_roll_seconds = 1.0;
    let mut tray = mount(MockWorld::all_plus(u32::MAX), settings);
    let mut host = Host::new();

    tray.submit(TrayInputs::default().next_roll());
    host.run(&mut tray, 600);

    assert_eq!(host.results().len(), 1);
    assert_eq!(tray.phase(), Phase::Settled);

    // Read from wherever the dice were when time ran out.
    let rotations: Vec<Quat> = (0..4)
        .filter_map(|index| tray.physics().body(DieId(index)))
        .map(|state| state.rotation)
        .collect();
    let expected = read_roll(&DieFaces::fate(), rotations).total;
    assert_eq!(host.results(), vec![expected]);
    assert!(host.result_time().expect("result") < 1.2);
    assert!(tray.session().timed_out());
    assert!(tray
        .physics()
        .bodies
        .iter()
        .all(|body| body.linvel != Vec3::ZERO));
}

#[test]
fn test_timeout_counts_scaled_time() {
    let mut settings = TraySettings::default();
    settings.settle.max_roll_seconds = 1.0;
    settings.physics.simulation_speed = 2.0;
    let mut tray = mount(MockWorld::all_plus(u32::MAX), settings);
    let mut host = Host::new();

    tray.submit(TrayInputs::default().next_roll());
    host.run(&mut tray, 600);

    assert_eq!(host.results().len(), 1);
    assert!(tray.session().timed_out());
    assert!(tray.session().simulated_seconds() >= 1.0);
    // Twice the speed runs out the one second budget in half the frame time.
    let at = host.result_time().expect("result");
    assert!(at > 0.4 && at < 0.6, "result at {at}");
}

#[test]
fn test_first_frame_after_start_steps_zero_time() {
    let mut tray = mount(MockWorld::all_plus(5), TraySettings::default());
    let mut host = Host::new();
    host.now = 3.0;

    let inputs = TrayInputs::default().next_roll();
    tray.submit(inputs);
    host.run(&mut tray, 3);
    assert_eq!(tray.physics().deltas[0], 0.0);
    assert!((tray.physics().deltas[1] - FRAME as f32).abs() < 1e-6);

    let inputs = inputs.next_dismiss();
    tray.submit(inputs);
    host.run_until_idle(&mut tray);
    assert_eq!(tray.phase(), Phase::Hidden);
    assert!(!tray.session().timed_out());

    // A long pause while hidden must not reach the next roll as one big step.
    host.now += 5.0;
    let restart = tray.physics().deltas.len();
    tray.submit(inputs.next_roll());
    host.run(&mut tray, 2);
    assert_eq!(tray.physics().deltas[restart], 0.0);
    assert!((tray.physics().deltas[restart + 1] - FRAME as f32).abs() < 1e-6);
}

#[test]
fn test_result_stays_in_range_across_rolls() {
    let mut world = MockWorld::new(mixed_rest(), 5);
    world.rest_rotations = vec![Quat::from_rotation_z(-FRAC_PI_2); 4];
    let mut tray = mount(world, TraySettings::default());
    let mut host = Host::new();

    let mut inputs = TrayInputs::default();
    for _ in 0..3 {
        inputs = inputs.next_roll();
        tray.submit(inputs);
        host.run(&mut tray, 100);
        inputs = inputs.next_dismiss();
        tray.submit(inputs);
        host.run_until_idle(&mut tray);
    }

    assert_eq!(host.results(), vec![-4, -4, -4]);
    assert!(host.results().iter().all(|total| (-4..=4).contains(total)));
}

#[test]
fn test_scheme_change_is_cosmetic() {
    let mut light = mount(MockWorld::new(mixed_rest(), MOVING_STEPS), TraySettings::default());
    let mut dark = mount(MockWorld::new(mixed_rest(), MOVING_STEPS), TraySettings::default());
    let mut light_host = Host::new();
    let mut dark_host = Host::new();

    light.submit(TrayInputs::default().next_roll());
    light_host.run(&mut light, 600);

    let inputs = TrayInputs::default().next_roll();
    dark.submit(inputs);
    dark_host.run(&mut dark, 10);
    dark.submit(TrayInputs {
        scheme: ColorScheme::Dark,
        ..inputs
    });
    dark_host.run(&mut dark, 600);

    assert_eq!(dark.render().scheme(), ColorScheme::Dark);
    assert_eq!(light_host.results(), dark_host.results());
    assert_eq!(light.physics().launches, dark.physics().launches);
}

#[test]
fn test_scheme_applies_while_stopped() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    tray.submit(TrayInputs {
        scheme: ColorScheme::Dark,
        ..TrayInputs::default()
    });
    assert_eq!(tray.render().scheme(), ColorScheme::Dark);
    assert!(!tray.needs_frame());
}

#[test]
fn test_resize_is_idempotent() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();
    let before = tray.bounds();

    tray.post_resize(viewport());
    host.run(&mut tray, 1);
    tray.post_resize(viewport());
    host.run(&mut tray, 1);

    assert_eq!(tray.physics().wall_count(), 4);
    assert_eq!(tray.bounds(), before);
    assert_eq!(tray.physics().bounds_history.len(), 3);
    assert!(tray.physics().bounds_history.iter().all(|b| *b == before));
}

#[test]
fn test_resize_while_stopped_runs_one_frame() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    tray.post_resize(Viewport::new(500.0, 500.0));
    assert!(tray.needs_frame());
    assert_eq!(host.run(&mut tray, 10), 1);

    let bounds = tray.bounds();
    assert!((bounds.half_width - 5.0).abs() < 1e-5);
    assert!((bounds.half_depth - 5.0).abs() < 1e-5);
    assert_eq!(tray.phase(), Phase::Idle);
}

#[test]
fn test_latest_resize_wins() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();

    tray.post_resize(Viewport::new(400.0, 800.0));
    tray.post_resize(Viewport::new(1000.0, 500.0));
    host.run(&mut tray, 1);

    let bounds = tray.bounds();
    assert!((bounds.half_width - 10.0).abs() < 1e-5);
    assert_eq!(tray.physics().bounds_history.len(), 2);
}

#[test]
fn test_degenerate_resize_is_ignored() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();
    let before = tray.bounds();

    tray.post_resize(Viewport::new(0.0, 500.0));
    host.run(&mut tray, 1);
    tray.post_resize(Viewport::new(800.0, -1.0));
    host.run(&mut tray, 1);

    assert_eq!(tray.bounds(), before);
    assert_eq!(tray.physics().bounds_history.len(), 1);
    assert_eq!(tray.physics().wall_count(), 4);
}

#[test]
fn test_inert_without_render_surface() {
    let world = MockWorld::all_plus(MOVING_STEPS);
    let released = world.released.clone();

    let tray = SyncLoop::mount(
        world,
        None::<VisualBuffer>,
        TraySettings::default(),
        viewport(),
        TrayInputs::default(),
        StdRng::seed_from_u64(1),
    );

    assert!(!tray.is_active());
    assert!(tray.active().is_none());
    assert!(released.get());
}

#[test]
fn test_inert_without_dice() {
    let world = MockWorld::new(Vec::new(), MOVING_STEPS);
    let released = world.released.clone();

    let mut tray = SyncLoop::mount(
        world,
        Some(VisualBuffer::new(0, Default::default())),
        TraySettings::default(),
        viewport(),
        TrayInputs::default(),
        StdRng::seed_from_u64(1),
    );

    assert!(!tray.is_active());
    assert!(tray.active_mut().is_none());
    assert!(released.get());
}

#[test]
fn test_unmount_releases_and_stops_frames() {
    let mut tray = mount(MockWorld::all_plus(MOVING_STEPS), TraySettings::default());
    let mut host = Host::new();
    let released = tray.physics().released.clone();
    let cancel = tray.cancel_token();

    let inputs = TrayInputs::default().next_roll();
    tray.submit(inputs);
    host.run(&mut tray, 10);
    assert!(tray.needs_frame());

    tray.unmount();

    assert!(cancel.is_cancelled());
    assert!(released.get());
    assert!(tray.render().is_released());
    assert_eq!(tray.phase(), Phase::Idle);
    assert!(!tray.needs_frame());

    // Nothing revives an unmounted tray.
    tray.submit(inputs.next_roll());
    tray.post_resize(Viewport::new(300.0, 300.0));
    assert!(!tray.needs_frame());
    assert!(tray.frame(host.now).events.is_empty());
    assert!(host.results().is_empty());

    tray.unmount();
}
