//! Roll session state machine
//!
//! One session covers a single spawn -> simulate -> settle -> fade cycle. The
//! session only tracks state; the sync loop decides when to call each
//! transition.

use crate::tray::systems::settle::{SettleDetector, SettleThresholds};

/// Lifecycle phase of the current roll.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Idle,
    Spawning,
    Simulating,
    Settled,
    FadingOut,
    Hidden,
}

impl Phase {
    /// Phases in which the physics world is stepped and frames are scheduled.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Phase::Spawning | Phase::Simulating | Phase::Settled | Phase::FadingOut
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Spawning => "spawning",
            Phase::Simulating => "simulating",
            Phase::Settled => "settled",
            Phase::FadingOut => "fading-out",
            Phase::Hidden => "hidden",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RollSession {
    token: Option<u64>,
    phase: Phase,
    settle: SettleDetector,
    result_emitted: bool,
    timed_out: bool,
    dismiss_requested: bool,
    settled_at: Option<f64>,
    fade_started_at: Option<f64>,
    simulated_seconds: f32,
}

impl RollSession {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Roll token of the session, `None` before the first roll.
    pub fn token(&self) -> Option<u64> {
        self.token
    }

    pub fn settle_streak(&self) -> u32 {
        self.settle.streak()
    }

    pub fn result_emitted(&self) -> bool {
        self.result_emitted
    }

    /// Whether the roll was settled by the timeout guard while still moving.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn dismiss_requested(&self) -> bool {
        self.dismiss_requested
    }

    pub fn fade_started_at(&self) -> Option<f64> {
        self.fade_started_at
    }

    pub fn simulated_seconds(&self) -> f32 {
        self.simulated_seconds
    }

    /// Start a new roll. Allowed from any phase; an in-flight roll is dropped
    /// together with its fade progress and any result it had not reported.
    pub fn begin(&mut self, token: u64) {
        *self = Self {
            token: Some(token),
            phase: Phase::Spawning,
            ..Self::default()
        };
    }

    /// Spawning -> Simulating.
    pub fn start_simulating(&mut self) {
        if self.phase == Phase::Spawning {
            self.phase = Phase::Simulating;
        }
    }

    /// Record a dismiss request. It only takes effect once the roll settles.
    pub fn request_dismiss(&mut self) -> bool {
        match self.phase {
            Phase::Spawning | Phase::Simulating | Phase::Settled => {
                self.dismiss_requested = true;
                true
            }
            Phase::Idle | Phase::FadingOut | Phase::Hidden => false,
        }
    }

    /// Account simulated time for the timeout guard.
    pub fn advance(&mut self, seconds: f32) {
        if self.phase == Phase::Simulating {
            self.simulated_seconds += seconds;
        }
    }

    /// Feed one frame of die velocities while simulating.
    ///
    /// Returns `true` on the frame the session enters `Settled`, either because
    /// the dice came to rest or because the roll ran past `max_roll_seconds`.
    pub fn observe_motion<I>(
        &mut self,
        thresholds: &SettleThresholds,
        motions: I,
        max_roll_seconds: f32,
        now: f64,
    ) -> bool
    where
        I: IntoIterator<Item = (bevy::math::Vec3, bevy::math::Vec3)>,
    {
        if self.phase != Phase::Simulating {
            return false;
        }

        let mut settled = self.settle.observe(thresholds, motions);
        if !settled && self.simulated_seconds >= max_roll_seconds {
            settled = self.settle.force_settle();
            self.timed_out = settled;
        }

        if settled {
            self.phase = Phase::Settled;
            self.settled_at = Some(now);
        }
        settled
    }

    /// Claim the right to emit this roll's result. Succeeds once per session.
    pub fn claim_result(&mut self) -> bool {
        if self.phase != Phase::Settled || self.result_emitted {
            return false;
        }
        self.result_emitted = true;
        true
    }

    /// Whether a settled session should start fading at `now`.
    pub fn should_fade(&self, now: f64, auto_fade_after: Option<f64>) -> bool {
        if self.phase != Phase::Settled {
            return false;
        }
        if self.dismiss_requested {
            return true;
        }
        match (auto_fade_after, self.settled_at) {
            (Some(delay), Some(settled_at)) => now - settled_at >= delay,
            _ => false,
        }
    }

    /// Settled -> FadingOut, stamping the fade start time.
    pub fn begin_fade(&mut self, now: f64) {
        if self.phase == Phase::Settled {
            self.phase = Phase::FadingOut;
            self.fade_started_at = Some(now);
        }
    }

    /// Linear opacity ramp from 1 to 0 over `duration` seconds.
    pub fn fade_opacity(&self, now: f64, duration: f64) -> f32 {
        let Some(started) = self.fade_started_at else {
            return 1.0;
        };
        let elapsed = (now - started).max(0.0);
        (1.0 - elapsed / duration).clamp(0.0, 1.0) as f32
    }

    /// FadingOut -> Hidden.
    pub fn finish(&mut self) {
        if self.phase == Phase::FadingOut {
            self.phase = Phase::Hidden;
        }
    }

    /// Back to Idle, forgetting everything about the last roll.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;

    fn still() -> [(Vec3, Vec3); 1] {
        [(Vec3::ZERO, Vec3::ZERO)]
    }

    fn quick() -> SettleThresholds {
        SettleThresholds {
            frames: 3,
            ..Default::default()
        }
    }

    fn settled_session() -> RollSession {
        let mut session = RollSession::default();
        session.begin(1);
        session.start_simulating();
        for _ in 0..3 {
            session.observe_motion(&quick(), still(), 10.0, 1.0);
        }
        assert_eq!(session.phase(), Phase::Settled);
        session
    }

    #[test]
    fn test_begin_resets_everything() {
        let mut session = settled_session();
        assert!(session.claim_result());
        session.request_dismiss();
        session.begin_fade(2.0);

        session.begin(2);
        assert_eq!(session.phase(), Phase::Spawning);
        assert_eq!(session.token(), Some(2));
        assert_eq!(session.settle_streak(), 0);
        assert!(!session.result_emitted());
        assert!(!session.dismiss_requested());
        assert!(session.fade_started_at().is_none());
    }

    #[test]
    fn test_result_claimed_once() {
        let mut session = settled_session();
        assert!(session.claim_result());
        assert!(!session.claim_result());
    }

    #[test]
    fn test_result_not_claimable_before_settle() {
        let mut session = RollSession::default();
        session.begin(1);
        session.start_simulating();
        assert!(!session.claim_result());
    }

    #[test]
    fn test_dismiss_waits_for_settle() {
        let mut session = RollSession::default();
        session.begin(1);
        session.start_simulating();
        assert!(session.request_dismiss());
        assert!(!session.should_fade(5.0, None));

        for _ in 0..3 {
            session.observe_motion(&quick(), still(), 10.0, 6.0);
        }
        assert!(session.should_fade(6.0, None));
    }

    #[test]
    fn test_dismiss_ignored_when_idle() {
        let mut session = RollSession::default();
        assert!(!session.request_dismiss());
        assert!(!session.dismiss_requested());
    }

    #[test]
    fn test_auto_fade_delay() {
        let session = settled_session();
        assert!(!session.should_fade(1.5, Some(2.0)));
        assert!(session.should_fade(3.0, Some(2.0)));
        assert!(!session.should_fade(100.0, None));
    }

    #[test]
    fn test_fade_ramp_and_finish() {
        let mut session = settled_session();
        session.begin_fade(10.0);
        assert_eq!(session.phase(), Phase::FadingOut);
        assert_eq!(session.fade_opacity(10.0, 0.7), 1.0);
        assert!((session.fade_opacity(10.35, 0.7) - 0.5).abs() < 1e-4);
        assert_eq!(session.fade_opacity(10.8, 0.7), 0.0);
        assert_eq!(session.fade_opacity(20.0, 0.7), 0.0);

        session.finish();
        assert_eq!(session.phase(), Phase::Hidden);
        assert!(!session.phase().is_active());
    }

    #[test]
    fn test_timeout_forces_settle() {
        let mut session = RollSession::default();
        session.begin(1);
        session.start_simulating();
        session.advance(11.0);
        let moving = [(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO)];
        assert!(session.observe_motion(&quick(), moving, 10.0, 11.0));
        assert_eq!(session.phase(), Phase::Settled);
        assert!(session.timed_out());
    }

    #[test]
    fn test_resting_roll_is_not_timed_out() {
        let session = settled_session();
        assert!(!session.timed_out());
    }

    #[test]
    fn test_settled_never_reverts() {
        let mut session = settled_session();
        let moving = [(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO)];
        assert!(!session.observe_motion(&quick(), moving, 10.0, 2.0));
        assert_eq!(session.phase(), Phase::Settled);
    }
}
