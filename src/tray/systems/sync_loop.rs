//! Render/physics sync loop
//!
//! `SyncLoop` is the single frame driver of the tray. Every frame runs, in
//! order: pending resize, input changes, physics step, soft containment,
//! visual sync, settle evaluation, fade evaluation. Reading transforms out of
//! order would show stale positions or read a result from the previous step.

use bevy::log::{debug, info, warn};
use rand::rngs::StdRng;

use super::face_value::{read_roll, RollReadout};
use super::scheduler::CancelToken;
use super::settle::SettleThresholds;
use super::spawn::launch_state;
use crate::tray::ports::{BodyState, PhysicsWorld, RenderProxy};
use crate::tray::types::{
    ContainmentBounds, DieFaces, DieId, Phase, RollSession, TrayEvent, TrayInputs, TraySettings,
    Viewport,
};

/// Outcome of one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub events: Vec<TrayEvent>,
    /// Whether the host must schedule another frame.
    pub scheduled: bool,
}

impl FrameReport {
    pub fn result(&self) -> Option<i32> {
        self.events.iter().find_map(|event| match event {
            TrayEvent::Result(total) => Some(*total),
            _ => None,
        })
    }
}

/// A mounted tray, or nothing when no rendering surface was available.
pub enum Tray<P: PhysicsWorld, R: RenderProxy> {
    Active(Box<SyncLoop<P, R>>),
    Inert,
}

impl<P: PhysicsWorld, R: RenderProxy> Tray<P, R> {
    pub fn is_active(&self) -> bool {
        matches!(self, Tray::Active(_))
    }

    pub fn active(&self) -> Option<&SyncLoop<P, R>> {
        match self {
            Tray::Active(sync) => Some(sync.as_ref()),
            Tray::Inert => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut SyncLoop<P, R>> {
        match self {
            Tray::Active(sync) => Some(sync.as_mut()),
            Tray::Inert => None,
        }
    }
}

pub struct SyncLoop<P: PhysicsWorld, R: RenderProxy> {
    physics: P,
    render: R,
    settings: TraySettings,
    thresholds: SettleThresholds,
    faces: DieFaces,
    bounds: ContainmentBounds,
    pending_resize: Option<Viewport>,
    pending_inputs: Option<TrayInputs>,
    inputs: TrayInputs,
    session: RollSession,
    last_frame_at: Option<f64>,
    last_readout: Option<RollReadout>,
    scheduled: bool,
    rng: StdRng,
    cancel: CancelToken,
}

impl<P: PhysicsWorld, R: RenderProxy> SyncLoop<P, R> {
    /// Mount the tray.
    ///
    /// `render` is `None` when no usable graphics context exists; the tray then
    /// stays inert and never schedules a frame. A world without dice is inert
    /// too. `inputs` are the caller's
    /// current signals and only later changes to them have an effect.
    pub fn mount(
        mut physics: P,
        render: Option<R>,
        settings: TraySettings,
        viewport: Viewport,
        inputs: TrayInputs,
        rng: StdRng,
    ) -> Tray<P, R> {
        let Some(mut render) = render else {
            warn!("No rendering surface available; dice tray disabled");
            physics.release();
            return Tray::Inert;
        };

        if physics.die_count() == 0 {
            warn!("Physics world holds no dice; dice tray disabled");
            physics.release();
            render.release();
            return Tray::Inert;
        }

        let settings = settings.validated();
        let bounds = ContainmentBounds::from_viewport(viewport, settings.view_size)
            .unwrap_or_else(|| {
                warn!(
                    "Mounting dice tray with degenerate viewport {}x{}; using a square tray",
                    viewport.width, viewport.height
                );
                let half = settings.view_size * 0.5;
                ContainmentBounds::new(half, half)
            });
        physics.set_bounds(&bounds);

        render.set_scheme(inputs.scheme);
        for index in 0..physics.die_count() {
            render.set_visible(DieId(index), false);
        }

        Tray::Active(Box::new(Self {
            thresholds: SettleThresholds::from_settings(&settings.settle),
            physics,
            render,
            settings,
            faces: DieFaces::fate(),
            bounds,
            pending_resize: None,
            pending_inputs: None,
            inputs,
            session: RollSession::default(),
            last_frame_at: None,
            last_readout: None,
            scheduled: false,
            rng,
            cancel: CancelToken::new(),
        }))
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn session(&self) -> &RollSession {
        &self.session
    }

    pub fn bounds(&self) -> ContainmentBounds {
        self.bounds
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut R {
        &mut self.render
    }

    pub fn settings(&self) -> &TraySettings {
        &self.settings
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Face read-out of the most recent settled roll.
    pub fn last_readout(&self) -> Option<&RollReadout> {
        self.last_readout.as_ref()
    }

    /// Whether the host should keep delivering frames.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled && !self.cancel.is_cancelled()
    }

    /// Whether a frame has work to do, including a resize queued while stopped.
    pub fn needs_frame(&self) -> bool {
        self.is_scheduled() || (self.pending_resize.is_some() && !self.cancel.is_cancelled())
    }

    /// Queue a viewport change. The latest one wins and is applied at the
    /// start of the next frame.
    pub fn post_resize(&mut self, viewport: Viewport) {
        self.pending_resize = Some(viewport);
    }

    /// Hand over the caller's current signals.
    ///
    /// While frames are running the inputs are applied at the start of the next
    /// frame. While stopped, a changed roll token is queued together with the
    /// rest of the inputs and schedules the frame that spawns it. Otherwise
    /// there is nothing to dismiss, so the dismiss token is taken over as the
    /// new baseline and a scheme change is applied right away.
    pub fn submit(&mut self, inputs: TrayInputs) {
        if self.cancel.is_cancelled() {
            return;
        }

        if self.scheduled {
            if inputs != self.pending_inputs.unwrap_or(self.inputs) {
                self.pending_inputs = Some(inputs);
            }
            return;
        }

        if inputs.scheme != self.inputs.scheme {
            self.render.set_scheme(inputs.scheme);
            self.inputs.scheme = inputs.scheme;
        }

        if inputs.roll_token != self.inputs.roll_token {
            self.pending_inputs = Some(inputs);
            self.scheduled = true;
        } else {
            self.inputs.dismiss_token = inputs.dismiss_token;
        }
    }

    /// Run one frame at timestamp `now` (seconds).
    pub fn frame(&mut self, now: f64) -> FrameReport {
        if self.cancel.is_cancelled() {
            return FrameReport::default();
        }

        let mut events = Vec::new();

        if let Some(viewport) = self.pending_resize.take() {
            self.apply_resize(viewport);
        }

        if let Some(inputs) = self.pending_inputs.take() {
            self.apply_inputs(inputs, &mut events);
        }

        let delta = match self.last_frame_at {
            Some(previous) => (now - previous).max(0.0) as f32,
            None => 0.0,
        };

        if self.session.phase().is_active() {
            self.last_frame_at = Some(now);

            self.physics.step(delta);
            self.session.advance(
                delta.min(self.settings.physics.max_frame_delta)
                    * self.settings.physics.simulation_speed,
            );

            let states = self.contain_and_sync();
            self.evaluate_settle(&states, now, &mut events);
            self.evaluate_fade(now, &mut events);
        }

        self.scheduled = self.session.phase().is_active();
        if !self.scheduled {
            self.last_frame_at = None;
        }

        FrameReport {
            events,
            scheduled: self.scheduled,
        }
    }

    /// Tear the tray down: cancel scheduling and release every physics and
    /// render resource. Safe to call more than once.
    pub fn unmount(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.scheduled = false;
        self.pending_inputs = None;
        self.pending_resize = None;
        self.session.reset();
        self.physics.release();
        self.render.release();
        info!("Dice tray unmounted");
    }

    fn apply_resize(&mut self, viewport: Viewport) {
        match ContainmentBounds::from_viewport(viewport, self.settings.view_size) {
            Some(bounds) => {
                self.bounds = bounds;
                self.physics.set_bounds(&bounds);
                debug!(
                    "Tray bounds now {:.2} x {:.2} for {}x{}",
                    bounds.half_width, bounds.half_depth, viewport.width, viewport.height
                );
            }
            None => {
                debug!(
                    "Ignoring degenerate resize {}x{}",
                    viewport.width, viewport.height
                );
            }
        }
    }

    fn apply_inputs(&mut self, inputs: TrayInputs, events: &mut Vec<TrayEvent>) {
        let previous = std::mem::replace(&mut self.inputs, inputs);

        if inputs.scheme != previous.scheme {
            self.render.set_scheme(inputs.scheme);
        }
        if inputs.roll_token != previous.roll_token {
            self.spawn(inputs.roll_token, events);
        }
        if inputs.dismiss_token != previous.dismiss_token && self.session.request_dismiss() {
            debug!(
                "Dismiss requested during {} phase",
                self.session.phase().name()
            );
        }
    }

    fn spawn(&mut self, token: u64, events: &mut Vec<TrayEvent>) {
        if self.session.phase().is_active() {
            debug!(
                "Roll {token} preempts roll {:?} in {} phase",
                self.session.token(),
                self.session.phase().name()
            );
        }
        self.session.begin(token);

        let die_count = self.physics.die_count();
        for index in 0..die_count {
            let die = DieId(index);
            let state = launch_state(
                &mut self.rng,
                &self.bounds,
                &self.settings.spawn,
                self.settings.die_size,
                index,
            );
            self.physics.place(die, state);
            self.render.sync_transform(die, state.position, state.rotation);
            self.render.set_visible(die, true);
        }
        self.render.set_opacity(1.0);

        info!("Rolling {die_count} dice (roll {token})");
        events.push(TrayEvent::RollingChanged(true));
        self.session.start_simulating();
    }

    fn contain_and_sync(&mut self) -> Vec<BodyState> {
        let margin = self.settings.clamp_margin();
        let damping = self.settings.clamp_damping;
        let mut states = Vec::with_capacity(self.physics.die_count());

        for index in 0..self.physics.die_count() {
            let die = DieId(index);
            let Some(mut state) = self.physics.body(die) else {
                continue;
            };
            if self
                .bounds
                .contain(margin, damping, &mut state.position, &mut state.linvel)
            {
                self.physics.place(die, state);
            }
            self.render.sync_transform(die, state.position, state.rotation);
            states.push(state);
        }

        states
    }

    fn evaluate_settle(&mut self, states: &[BodyState], now: f64, events: &mut Vec<TrayEvent>) {
        if self.session.phase() != Phase::Simulating {
            return;
        }

        let newly_settled = self.session.observe_motion(
            &self.thresholds,
            states.iter().map(|s| (s.linvel, s.angvel)),
            self.settings.settle.max_roll_seconds,
            now,
        );
        if !newly_settled || !self.session.claim_result() {
            return;
        }

        let readout = read_roll(&self.faces, states.iter().map(|s| s.rotation));
        if self.session.timed_out() {
            let speeds: Vec<String> = states
                .iter()
                .map(|s| format!("{:.2}/{:.2}", s.linvel.length(), s.angvel.length()))
                .collect();
            warn!(
                "Roll {:?} did not come to rest within {:.1}s; read [{}] = {} while moving (lin/ang speeds: {})",
                self.session.token(),
                self.settings.settle.max_roll_seconds,
                readout.glyphs(),
                readout.total,
                speeds.join(", ")
            );
        }
        info!(
            "Roll {:?} settled: [{}] = {}",
            self.session.token(),
            readout.glyphs(),
            readout.total
        );
        events.push(TrayEvent::Result(readout.total));
        self.last_readout = Some(readout);
    }

    fn evaluate_fade(&mut self, now: f64, events: &mut Vec<TrayEvent>) {
        if self
            .session
            .should_fade(now, self.settings.auto_fade_after_seconds())
        {
            self.session.begin_fade(now);
            debug!("Fading out roll {:?}", self.session.token());
        }

        if self.session.phase() != Phase::FadingOut {
            return;
        }

        let opacity = self
            .session
            .fade_opacity(now, self.settings.fade_duration_seconds());
        self.render.set_opacity(opacity);
        if opacity > 0.0 {
            return;
        }

        for index in 0..self.physics.die_count() {
            let die = DieId(index);
            self.render.set_visible(die, false);
            self.physics.sleep(die);
        }
        self.session.finish();
        info!("Dice hidden (roll {:?})", self.session.token());
        events.push(TrayEvent::RollingChanged(false));
    }
}
