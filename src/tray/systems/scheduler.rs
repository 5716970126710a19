//! Frame scheduling
//!
//! Hosts without their own frame loop (the headless roller, tests) drive the
//! tray with `FrameScheduler`: a plain loop on a virtual clock that stops when
//! the tray goes idle or when its cancellation token fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::sync_loop::{FrameReport, SyncLoop};
use crate::tray::ports::{PhysicsWorld, RenderProxy};

/// Shared stop flag. Cancelling is final.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why a scheduler run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunEnd {
    /// The tray stopped asking for frames.
    Idle,
    /// The caller's predicate asked to stop.
    Stopped,
    /// The cancellation token fired.
    Cancelled,
    /// The frame budget ran out.
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub end: RunEnd,
}

/// Virtual-clock frame loop.
#[derive(Clone, Debug)]
pub struct FrameScheduler {
    now: f64,
    frame_interval: f64,
    max_frames: u64,
}

impl FrameScheduler {
    /// `frame_interval` is the simulated display refresh period in seconds.
    pub fn new(frame_interval: f64, max_frames: u64) -> Self {
        Self {
            now: 0.0,
            frame_interval,
            max_frames,
        }
    }

    /// A 60 Hz display.
    pub fn display_rate() -> Self {
        Self::new(1.0 / 60.0, 60 * 60)
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Run frames until the tray goes idle, `stop` returns `true` for a
    /// frame's report, the tray's token is cancelled or the budget runs out.
    pub fn run_until<P, R, F>(&mut self, tray: &mut SyncLoop<P, R>, mut stop: F) -> RunSummary
    where
        P: PhysicsWorld,
        R: RenderProxy,
        F: FnMut(&FrameReport) -> bool,
    {
        let cancel = tray.cancel_token();
        let mut frames = 0;

        loop {
            if cancel.is_cancelled() {
                return RunSummary {
                    frames,
                    end: RunEnd::Cancelled,
                };
            }
            if !tray.needs_frame() {
                return RunSummary {
                    frames,
                    end: RunEnd::Idle,
                };
            }
            if frames >= self.max_frames {
                return RunSummary {
                    frames,
                    end: RunEnd::Exhausted,
                };
            }

            let report = tray.frame(self.now);
            self.now += self.frame_interval;
            frames += 1;

            if stop(&report) {
                return RunSummary {
                    frames,
                    end: RunEnd::Stopped,
                };
            }
        }
    }

    /// Run until the tray goes idle.
    pub fn run<P, R>(&mut self, tray: &mut SyncLoop<P, R>) -> RunSummary
    where
        P: PhysicsWorld,
        R: RenderProxy,
    {
        self.run_until(tray, |_| false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}
