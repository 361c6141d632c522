//! Display loop: polls for a newly published poster and crossfades to it full-screen.

use std::time::Duration;

use crate::config::DisplayConfig;
use crate::foundation::error::PosterResult;

mod clock;
mod crossfade;
mod frame;
mod source;
mod window;

pub use clock::{Clock, SystemClock};
pub use crossfade::{CrossfadePlan, blend_into};
pub use frame::{DisplayFrame, fitted_size};
pub use source::{FileUpdateSource, PosterVersion, UpdateSource};
pub use window::WindowScreen;

/// Presentation surface.
pub trait Screen {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);

    fn present(&mut self, frame: &DisplayFrame) -> PosterResult<()>;

    /// Drain pending window events and report whether quit was requested.
    fn poll_quit(&mut self) -> bool;
}

/// What the loop is currently showing.
#[derive(Debug, Default)]
pub enum DisplayState {
    #[default]
    NoFrame,
    ShowingFrame {
        frame: DisplayFrame,
        version: PosterVersion,
    },
}

/// Result of one poll cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing new (or the new version failed to load).
    Idle,
    /// First poster shown without a transition.
    Shown,
    /// Replaced the previous poster after `ticks` blended presents.
    Crossfaded { ticks: u32 },
    Quit,
}

pub struct DisplayLoop<S, D, C> {
    cfg: DisplayConfig,
    source: S,
    screen: D,
    clock: C,
    state: DisplayState,
    quit_pending: bool,
}

impl<S, D, C> DisplayLoop<S, D, C>
where
    S: UpdateSource,
    D: Screen,
    C: Clock,
{
    pub fn new(cfg: DisplayConfig, source: S, screen: D, clock: C) -> PosterResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            source,
            screen,
            clock,
            state: DisplayState::NoFrame,
            quit_pending: false,
        })
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn last_seen(&self) -> Option<PosterVersion> {
        match &self.state {
            DisplayState::NoFrame => None,
            DisplayState::ShowingFrame { version, .. } => Some(*version),
        }
    }

    pub fn screen(&self) -> &D {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut D {
        &mut self.screen
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Poll until quit is requested.
    pub fn run(&mut self) -> PosterResult<()> {
        tracing::info!(
            path = %self.cfg.poster_path.display(),
            poll_secs = self.cfg.poll_interval_secs,
            fade_secs = self.cfg.fade_duration_secs,
            fps = self.cfg.fps,
            "display loop started"
        );
        loop {
            if self.step()? == StepOutcome::Quit || self.wait_poll_interval() {
                tracing::info!("quit requested");
                return Ok(());
            }
        }
    }

    /// A version differing from the one on screen, if any.
    pub fn poll_for_update(&mut self) -> Option<PosterVersion> {
        let version = self.source.poll_for_update()?;
        (Some(version) != self.last_seen()).then_some(version)
    }

    /// One poll cycle: check quit, look for a new version, show or crossfade to it.
    pub fn step(&mut self) -> PosterResult<StepOutcome> {
        if self.quit_pending || self.screen.poll_quit() {
            self.quit_pending = true;
            return Ok(StepOutcome::Quit);
        }
        let Some(version) = self.poll_for_update() else {
            return Ok(StepOutcome::Idle);
        };

        let image = match self.source.load(version) {
            Ok(img) => img,
            Err(err) => {
                tracing::warn!(%err, "poster load failed, retrying on next poll");
                return Ok(StepOutcome::Idle);
            }
        };
        let (sw, sh) = self.screen.size();
        let incoming = DisplayFrame::fit(&image, sw, sh)?;

        let outcome = match &self.state {
            DisplayState::NoFrame => {
                self.screen.present(&incoming)?;
                tracing::info!(width = sw, height = sh, "first poster shown");
                StepOutcome::Shown
            }
            DisplayState::ShowingFrame {
                frame: outgoing, ..
            } => {
                let plan = CrossfadePlan::new(self.cfg.fade_duration(), self.cfg.fps);
                let quit_seen = run_crossfade(
                    &mut self.screen,
                    &mut self.clock,
                    self.cfg.frame_duration(),
                    plan,
                    outgoing,
                    &incoming,
                )?;
                self.quit_pending |= quit_seen;
                tracing::info!(ticks = plan.ticks(), "crossfaded to new poster");
                StepOutcome::Crossfaded {
                    ticks: plan.ticks(),
                }
            }
        };

        self.state = DisplayState::ShowingFrame {
            frame: incoming,
            version,
        };
        Ok(outcome)
    }

    /// Sleep one poll interval in frame-sized slices; `true` when quit arrived meanwhile.
    fn wait_poll_interval(&mut self) -> bool {
        let slice = self.cfg.frame_duration();
        // `None` when the interval reaches past what `Instant` can represent.
        let deadline = self.clock.now().checked_add(self.cfg.poll_interval());
        loop {
            if self.quit_pending || self.screen.poll_quit() {
                self.quit_pending = true;
                return true;
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(self.clock.now()),
                None => slice,
            };
            if remaining.is_zero() {
                return false;
            }
            self.clock.sleep(remaining.min(slice));
        }
    }
}

/// Present every tick of `plan`, pacing to `frame_duration`.
///
/// Runs to completion; returns whether a quit request was seen on the way.
fn run_crossfade<D: Screen, C: Clock>(
    screen: &mut D,
    clock: &mut C,
    frame_duration: Duration,
    plan: CrossfadePlan,
    outgoing: &DisplayFrame,
    incoming: &DisplayFrame,
) -> PosterResult<bool> {
    if (outgoing.width(), outgoing.height()) != (incoming.width(), incoming.height()) {
        tracing::debug!("screen size changed, skipping crossfade");
        screen.present(incoming)?;
        return Ok(screen.poll_quit());
    }
    let mut scratch = incoming.clone();
    let mut quit_seen = false;
    for (a_old, a_new) in plan.opacities() {
        let tick_start = clock.now();
        quit_seen |= screen.poll_quit();
        blend_into(&mut scratch, outgoing, incoming, a_old, a_new)?;
        screen.present(&scratch)?;
        let elapsed = clock.now().saturating_duration_since(tick_start);
        clock.sleep(frame_duration.saturating_sub(elapsed));
    }
    Ok(quit_seen)
}
