use log::{debug, info};
use std::time::{Duration, Instant};

use crate::frame_loop::{FrameLoop, TaskHandle};
use crate::history::History;
use crate::scramble::{ScramblePair, ScrambleSource};
use crate::session::{Phase, Session};

/// Minimum hold before a release arms and starts the timer.
pub const HOLD_THRESHOLD: Duration = Duration::from_millis(300);

/// Minimum spacing between two published readouts while running.
pub const FRAME_THROTTLE: Duration = Duration::from_millis(50);

/// Which kind of input a gesture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Space bar or a primary pointer press.
    Hold,
    /// Escape.
    Reset,
    /// Anything else. Still stops a running solve.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Down(Trigger),
    Up(Trigger),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameTask {
    HoldWatch,
    DurationDisplay,
}

/// Transient state of the current press, cleared once the gesture completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressState {
    pub down_at: Option<Instant>,
    pub held_long_enough: bool,
    pub pressed: bool,
    /// The press that stopped a solve is still down; its release is swallowed.
    pub awaiting_release: bool,
}

/// What the readout should look like right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Indicator {
    Released,
    Pressed,
    Ready,
    Running,
}

/// A hold-to-start solve timer: session, press, history and scrambles.
#[derive(Debug)]
pub struct Timer {
    session: Session,
    press: PressState,
    history: History,
    scrambles: ScramblePair,
    scrambler: Box<dyn ScrambleSource>,
    displayed: Duration,
    frames: FrameLoop<FrameTask>,
    hold_watch: Option<TaskHandle>,
    display_loop: Option<TaskHandle>,
    last_render_at: Option<Instant>,
}

impl Timer {
    pub fn new(scrambler: Box<dyn ScrambleSource>) -> Self {
        let mut timer = Self {
            session: Session::new(),
            press: PressState::default(),
            history: History::new(),
            scrambles: ScramblePair::new(),
            scrambler,
            displayed: Duration::ZERO,
            frames: FrameLoop::new(),
            hold_watch: None,
            display_loop: None,
            last_render_at: None,
        };
        timer.next_scramble();
        timer
    }

    pub fn handle(&mut self, gesture: Gesture, at: Instant) {
        match gesture {
            Gesture::Down(trigger) => self.gesture_down(trigger, at),
            Gesture::Up(trigger) => self.gesture_up(trigger, at),
        }
    }

    pub fn gesture_down(&mut self, trigger: Trigger, at: Instant) {
        if self.session.is_running() {
            self.stop(at);
            if trigger == Trigger::Hold {
                self.press.awaiting_release = true;
            }
            return;
        }

        if trigger == Trigger::Reset && self.session.phase() == Phase::Stopped {
            self.reset();
            return;
        }

        if trigger != Trigger::Hold || self.press.awaiting_release {
            return;
        }

        self.press.pressed = true;

        if self.press.down_at.is_some() {
            return;
        }

        self.press.down_at = Some(at);
        self.hold_watch = Some(self.frames.request(FrameTask::HoldWatch));
    }

    pub fn gesture_up(&mut self, trigger: Trigger, at: Instant) {
        if trigger != Trigger::Hold {
            return;
        }

        if self.press.awaiting_release {
            self.press.awaiting_release = false;
            return;
        }

        let Some(down_at) = self.press.down_at.take() else {
            return;
        };

        self.press.pressed = false;
        self.press.held_long_enough = false;
        self.frames.cancel_slot(&mut self.hold_watch);

        let held = at.saturating_duration_since(down_at);
        if held >= HOLD_THRESHOLD {
            self.start(at);
        } else {
            debug!("hold released after {}ms, too short to start", held.as_millis());
        }
    }

    pub fn start(&mut self, at: Instant) -> bool {
        if !self.session.start(at) {
            return false;
        }

        self.displayed = Duration::ZERO;
        self.last_render_at = None;
        self.frames.cancel_slot(&mut self.display_loop);
        self.display_loop = Some(self.frames.request(FrameTask::DurationDisplay));
        info!("solve started");
        true
    }

    /// Stops a running solve, records it and moves on to the next scramble.
    pub fn stop(&mut self, at: Instant) -> Option<Duration> {
        let duration = self.session.stop(at)?;

        self.frames.cancel_slot(&mut self.display_loop);
        self.frames.cancel_slot(&mut self.hold_watch);

        let solve = self.history.record(duration);
        self.displayed = solve.duration;
        info!(
            "solve stopped at {}ms ({} recorded)",
            solve.duration.as_millis(),
            self.history.len()
        );

        self.next_scramble();
        Some(solve.duration)
    }

    pub fn reset(&mut self) -> bool {
        if !self.session.reset() {
            return false;
        }

        self.displayed = Duration::ZERO;
        self.last_render_at = None;
        info!("timer reset");
        true
    }

    /// Runs every scheduled frame task. Returns true when something visible changed.
    pub fn on_frame(&mut self, now: Instant) -> bool {
        let mut changed = false;

        for task in self.frames.frame() {
            match task {
                FrameTask::HoldWatch => changed |= self.watch_hold(now),
                FrameTask::DurationDisplay => changed |= self.render_duration(now),
            }
        }

        changed
    }

    fn watch_hold(&mut self, now: Instant) -> bool {
        match self.press.down_at {
            Some(down_at)
                if !self.press.held_long_enough
                    && now.saturating_duration_since(down_at) >= HOLD_THRESHOLD =>
            {
                self.press.held_long_enough = true;
                debug!("hold armed");
                true
            }
            _ => false,
        }
    }

    fn render_duration(&mut self, now: Instant) -> bool {
        let due = self
            .last_render_at
            .map_or(true, |last| now.saturating_duration_since(last) >= FRAME_THROTTLE);
        if !due {
            return false;
        }

        self.last_render_at = Some(now);

        match self.session.started_at() {
            Some(started_at) if self.session.is_running() => {
                self.displayed = now.saturating_duration_since(started_at);
                true
            }
            _ => false,
        }
    }

    fn next_scramble(&mut self) {
        let scramble = self.scrambler.next_scramble();
        self.scrambles.rotate(scramble);
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn press(&self) -> &PressState {
        &self.press
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn scrambles(&self) -> &ScramblePair {
        &self.scrambles
    }

    /// The duration the readout shows.
    pub fn displayed(&self) -> Duration {
        self.displayed
    }

    pub fn average_secs(&self) -> f64 {
        self.history.average_secs()
    }

    /// True while any frame task is scheduled and the UI should keep redrawing.
    pub fn is_animating(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn indicator(&self) -> Indicator {
        if self.session.is_running() {
            Indicator::Running
        } else if self.press.held_long_enough {
            Indicator::Ready
        } else if self.press.pressed {
            Indicator::Pressed
        } else {
            Indicator::Released
        }
    }
}
