//! Turns terminal key and mouse events into timer gestures.
//!
//! Many terminals never report key releases. When the keyboard enhancement
//! protocol is unavailable the release of the hold key is inferred from the
//! auto-repeat stream going quiet.

use clap::ValueEnum;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::timer::{Gesture, Trigger};

pub const DEFAULT_RELEASE_GAP_MS: u64 = 600;

/// How key releases are detected, as chosen on the command line or in config.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseMode {
    /// Native when the terminal supports release events, inferred otherwise
    #[default]
    Auto,
    /// Trust the terminal's release events
    Native,
    /// Infer releases from the auto-repeat stream stopping
    Inferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseDetection {
    Native,
    /// No press seen for `gap` means the hold key was let go.
    Inferred { gap: Duration },
}

impl ReleaseDetection {
    pub fn resolve(mode: ReleaseMode, gap: Duration, enhancement_supported: bool) -> Self {
        match mode {
            ReleaseMode::Native => Self::Native,
            ReleaseMode::Inferred => Self::Inferred { gap },
            ReleaseMode::Auto if enhancement_supported => Self::Native,
            ReleaseMode::Auto => Self::Inferred { gap },
        }
    }
}

pub fn trigger_for(code: KeyCode) -> Trigger {
    match code {
        KeyCode::Char(' ') => Trigger::Hold,
        KeyCode::Esc => Trigger::Reset,
        _ => Trigger::Other,
    }
}

#[derive(Debug, Clone)]
pub struct InputTranslator {
    detection: ReleaseDetection,
    hold_last_seen: Option<Instant>,
}

impl InputTranslator {
    pub fn new(detection: ReleaseDetection) -> Self {
        Self {
            detection,
            hold_last_seen: None,
        }
    }

    pub fn key(&mut self, key: &KeyEvent, now: Instant) -> Option<Gesture> {
        let trigger = trigger_for(key.code);

        match (self.detection, key.kind) {
            (_, KeyEventKind::Release) => {
                if trigger == Trigger::Hold {
                    self.hold_last_seen = None;
                }
                Some(Gesture::Up(trigger))
            }
            (ReleaseDetection::Native, KeyEventKind::Repeat) => None,
            (ReleaseDetection::Native, KeyEventKind::Press) => Some(Gesture::Down(trigger)),
            (ReleaseDetection::Inferred { .. }, _) if trigger == Trigger::Hold => {
                // every press after the first is auto-repeat of the same hold
                match self.hold_last_seen.replace(now) {
                    Some(_) => None,
                    None => Some(Gesture::Down(Trigger::Hold)),
                }
            }
            (ReleaseDetection::Inferred { .. }, KeyEventKind::Repeat) => None,
            (ReleaseDetection::Inferred { .. }, KeyEventKind::Press) => {
                Some(Gesture::Down(trigger))
            }
        }
    }

    pub fn mouse(&mut self, event: &MouseEvent) -> Option<Gesture> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Gesture::Down(Trigger::Hold)),
            MouseEventKind::Up(MouseButton::Left) => Some(Gesture::Up(Trigger::Hold)),
            _ => None,
        }
    }

    /// Synthesises the release of an inferred hold once the repeat stream has
    /// gone quiet. The release is dated at the last press seen, not at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<(Gesture, Instant)> {
        let ReleaseDetection::Inferred { gap } = self.detection else {
            return None;
        };

        let last_seen = self.hold_last_seen?;
        if now.saturating_duration_since(last_seen) <= gap {
            return None;
        }

        self.hold_last_seen = None;
        debug!("inferred hold release after {}ms of silence", gap.as_millis());
        Some((Gesture::Up(Trigger::Hold), last_seen))
    }
}
