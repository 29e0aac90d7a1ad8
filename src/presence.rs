//! Two-state presence machine driving the LED strip.
//!
//! The mirror dims when the tracked subject walks away and brightens when
//! they return. Transitions are deliberately idempotent: a redundant EXIT
//! while already dimmed (the sensor repeats itself) is a no-op, so the
//! actuator only ever sees one command per real transition.

use crate::classify::PresenceEvent;

/// Process-wide presence state, owned by the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    /// Subject in range; screen and strip at full brightness.
    Active,
    /// Subject out of range; strip dimmed.
    Dimmed,
}

/// Side effects of a state change.
///
/// The caller turns one `Transition` into exactly one actuator command and
/// one synthetic output event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Brightness to command on the LED strip, 0..=100.
    pub brightness: u8,
    /// Signal name for the synthetic output event.
    pub signal: &'static str,
}

/// Brightness commanded when dimming.
pub const DIM_BRIGHTNESS: u8 = 10;
/// Brightness commanded when brightening.
pub const FULL_BRIGHTNESS: u8 = 100;

impl PresenceState {
    /// Apply a presence event, returning the side effects if the state
    /// changed. Any (state, event) pair not listed is a no-op.
    pub fn apply(&mut self, event: PresenceEvent) -> Option<Transition> {
        match (*self, event) {
            (PresenceState::Active, PresenceEvent::Exit) => {
                *self = PresenceState::Dimmed;
                Some(Transition {
                    brightness: DIM_BRIGHTNESS,
                    signal: "screen_dim",
                })
            }
            (PresenceState::Dimmed, PresenceEvent::Enter) => {
                *self = PresenceState::Active;
                Some(Transition {
                    brightness: FULL_BRIGHTNESS,
                    signal: "screen_brighten",
                })
            }
            _ => None,
        }
    }
}

impl Default for PresenceState {
    /// The process starts assuming someone is in front of the mirror.
    fn default() -> Self {
        PresenceState::Active
    }
}
