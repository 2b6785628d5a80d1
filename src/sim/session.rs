//! Session lifecycle: Playing -> Resetting -> Playing
//!
//! Ending a session freezes the player and schedules a reset; any input while
//! resetting skips the wait.

use serde::{Deserialize, Serialize};

use super::generator;
use super::state::{Combo, EndCause, GameEvent, GameState, Player, SessionPhase};
use crate::consts::*;

/// Cancellable countdown to a session reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredReset {
    remaining_ms: Option<u64>,
}

impl DeferredReset {
    /// Arm (or re-arm) the countdown
    pub fn schedule(&mut self, delay_ms: u64) {
        self.remaining_ms = Some(delay_ms);
    }

    /// Disarm the countdown. Returns whether anything was pending; safe to call repeatedly.
    pub fn cancel(&mut self) -> bool {
        self.remaining_ms.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.remaining_ms.is_some()
    }

    pub fn remaining_ms(&self) -> Option<u64> {
        self.remaining_ms
    }

    /// Advance by `elapsed_ms`. Returns true exactly once, when the countdown fires.
    pub fn advance(&mut self, elapsed_ms: u64) -> bool {
        match self.remaining_ms {
            Some(remaining) if remaining <= elapsed_ms => {
                self.remaining_ms = None;
                true
            }
            Some(remaining) => {
                self.remaining_ms = Some(remaining - elapsed_ms);
                false
            }
            None => false,
        }
    }
}

/// End the current session: freeze the player and schedule the reset
pub fn begin_reset(state: &mut GameState, cause: EndCause) {
    if state.phase == SessionPhase::Resetting {
        return;
    }
    state.phase = SessionPhase::Resetting;
    state.player.vel = glam::Vec2::ZERO;
    state.reset_timer.schedule(RESET_DELAY_MS);
    state.events.push(GameEvent::SessionEnded {
        cause,
        score: state.score,
    });
    log::info!(
        "Session ended ({:?}) with score {} (best {})",
        cause,
        state.score,
        state.high_score
    );
}

/// Advance a resetting session. Input restarts immediately, otherwise the timer does.
pub fn update_resetting(state: &mut GameState, any_press: bool) {
    if state.phase != SessionPhase::Resetting {
        return;
    }
    if any_press {
        state.reset_timer.cancel();
        reinitialize(state);
    } else if state.reset_timer.advance(FRAME_MS) {
        reinitialize(state);
    }
}

/// Start a fresh session in place. The high score and RNG stream carry over.
pub fn reinitialize(state: &mut GameState) {
    state.reset_timer.cancel();
    state.player = Player::centered(&state.viewport);
    state.score = 0;
    state.coins = 0;
    state.combo = Combo::default();
    state.camera_y = 0.0;
    state.up_held = false;
    state.popups.clear();
    state.reset_trail();
    generator::populate_level(state);
    state.phase = SessionPhase::Playing;
    state.events.push(GameEvent::SessionRestarted);
    log::info!("Session restarted (best {})", state.high_score);
}
