//! Score, coins and combo bookkeeping

use glam::Vec2;

use super::state::{Combo, Effect, GameEvent, GameState, PlatformKind, ScorePopup};
use crate::consts::*;

/// Combo thresholds, highest first: (captures needed, coin multiplier)
pub const COMBO_THRESHOLDS: [(u32, f32); 3] = [(10, 3.0), (5, 2.0), (3, 1.5)];

/// First-visit bonus for landing on a platform
pub fn platform_score(kind: PlatformKind) -> u64 {
    match kind {
        PlatformKind::Normal => 1,
        PlatformKind::Bonus => 2,
        PlatformKind::Golden => 3,
        PlatformKind::Bed => 5,
        PlatformKind::Monster => 2,
        PlatformKind::Floor => 0,
    }
}

/// Whole rows climbed moving from `prev_y` to `y` (0 when falling)
pub fn rows_climbed(prev_y: f32, y: f32) -> u64 {
    let rows = ((prev_y - y) / ROW_HEIGHT).floor();
    if rows > 0.0 { rows as u64 } else { 0 }
}

/// Coin multiplier for the highest threshold `count` reaches
pub fn combo_multiplier(count: u32) -> f32 {
    COMBO_THRESHOLDS
        .iter()
        .find(|(needed, _)| count >= *needed)
        .map(|(_, mult)| *mult)
        .unwrap_or(1.0)
}

impl Combo {
    /// Register a capture at `now_ms`, returning the new count
    pub fn register_capture(&mut self, now_ms: u64) -> u32 {
        let chained = self
            .last_capture_ms
            .is_some_and(|last| now_ms.saturating_sub(last) <= COMBO_TIMEOUT_MS);
        self.count = if chained { self.count + 1 } else { 1 };
        self.last_capture_ms = Some(now_ms);
        self.count
    }

    /// Drop the combo to zero once the window has lapsed. Returns true if it expired.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        match self.last_capture_ms {
            Some(last) if self.count > 0 && now_ms.saturating_sub(last) > COMBO_TIMEOUT_MS => {
                self.count = 0;
                true
            }
            _ => false,
        }
    }

    pub fn multiplier(&self) -> f32 {
        combo_multiplier(self.count)
    }
}

/// Add points, spawn a popup and track the high score
pub fn award_points(state: &mut GameState, points: u64, at: Vec2) {
    if points == 0 {
        return;
    }
    state.score += points;
    if state.popups_enabled {
        state.popups.push(ScorePopup {
            pos: at,
            amount: points,
            age_ms: 0,
        });
    }
    if state.score > state.high_score {
        state.high_score = state.score;
        state.events.push(GameEvent::NewHighScore { score: state.score });
    }
}

/// Award a platform's bonus the first time it is landed on.
///
/// Returns the points awarded (0 on a revisit).
pub fn visit_platform(state: &mut GameState, id: u32, kind: PlatformKind) -> u64 {
    if !state.visited.insert(id) {
        return 0;
    }
    let points = platform_score(kind);
    let at = Vec2::new(state.player.center().x, state.player.pos.y);
    award_points(state, points, at);
    state.events.push(GameEvent::PlatformVisited { id, kind, points });
    if kind == PlatformKind::Bed {
        state.events.push(GameEvent::BedReached { id });
    }
    points
}

/// Capture treasure `index`, returning the coins awarded
pub fn collect_treasure(state: &mut GameState, index: usize) -> u64 {
    let Some(treasure) = state.treasures.get_mut(index) else {
        return 0;
    };
    if treasure.collected {
        return 0;
    }
    treasure.collected = true;
    let kind = treasure.kind;

    let combo = state.combo.register_capture(state.time_ms);
    let coins = (kind.value() as f32 * combo_multiplier(combo)).round() as u64;
    state.coins += coins;
    state
        .events
        .push(GameEvent::TreasureCollected { kind, coins, combo });
    coins
}

/// Spend coins if the balance allows it
pub fn try_spend(state: &mut GameState, cost: u64) -> bool {
    if state.coins < cost {
        return false;
    }
    state.coins -= cost;
    true
}

/// Launch the player, paying for a super jump when requested and affordable.
///
/// An unaffordable super jump falls back to a normal jump and queues a warning.
pub fn start_jump(state: &mut GameState, super_requested: bool) {
    let center = state.player.center();
    let mut impulse = JUMP_FORCE;

    if super_requested {
        if try_spend(state, SUPER_JUMP_COST) {
            impulse = JUMP_FORCE * SUPER_JUMP_MULTIPLIER;
            state.effects.push(Effect::SuperJumpWave { center });
            state.events.push(GameEvent::SuperJump {
                cost: SUPER_JUMP_COST,
            });
        } else {
            log::warn!(
                "Super jump needs {} coins, have {}",
                SUPER_JUMP_COST,
                state.coins
            );
            state.effects.push(Effect::CoinWarning { center });
            state.events.push(GameEvent::InsufficientCoins {
                needed: SUPER_JUMP_COST,
                available: state.coins,
            });
        }
    }

    state.player.vel.y = impulse;
    state.player.jumping = true;
}

/// Credit coins from outside the game loop (e.g. a completed purchase)
pub fn credit_coins(state: &mut GameState, amount: u64) {
    state.coins += amount;
    state.events.push(GameEvent::CoinsCredited { amount });
    log::info!("Credited {} coins (balance {})", amount, state.coins);
}
