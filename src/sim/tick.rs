//! Per-frame simulation tick
//!
//! One call advances the session by one animation frame. Order matters:
//! physics, generation, camera, landings, hazards, then pickups.

use glam::Vec2;

use super::collision::{lands_on, within_reach};
use super::generator;
use super::scoring::{self, award_points, rows_climbed, start_jump, visit_platform};
use super::session::{begin_reset, update_resetting};
use super::state::{EndCause, GameEvent, GameState, SessionPhase};
use crate::consts::*;

/// Monsters notice the player within this distance (center to center)
pub const MONSTER_ATTACK_RADIUS: f32 = 150.0;
pub const MONSTER_PATROL_SPEED: f32 = 1.0;
pub const MONSTER_CHASE_SPEED: f32 = 2.5;
/// Patrol swing either side of the anchor
pub const MONSTER_PATROL_RANGE: f32 = 60.0;
/// Chase limit either side of the anchor
pub const MONSTER_CHASE_RANGE: f32 = 100.0;
/// Ticks a monster stays angry after losing sight of the player
pub const MONSTER_ANGER_TICKS: u32 = 60;
/// Jump impulse multiplier for a monster escape
pub const ESCAPE_MULTIPLIER: f32 = 1.2;
/// Treasure bob amplitude
pub const TREASURE_FLOAT_AMPLITUDE: f32 = 4.0;

/// Input flags for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Held state; a jump starts on the press edge
    pub up: bool,
    /// Not bound to a gameplay action
    pub down: bool,
    /// Super jump modifier (shift / on-screen button)
    pub super_jump: bool,
    /// A key went down or the surface was clicked this frame
    pub any_press: bool,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.time_ticks += 1;
    state.time_ms += FRAME_MS;

    age_popups(state);

    let jump_pressed = input.up && !state.up_held;
    state.up_held = input.up;

    if state.phase == SessionPhase::Resetting {
        update_resetting(state, input.any_press);
        return;
    }

    // Gravity accumulates without a terminal velocity
    state.player.vel.y += GRAVITY;

    state.player.vel.x = if input.left {
        -MOVEMENT_SPEED
    } else if input.right {
        MOVEMENT_SPEED
    } else {
        0.0
    };

    if jump_pressed && !state.player.jumping {
        start_jump(state, input.super_jump);
    }

    let previous_y = state.player.pos.y;
    state.player.pos += state.player.vel;

    let rows = rows_climbed(previous_y, state.player.pos.y);
    if rows > 0 {
        let at = Vec2::new(state.player.center().x, state.player.pos.y);
        award_points(state, rows, at);
        state.events.push(GameEvent::RowsClimbed { rows });
    }

    generator::extend_level(state);
    update_camera(state);

    if resolve_landings(state) {
        begin_reset(state, EndCause::Floor);
        return;
    }

    let max_x = state.viewport.width - state.player.size;
    state.player.pos.x = state.player.pos.x.clamp(0.0, max_x.max(0.0));

    state.record_trail();

    if update_monsters(state) {
        begin_reset(state, EndCause::Monster);
        return;
    }

    update_treasures(state);

    state.player.invincible_ticks = state.player.invincible_ticks.saturating_sub(1);
}

/// Keep the player a third of the way down the screen without scrolling past the floor
fn update_camera(state: &mut GameState) {
    let follow = state.player.pos.y - state.viewport.height / 3.0;
    state.camera_y = follow.min(state.viewport.floor_top());
}

/// Land the player on any platform it swept onto this tick.
///
/// Returns true if the player touched the floor.
fn resolve_landings(state: &mut GameState) -> bool {
    state.player.jumping = true;

    let mut landed = Vec::new();
    for platform in &state.platforms {
        let player_box = state.player.bounds();
        if !lands_on(&player_box, state.player.vel.y, &platform.bounds()) {
            continue;
        }
        if platform.is_floor() {
            return true;
        }
        state.player.jumping = false;
        state.player.vel.y = 0.0;
        state.player.pos.y = platform.pos.y - state.player.size;
        landed.push((platform.id, platform.kind));
    }

    for (id, kind) in landed {
        visit_platform(state, id, kind);
    }
    false
}

/// Move monsters and test them against the player.
///
/// Returns true if a monster caught the player.
fn update_monsters(state: &mut GameState) -> bool {
    let player_center = state.player.center();
    let player_box = state.player.bounds();
    let rising = state.player.vel.y < 0.0;

    let mut escaped_from = None;
    for monster in &mut state.monsters {
        let to_player = player_center - monster.pos;
        if to_player.length() < MONSTER_ATTACK_RADIUS {
            monster.angry = true;
            monster.anger_ticks = MONSTER_ANGER_TICKS;
            monster.offset = (monster.offset + MONSTER_CHASE_SPEED * to_player.x.signum())
                .clamp(-MONSTER_CHASE_RANGE, MONSTER_CHASE_RANGE);
        } else {
            if monster.anger_ticks > 0 {
                monster.anger_ticks -= 1;
                monster.angry = monster.anger_ticks > 0;
            }
            if monster.offset >= MONSTER_PATROL_RANGE {
                monster.direction = -1.0;
            } else if monster.offset <= -MONSTER_PATROL_RANGE {
                monster.direction = 1.0;
            }
            monster.offset += MONSTER_PATROL_SPEED * monster.direction;
        }
        monster.pos.x = monster.home.x + monster.offset;

        if escaped_from.is_some() || state.player.is_invincible() {
            continue;
        }
        if monster.bounds().overlaps(&player_box) {
            if !rising {
                return true;
            }
            escaped_from = Some(monster.id);
        }
    }

    if let Some(monster_id) = escaped_from {
        state.player.vel.y = JUMP_FORCE * ESCAPE_MULTIPLIER;
        state.player.invincible_ticks = INVINCIBILITY_TICKS;
        state.events.push(GameEvent::MonsterEscape { monster_id });
        log::debug!("Escaped monster {monster_id}");
    }
    false
}

/// Bob treasures, expire a stale combo, and collect anything in reach
fn update_treasures(state: &mut GameState) {
    state.combo.expire(state.time_ms);

    let player_center = state.player.center();
    let reach_bonus = state.player.size / 2.0;
    let phase = state.time_ticks as f32 * 0.1;

    let mut captured = Vec::new();
    for (index, treasure) in state.treasures.iter_mut().enumerate() {
        if treasure.collected {
            continue;
        }
        treasure.float_offset = (phase + treasure.id as f32).sin() * TREASURE_FLOAT_AMPLITUDE;
        if within_reach(player_center, treasure.pos(), treasure.kind.radius() + reach_bonus) {
            captured.push(index);
        }
    }

    for index in captured {
        scoring::collect_treasure(state, index);
    }
}

/// Age and drift score popups; visual only
fn age_popups(state: &mut GameState) {
    for popup in &mut state.popups {
        popup.age_ms += FRAME_MS;
        popup.pos.y -= 1.0;
    }
    state
        .popups
        .retain(|p| p.age_ms < SCORE_POPUP_DURATION_MS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{
        Monster, Platform, PlatformKind, Player, Treasure, TreasureKind, Viewport,
    };

    const PLATFORM_ID: u32 = 9_000;

    /// State with the player resting on a single platform and nothing else around
    fn standing_state(kind: PlatformKind) -> GameState {
        let mut state = GameState::new(1234, Viewport::new(480.0, 800.0));
        state.treasures.clear();
        state.monsters.clear();
        state.platforms.truncate(1);
        state.platforms.push(Platform {
            id: PLATFORM_ID,
            pos: Vec2::new(200.0, 500.0),
            width: 120.0,
            height: PLATFORM_HEIGHT,
            kind,
        });
        state.player = Player {
            pos: Vec2::new(220.0, 500.0 - PLAYER_SIZE),
            ..Player::centered(&state.viewport)
        };
        state.player.jumping = false;
        state.drain_events();
        state
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_landing_on_golden_scores_once() {
        let mut state = standing_state(PlatformKind::Golden);
        tick(&mut state, &idle());
        assert!(state.visited.contains(&PLATFORM_ID));
        assert_eq!(state.score, 3);
        assert!(!state.player.jumping);
        assert_eq!(state.player.vel.y, 0.0);

        // Standing there keeps re-landing without re-scoring
        for _ in 0..30 {
            tick(&mut state, &idle());
        }
        assert_eq!(state.score, 3);
    }

    #[test]
    fn test_jump_is_edge_triggered() {
        let mut state = standing_state(PlatformKind::Normal);
        tick(&mut state, &idle());

        let up = TickInput {
            up: true,
            ..Default::default()
        };
        tick(&mut state, &up);
        assert!(state.player.vel.y < 0.0);

        // Ride the jump out while still holding up
        for _ in 0..200 {
            tick(&mut state, &up);
            if !state.player.jumping {
                break;
            }
        }
        assert!(!state.player.jumping);
        // Holding up after landing does not jump again
        tick(&mut state, &up);
        assert_eq!(state.player.vel.y, 0.0);
    }

    #[test]
    fn test_super_jump_with_no_coins_is_normal_jump() {
        let mut state = standing_state(PlatformKind::Normal);
        tick(&mut state, &idle());
        state.coins = 0;
        let input = TickInput {
            up: true,
            super_jump: true,
            ..Default::default()
        };
        tick(&mut state, &input);
        // Gravity was applied before the jump replaced vertical velocity
        assert_eq!(state.player.vel.y, JUMP_FORCE);
        assert_eq!(state.coins, 0);
        assert!(
            state
                .drain_effects()
                .iter()
                .any(|e| matches!(e, crate::sim::state::Effect::CoinWarning { .. }))
        );
    }

    #[test]
    fn test_climbing_awards_rows() {
        let mut state = standing_state(PlatformKind::Normal);
        tick(&mut state, &idle());
        let before = state.score;
        let up = TickInput {
            up: true,
            ..Default::default()
        };
        tick(&mut state, &up);
        // First rising tick moves 8 units: no whole row yet
        assert_eq!(state.score, before);

        state.player.vel.y = -45.0;
        tick(&mut state, &idle());
        assert_eq!(state.score, before + 2);
    }

    #[test]
    fn test_horizontal_input_is_instant_and_clamped() {
        let mut state = standing_state(PlatformKind::Normal);
        let left = TickInput {
            left: true,
            ..Default::default()
        };
        tick(&mut state, &left);
        assert_eq!(state.player.vel.x, -MOVEMENT_SPEED);

        state.player.pos.x = 1.0;
        tick(&mut state, &left);
        assert_eq!(state.player.pos.x, 0.0);

        tick(&mut state, &idle());
        assert_eq!(state.player.vel.x, 0.0);
    }

    #[test]
    fn test_floor_contact_resets_after_delay() {
        let mut state = standing_state(PlatformKind::Normal);
        state.platforms.truncate(1);
        award_points(&mut state, 17, Vec2::ZERO);
        // Drop the player just above the floor
        state.player.pos = Vec2::new(100.0, state.viewport.floor_top() - PLAYER_SIZE - 1.0);
        state.player.vel = Vec2::new(0.0, 2.0);
        tick(&mut state, &idle());
        assert_eq!(state.phase, SessionPhase::Resetting);
        assert_eq!(state.player.vel, Vec2::ZERO);

        let delay_ticks = RESET_DELAY_MS.div_ceil(FRAME_MS);
        for _ in 0..delay_ticks - 1 {
            tick(&mut state, &idle());
            assert_eq!(state.phase, SessionPhase::Resetting);
        }
        tick(&mut state, &idle());
        assert_eq!(state.phase, SessionPhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.high_score, 17);
        assert!(state.visited.is_empty());
    }

    #[test]
    fn test_any_press_cancels_reset() {
        let mut state = standing_state(PlatformKind::Normal);
        begin_reset(&mut state, EndCause::Floor);
        let press = TickInput {
            any_press: true,
            ..Default::default()
        };
        tick(&mut state, &press);
        assert_eq!(state.phase, SessionPhase::Playing);
        assert!(!state.reset_timer.is_pending());
    }

    fn monster_at(state: &mut GameState, pos: Vec2) {
        state.monsters.push(Monster {
            id: 77,
            platform_id: PLATFORM_ID,
            pos,
            home: pos,
            offset: 0.0,
            direction: 1.0,
            angry: false,
            anger_ticks: 0,
            size: crate::sim::generator::MONSTER_SIZE,
        });
    }

    #[test]
    fn test_monster_contact_while_standing_ends_session() {
        let mut state = standing_state(PlatformKind::Monster);
        let center = state.player.center();
        monster_at(&mut state, center);
        tick(&mut state, &idle());
        assert_eq!(state.phase, SessionPhase::Resetting);
        assert!(state.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::SessionEnded {
                cause: EndCause::Monster,
                ..
            }
        )));
    }

    #[test]
    fn test_rising_player_escapes_monster() {
        let mut state = standing_state(PlatformKind::Monster);
        state.player.pos.y = 300.0;
        state.player.vel.y = -6.0;
        let center = state.player.center() + Vec2::new(0.0, -6.0 + GRAVITY);
        monster_at(&mut state, center);
        tick(&mut state, &idle());
        assert_eq!(state.phase, SessionPhase::Playing);
        assert!(state.player.is_invincible());
        assert_eq!(state.player.vel.y, JUMP_FORCE * ESCAPE_MULTIPLIER);

        // Invincible: further overlap is ignored even when falling
        state.player.vel.y = 1.0;
        let center = state.player.center();
        state.monsters[0].home = center;
        state.monsters[0].offset = 0.0;
        tick(&mut state, &idle());
        assert_eq!(state.phase, SessionPhase::Playing);
    }

    #[test]
    fn test_monster_patrol_reverses_at_range() {
        let mut state = standing_state(PlatformKind::Monster);
        // Far from the player so it only patrols
        monster_at(&mut state, Vec2::new(100.0, -2000.0));
        let mut max_offset: f32 = 0.0;
        for _ in 0..300 {
            state.player.pos.y = 500.0 - PLAYER_SIZE;
            state.player.vel.y = 0.0;
            tick(&mut state, &idle());
            max_offset = max_offset.max(state.monsters[0].offset.abs());
        }
        assert!(max_offset <= MONSTER_PATROL_RANGE + MONSTER_PATROL_SPEED);
        assert!(!state.monsters[0].angry);
    }

    #[test]
    fn test_monster_chases_player_in_range() {
        let mut state = standing_state(PlatformKind::Normal);
        // 120 to the left and a little above, close enough to notice but not touching
        let lurk = state.player.center() + Vec2::new(-120.0, -60.0);
        monster_at(&mut state, lurk);

        tick(&mut state, &idle());
        assert!(state.monsters[0].angry);
        assert_eq!(state.monsters[0].anger_ticks, MONSTER_ANGER_TICKS);
        assert_eq!(state.monsters[0].offset, MONSTER_CHASE_SPEED);
        assert_eq!(state.monsters[0].pos.x, lurk.x + MONSTER_CHASE_SPEED);

        tick(&mut state, &idle());
        assert_eq!(state.monsters[0].offset, 2.0 * MONSTER_CHASE_SPEED);

        // Chasing stops at the edge of the monster's range
        for _ in 0..60 {
            tick(&mut state, &idle());
        }
        assert_eq!(state.phase, SessionPhase::Playing);
        assert_eq!(state.monsters[0].offset, MONSTER_CHASE_RANGE);
        assert!(state.monsters[0].angry);
    }

    #[test]
    fn test_monster_calms_down_out_of_range() {
        let mut state = standing_state(PlatformKind::Normal);
        let lurk = state.player.center() + Vec2::new(-120.0, -60.0);
        monster_at(&mut state, lurk);
        tick(&mut state, &idle());
        assert!(state.monsters[0].angry);

        state.monsters[0].home.y = -2000.0;
        state.monsters[0].pos.y = -2000.0;
        for _ in 0..MONSTER_ANGER_TICKS - 1 {
            tick(&mut state, &idle());
            assert!(state.monsters[0].angry);
        }
        tick(&mut state, &idle());
        assert!(!state.monsters[0].angry);
        assert_eq!(state.monsters[0].anger_ticks, 0);
    }

    #[test]
    fn test_bed_landing_emits_event() {
        let mut state = standing_state(PlatformKind::Bed);
        tick(&mut state, &idle());
        tick(&mut state, &idle());
        let beds = state
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::BedReached { id: PLATFORM_ID })
            .count();
        assert_eq!(beds, 1);
        assert_eq!(state.score, 5);
    }

    #[test]
    fn test_treasure_capture_awards_coins() {
        let mut state = standing_state(PlatformKind::Normal);
        let center = state.player.center();
        state.treasures.push(Treasure {
            id: 500,
            platform_id: PLATFORM_ID,
            kind: TreasureKind::Crown,
            base_pos: center,
            float_offset: 0.0,
            collected: false,
        });
        tick(&mut state, &idle());
        assert_eq!(state.coins, 50);
        assert_eq!(state.combo.count, 1);
        assert!(state.treasures.iter().all(|t| t.collected));

        // Collected treasures are dropped on the next tick and never re-awarded
        tick(&mut state, &idle());
        assert_eq!(state.coins, 50);
        assert!(state.treasures.is_empty());
    }

    #[test]
    fn test_combo_expires_during_play() {
        let mut state = standing_state(PlatformKind::Normal);
        state.combo.register_capture(state.time_ms);
        let ticks = COMBO_TIMEOUT_MS / FRAME_MS + 2;
        for _ in 0..ticks {
            tick(&mut state, &idle());
        }
        assert_eq!(state.combo.count, 0);
    }

    #[test]
    fn test_camera_keeps_floor_visible() {
        let mut state = standing_state(PlatformKind::Normal);
        tick(&mut state, &idle());
        assert!(state.camera_y <= state.viewport.floor_top());
        state.player.pos.y = -3000.0;
        state.player.vel.y = 0.0;
        tick(&mut state, &idle());
        assert!(state.camera_y < 0.0);
    }

    #[test]
    fn test_determinism() {
        let mut state1 = GameState::new(99999, Viewport::default());
        let mut state2 = GameState::new(99999, Viewport::default());
        let inputs = [
            TickInput {
                right: true,
                ..Default::default()
            },
            TickInput {
                up: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for i in 0..600 {
            let input = &inputs[i % inputs.len()];
            tick(&mut state1, input);
            tick(&mut state2, input);
        }
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.player.pos, state2.player.pos);
        assert_eq!(state1.platforms.len(), state2.platforms.len());
        assert_eq!(state1.cursor.count, state2.cursor.count);
    }
}
