//! Procedural level generation
//!
//! Platforms are placed upward from the floor so that every consecutive pair
//! stays inside the player's jump envelope. Generation is incremental: each
//! tick trims what fell behind and extends the frontier ahead of the player.

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;

use super::state::{
    GameEvent, GameState, MAX_TREASURE_TIER, Monster, Platform, PlatformKind, Treasure,
    TreasureKind, Viewport,
};
use crate::consts::*;

/// Generated platforms per monster layer group
pub const MONSTER_GROUP_SIZE: u32 = 15;
/// First platform index eligible for a monster (the opening stretch is safe)
pub const MONSTER_START_INDEX: u32 = MONSTER_GROUP_SIZE + 1;
pub const MONSTER_SIZE: f32 = 30.0;
/// Altitude per treasure tier step
pub const TREASURE_ALTITUDE_STEP: f32 = 2000.0;
/// Treasure hover height above its platform's top edge
pub const TREASURE_HOVER: f32 = 30.0;

/// Displacements reachable from a single jump
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpEnvelope {
    /// j² / 2g
    pub max_height: f32,
    /// Horizontal travel over a full up-and-down arc: s · 2|j| / g
    pub max_distance: f32,
    pub min_gap_y: f32,
    pub max_gap_y: f32,
    pub min_gap_x: f32,
    pub max_gap_x: f32,
}

impl JumpEnvelope {
    pub fn from_physics(gravity: f32, impulse: f32, speed: f32) -> Self {
        let max_height = impulse * impulse / (2.0 * gravity);
        let max_distance = speed * (2.0 * impulse.abs() / gravity);
        Self {
            max_height,
            max_distance,
            min_gap_y: MIN_GAP_Y,
            max_gap_y: GAP_Y_CAP.min(max_height * 0.8),
            min_gap_x: MIN_GAP_X,
            max_gap_x: GAP_X_CAP.min(max_distance * 0.7),
        }
    }

    /// Envelope for the game's own physics constants
    pub fn standard() -> Self {
        Self::from_physics(GRAVITY, JUMP_FORCE, MOVEMENT_SPEED)
    }

    /// Largest vertical gap allowed after a horizontal move of `horizontal`.
    ///
    /// Shrinks linearly as the horizontal jump gets harder, never below the
    /// minimum gap.
    pub fn max_vertical_gap(&self, horizontal: f32) -> f32 {
        (self.max_gap_y * (1.0 - horizontal / self.max_distance)).max(self.min_gap_y)
    }
}

/// Inputs to the platform type decision table
#[derive(Debug, Clone, Copy)]
struct KindContext {
    /// 1-based generation index
    index: u32,
    monster_slot: bool,
    /// Uniform draw in [0, 1)
    roll: f32,
}

type KindRule = (fn(&KindContext) -> bool, PlatformKind);

/// Evaluated top to bottom, first match wins
const KIND_RULES: [KindRule; 5] = [
    (|c| c.index % BED_INTERVAL == 0, PlatformKind::Bed),
    (|c| c.index % GOLDEN_INTERVAL == 0, PlatformKind::Golden),
    (|c| c.monster_slot, PlatformKind::Monster),
    (|c| c.roll < BONUS_CHANCE, PlatformKind::Bonus),
    (|_| true, PlatformKind::Normal),
];

/// Pick the platform type for generation index `index`
pub fn select_kind(index: u32, monster_slot: bool, roll: f32) -> PlatformKind {
    let ctx = KindContext {
        index,
        monster_slot,
        roll,
    };
    KIND_RULES
        .iter()
        .find(|(matches, _)| matches(&ctx))
        .map(|(_, kind)| *kind)
        .unwrap_or_default()
}

/// Whether `index` is reserved for a bed or golden platform
fn is_fixed_index(index: u32) -> bool {
    index % BED_INTERVAL == 0 || index % GOLDEN_INTERVAL == 0
}

/// Choose the one index in a layer group that hosts a monster
fn choose_monster_slot<R: Rng>(rng: &mut R, group_start: u32) -> Option<u32> {
    let candidates: Vec<u32> = (group_start..group_start + MONSTER_GROUP_SIZE)
        .filter(|&n| !is_fixed_index(n))
        .collect();
    candidates.choose(rng).copied()
}

/// Weighted treasure tier draw, never repeating `previous` when avoidable
pub fn pick_treasure_kind<R: Rng>(
    rng: &mut R,
    altitude: f32,
    previous: Option<TreasureKind>,
) -> TreasureKind {
    let tier = ((altitude.max(0.0) / TREASURE_ALTITUDE_STEP) as u32).min(MAX_TREASURE_TIER);

    let mut pool: Vec<TreasureKind> = TreasureKind::ALL
        .into_iter()
        .filter(|k| Some(*k) != previous)
        .collect();
    if pool.is_empty() {
        pool = TreasureKind::ALL.to_vec();
    }

    match WeightedIndex::new(pool.iter().map(|k| k.weight_at(tier))) {
        Ok(dist) => pool[dist.sample(rng)],
        Err(e) => {
            log::warn!("Treasure weights rejected ({e}), falling back to coin");
            TreasureKind::Coin
        }
    }
}

/// Rebuild the level from scratch: floor plus platforms up past the top of the viewport
pub fn populate_level(state: &mut GameState) {
    state.platforms.clear();
    state.treasures.clear();
    state.monsters.clear();
    state.visited.clear();

    let viewport = state.viewport;
    let floor_id = state.next_entity_id();
    state.platforms.push(Platform {
        id: floor_id,
        pos: Vec2::new(0.0, viewport.floor_top()),
        width: viewport.width,
        height: FLOOR_HEIGHT,
        kind: PlatformKind::Floor,
    });

    state.cursor = Default::default();
    state.cursor.frontier_y = viewport.floor_top() - MIN_GAP_Y;
    state.cursor.last_x = viewport.width / 2.0;

    while state.cursor.frontier_y > -VIEWPORT_PADDING {
        place_next(state);
    }

    log::debug!(
        "Level populated: {} platforms, frontier at {:.1}",
        state.platforms.len(),
        state.cursor.frontier_y
    );
}

/// Trim platforms far below the player and extend the frontier above them
pub fn extend_level(state: &mut GameState) {
    let cutoff = state.player.pos.y + state.viewport.height + VIEWPORT_PADDING;
    state
        .platforms
        .retain(|p| p.is_floor() || p.pos.y < cutoff);

    let platforms = &state.platforms;
    state
        .treasures
        .retain(|t| !t.collected && platforms.iter().any(|p| p.id == t.platform_id));
    state
        .monsters
        .retain(|m| platforms.iter().any(|p| p.id == m.platform_id));
    state
        .cursor
        .pending_treasure_hosts
        .retain(|id| platforms.iter().any(|p| p.id == *id));

    let target = state.player.pos.y - VIEWPORT_PADDING;
    while state.cursor.frontier_y > target {
        place_next(state);
    }
}

/// Regenerate the level for a new viewport size
pub fn resize(state: &mut GameState, viewport: Viewport) {
    log::info!(
        "Viewport resized {}x{} -> {}x{}, regenerating level",
        state.viewport.width,
        state.viewport.height,
        viewport.width,
        viewport.height
    );
    state.viewport = viewport;
    populate_level(state);
    state.events.push(GameEvent::LevelRegenerated);
}

/// Place one platform at the frontier and advance the cursor
fn place_next(state: &mut GameState) {
    let envelope = JumpEnvelope::standard();
    let viewport = state.viewport;

    state.cursor.count += 1;
    let index = state.cursor.count;

    if index >= MONSTER_START_INDEX && (index - MONSTER_START_INDEX) % MONSTER_GROUP_SIZE == 0 {
        state.cursor.monster_slot = choose_monster_slot(&mut state.rng, index);
    }
    let monster_slot = state.cursor.monster_slot == Some(index);

    // Always consumed so the stream does not depend on the modulo rules
    let roll: f32 = state.rng.random();
    let kind = select_kind(index, monster_slot, roll);

    let (min_w, max_w) = kind.width_range();
    let width = state.rng.random_range(min_w..max_w);

    let offset = state
        .rng
        .random_range(envelope.min_gap_x..=envelope.max_gap_x);
    let last_x = state.cursor.last_x;
    let target_x = if state.rng.random_bool(0.5) {
        last_x + offset
    } else {
        last_x - offset
    };
    // Keep a border margin on both sides; narrow fields pin to the left border
    let right_limit = (viewport.width - width - MIN_GAP_X).max(MIN_GAP_X);
    let x = target_x.clamp(MIN_GAP_X, right_limit);

    let horizontal = (x - last_x).abs();
    let max_vertical = envelope.max_vertical_gap(horizontal);
    let gap = envelope.min_gap_y + state.rng.random::<f32>() * (max_vertical - envelope.min_gap_y);

    let id = state.next_entity_id();
    let platform = Platform {
        id,
        pos: Vec2::new(x, state.cursor.frontier_y),
        width,
        height: PLATFORM_HEIGHT,
        kind,
    };
    log::trace!("Platform #{index} {kind:?} at ({x:.1}, {:.1})", platform.pos.y);

    if kind == PlatformKind::Monster {
        spawn_monster(state, &platform);
    }
    state.platforms.push(platform);
    state.cursor.pending_treasure_hosts.push(id);
    maybe_spawn_treasure(state);

    state.cursor.last_x = x;
    state.cursor.frontier_y -= gap;
}

fn spawn_monster(state: &mut GameState, platform: &Platform) {
    let home = platform.top_center() - Vec2::new(0.0, MONSTER_SIZE / 2.0);
    let direction = if state.rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let id = state.next_entity_id();
    state.monsters.push(Monster {
        id,
        platform_id: platform.id,
        pos: home,
        home,
        offset: 0.0,
        direction,
        angry: false,
        anger_ticks: 0,
        size: MONSTER_SIZE,
    });
}

/// Once enough platforms are pending, attach a treasure to one of them
fn maybe_spawn_treasure(state: &mut GameState) {
    let interval = state.difficulty.treasure_interval() as usize;
    if state.cursor.pending_treasure_hosts.len() < interval {
        return;
    }

    let hosts = std::mem::take(&mut state.cursor.pending_treasure_hosts);
    let Some(&host_id) = hosts.choose(&mut state.rng) else {
        return;
    };
    let Some(anchor) = state.platform(host_id).map(|p| p.top_center()) else {
        return;
    };

    let altitude = state.viewport.floor_top() - anchor.y;
    let kind = pick_treasure_kind(&mut state.rng, altitude, state.cursor.last_treasure);
    state.cursor.last_treasure = Some(kind);

    let id = state.next_entity_id();
    state.treasures.push(Treasure {
        id,
        platform_id: host_id,
        kind,
        base_pos: anchor - Vec2::new(0.0, TREASURE_HOVER),
        float_offset: 0.0,
        collected: false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Difficulty, Settings};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn climbable(platforms: &[Platform]) -> Vec<&Platform> {
        platforms.iter().filter(|p| !p.is_floor()).collect()
    }

    #[test]
    fn test_envelope_matches_constants() {
        let env = JumpEnvelope::standard();
        assert!((env.max_height - 128.0).abs() < 1e-3);
        assert!((env.max_distance - 224.0).abs() < 1e-3);
        assert!((env.max_gap_y - MAX_GAP_Y).abs() < 1e-3);
        assert!((env.max_gap_x - MAX_GAP_X).abs() < 1e-3);
        assert!(env.max_gap_y <= env.max_height * 0.8 + 1e-3);
    }

    #[test]
    fn test_strong_physics_hits_gap_caps() {
        let env = JumpEnvelope::from_physics(GRAVITY, JUMP_FORCE * 3.0, MOVEMENT_SPEED * 2.0);
        assert_eq!(env.max_gap_y, GAP_Y_CAP);
        assert_eq!(env.max_gap_x, GAP_X_CAP);
    }

    #[test]
    fn test_vertical_gap_shrinks_with_horizontal_offset() {
        let env = JumpEnvelope::standard();
        assert!(env.max_vertical_gap(0.0) > env.max_vertical_gap(100.0));
        assert_eq!(env.max_vertical_gap(env.max_distance), env.min_gap_y);
    }

    #[test]
    fn test_kind_table_priority() {
        assert_eq!(select_kind(20, true, 0.0), PlatformKind::Bed);
        assert_eq!(select_kind(40, false, 0.99), PlatformKind::Bed);
        assert_eq!(select_kind(10, true, 0.0), PlatformKind::Golden);
        assert_eq!(select_kind(30, false, 0.0), PlatformKind::Golden);
        assert_eq!(select_kind(7, true, 0.0), PlatformKind::Monster);
        assert_eq!(select_kind(7, false, 0.1), PlatformKind::Bonus);
        assert_eq!(select_kind(7, false, 0.15), PlatformKind::Normal);
    }

    #[test]
    fn test_monster_slot_avoids_fixed_indices() {
        let mut rng = Pcg32::seed_from_u64(1);
        for group in 0..50 {
            let start = MONSTER_START_INDEX + group * MONSTER_GROUP_SIZE;
            let slot = choose_monster_slot(&mut rng, start).expect("slot");
            assert!((start..start + MONSTER_GROUP_SIZE).contains(&slot));
            assert!(!is_fixed_index(slot));
        }
    }

    #[test]
    fn test_treasure_kind_never_repeats() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut previous = None;
        for i in 0..200 {
            let kind = pick_treasure_kind(&mut rng, i as f32 * 100.0, previous);
            assert_ne!(Some(kind), previous);
            previous = Some(kind);
        }
    }

    #[test]
    fn test_high_altitude_favours_rare_treasure() {
        let count_chests = |altitude: f32| {
            let mut rng = Pcg32::seed_from_u64(42);
            (0..2000)
                .filter(|_| pick_treasure_kind(&mut rng, altitude, None) == TreasureKind::Chest)
                .count()
        };
        assert!(count_chests(20_000.0) > count_chests(0.0));
    }

    #[test]
    fn test_one_monster_per_layer_group() {
        let mut state = GameState::new(77, Viewport::new(480.0, 800.0));
        // Climb far enough to cover several groups
        for step in 0..400 {
            state.player.pos.y = -(step as f32) * 50.0;
            extend_level(&mut state);
            let monster_platforms = state
                .platforms
                .iter()
                .filter(|p| p.kind == PlatformKind::Monster)
                .count();
            assert_eq!(monster_platforms, state.monsters.len());
        }
        assert!(state.cursor.count > MONSTER_START_INDEX + 3 * MONSTER_GROUP_SIZE);
    }

    #[test]
    fn test_monster_indices_one_per_group() {
        // Run the generator far and record which indices became monster platforms
        let mut state = GameState::new(5, Viewport::new(480.0, 800.0));
        let mut seen = std::collections::BTreeMap::new();
        for step in 0..600 {
            state.player.pos.y = -(step as f32) * 40.0;
            extend_level(&mut state);
            for m in &state.monsters {
                seen.insert(m.platform_id, ());
            }
        }
        let groups = (state.cursor.count - MONSTER_START_INDEX + 1) / MONSTER_GROUP_SIZE;
        // Every completed group contributed exactly one monster
        assert!(seen.len() as u32 >= groups);
        assert!(seen.len() as u32 <= groups + 1);
    }

    #[test]
    fn test_extend_trims_behind_and_fills_ahead() {
        let mut state = GameState::new(3, Viewport::default());
        state.player.pos.y = -5000.0;
        extend_level(&mut state);
        let cutoff = state.player.pos.y + state.viewport.height + VIEWPORT_PADDING;
        assert!(state.platforms.iter().all(|p| p.is_floor() || p.pos.y < cutoff));
        assert!(state.cursor.frontier_y <= state.player.pos.y - VIEWPORT_PADDING);
        assert!(state.platforms[0].is_floor());
        for t in &state.treasures {
            assert!(state.platform(t.platform_id).is_some());
        }
    }

    #[test]
    fn test_treasure_interval_follows_difficulty() {
        for (difficulty, interval) in [
            (Difficulty::Easy, 1),
            (Difficulty::Normal, 3),
            (Difficulty::Hard, 5),
        ] {
            let settings = Settings {
                difficulty,
                ..Default::default()
            };
            let state = GameState::with_settings(21, Viewport::default(), &settings);
            let generated = state.cursor.count as usize;
            assert_eq!(state.treasures.len(), generated / interval);
        }
    }

    #[test]
    fn test_resize_regenerates_for_new_width() {
        let mut state = GameState::new(8, Viewport::new(480.0, 800.0));
        state.visited.insert(2);
        resize(&mut state, Viewport::new(1000.0, 600.0));
        assert!(state.visited.is_empty());
        assert_eq!(state.platforms[0].width, 1000.0);
        assert_eq!(state.platforms[0].pos.y, 600.0 - FLOOR_HEIGHT);
        assert!(state.drain_events().contains(&GameEvent::LevelRegenerated));
    }

    proptest! {
        #[test]
        fn prop_consecutive_platforms_reachable(seed in any::<u64>(), width in 360.0f32..1400.0, height in 500.0f32..1200.0) {
            let mut state = GameState::new(seed, Viewport::new(width, height));
            state.player.pos.y = -3000.0;
            extend_level(&mut state);
            let env = JumpEnvelope::standard();
            let platforms = climbable(&state.platforms);
            for pair in platforms.windows(2) {
                let dx = pair[1].pos.x - pair[0].pos.x;
                let dy = pair[0].pos.y - pair[1].pos.y;
                prop_assert!(dx.abs() <= env.max_gap_x + 1e-3, "dx {} too wide", dx);
                prop_assert!(dx.abs() <= env.max_distance);
                prop_assert!(dy >= env.min_gap_y - 1e-3, "dy {} too small", dy);
                prop_assert!(dy <= env.max_gap_y + 1e-3, "dy {} too tall", dy);
                prop_assert!(dy <= env.max_vertical_gap(dx.abs()) + 1e-3);
                prop_assert!(dy <= env.max_height);
            }
        }

        #[test]
        fn prop_kind_is_fixed_by_index(index in 1u32..10_000, roll in 0.0f32..1.0) {
            let kind = select_kind(index, false, roll);
            if index % BED_INTERVAL == 0 {
                prop_assert_eq!(kind, PlatformKind::Bed);
            } else if index % GOLDEN_INTERVAL == 0 {
                prop_assert_eq!(kind, PlatformKind::Golden);
            } else {
                prop_assert!(matches!(kind, PlatformKind::Bonus | PlatformKind::Normal));
            }
        }
    }
}
