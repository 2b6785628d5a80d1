//! Game state and core simulation types
//!
//! Everything a session owns lives in [`GameState`]; the tick functions take it
//! by `&mut` and nothing else is global.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::session::DeferredReset;
use crate::consts::*;
use crate::settings::{Difficulty, Settings};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Active gameplay
    Playing,
    /// Session ended, waiting for the reset delay or any input
    Resetting,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndCause {
    Floor,
    Monster,
}

/// Playfield dimensions in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Y of the floor's top edge
    pub fn floor_top(&self) -> f32 {
        self.height - FLOOR_HEIGHT
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(480.0, 800.0)
    }
}

/// The player square
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// True while airborne; cleared on landing
    pub jumping: bool,
    /// Remaining ticks of monster immunity
    pub invincible_ticks: u32,
}

impl Player {
    /// Create a resting player centred horizontally and vertically in the viewport
    pub fn centered(viewport: &Viewport) -> Self {
        Self {
            pos: Vec2::new(
                viewport.width / 2.0 - PLAYER_SIZE / 2.0,
                viewport.height / 2.0 - PLAYER_SIZE / 2.0,
            ),
            vel: Vec2::ZERO,
            size: PLAYER_SIZE,
            jumping: false,
            invincible_ticks: 0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, Vec2::splat(self.size))
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size / 2.0)
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_ticks > 0
    }
}

/// Altitude tier past which treasure weights stop shifting
pub const MAX_TREASURE_TIER: u32 = 5;

/// Platform types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlatformKind {
    #[default]
    Normal,
    Bonus,
    Golden,
    /// Rest point every `BED_INTERVAL` platforms
    Bed,
    /// Wide platform hosting a patrolling monster
    Monster,
    /// Ground; touching it ends the session
    Floor,
}

impl PlatformKind {
    /// Width range (min, max) for generated platforms of this kind
    pub fn width_range(&self) -> (f32, f32) {
        match self {
            PlatformKind::Normal => (80.0, 120.0),
            PlatformKind::Monster => (160.0, 200.0),
            _ => (100.0, 150.0),
        }
    }

    /// Hex color used by the presentation layer
    pub fn color(&self) -> &'static str {
        match self {
            PlatformKind::Normal => "#2ecc71",
            PlatformKind::Bonus => "#87CEEB",
            PlatformKind::Golden => "#FFD700",
            PlatformKind::Bed => "#FF69B4",
            PlatformKind::Monster => "#8e44ad",
            PlatformKind::Floor => "#8B4513",
        }
    }
}

/// A platform entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub kind: PlatformKind,
}

impl Platform {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, Vec2::new(self.width, self.height))
    }

    pub fn top_center(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.width / 2.0, self.pos.y)
    }

    pub fn is_floor(&self) -> bool {
        self.kind == PlatformKind::Floor
    }
}

/// Treasure tiers, cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreasureKind {
    Coin,
    Gem,
    Crown,
    Chest,
}

impl TreasureKind {
    pub const ALL: [TreasureKind; 4] = [
        TreasureKind::Coin,
        TreasureKind::Gem,
        TreasureKind::Crown,
        TreasureKind::Chest,
    ];

    /// Base coin value before the combo multiplier
    pub fn value(&self) -> u64 {
        match self {
            TreasureKind::Coin => 10,
            TreasureKind::Gem => 25,
            TreasureKind::Crown => 50,
            TreasureKind::Chest => 100,
        }
    }

    /// Pickup radius
    pub fn radius(&self) -> f32 {
        match self {
            TreasureKind::Coin => 10.0,
            TreasureKind::Gem => 12.0,
            TreasureKind::Crown => 14.0,
            TreasureKind::Chest => 16.0,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            TreasureKind::Coin => '●',
            TreasureKind::Gem => '◆',
            TreasureKind::Crown => '♛',
            TreasureKind::Chest => '▣',
        }
    }

    /// Spawn weight at a given altitude tier (higher tiers favour rarer loot)
    pub fn weight_at(&self, tier: u32) -> u32 {
        let tier = tier.min(MAX_TREASURE_TIER);
        match self {
            TreasureKind::Coin => 60 - 8 * tier,
            TreasureKind::Gem => 25 + 3 * tier,
            TreasureKind::Crown => 10 + 3 * tier,
            TreasureKind::Chest => 5 + 2 * tier,
        }
    }
}

/// A collectible floating above a platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treasure {
    pub id: u32,
    pub platform_id: u32,
    pub kind: TreasureKind,
    /// Resting center
    pub base_pos: Vec2,
    /// Current float animation offset (y)
    pub float_offset: f32,
    pub collected: bool,
}

impl Treasure {
    pub fn pos(&self) -> Vec2 {
        self.base_pos + Vec2::new(0.0, self.float_offset)
    }
}

/// A patrolling hazard anchored to a platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub id: u32,
    pub platform_id: u32,
    /// Current center
    pub pos: Vec2,
    /// Anchor center on its platform
    pub home: Vec2,
    /// Horizontal offset from `home`
    pub offset: f32,
    /// Patrol direction (+1 right, -1 left)
    pub direction: f32,
    pub angry: bool,
    pub anger_ticks: u32,
    pub size: f32,
}

impl Monster {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(
            self.pos - Vec2::splat(self.size / 2.0),
            Vec2::splat(self.size),
        )
    }
}

/// Consecutive treasure captures
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Combo {
    pub count: u32,
    /// Session time (ms) of the most recent capture
    pub last_capture_ms: Option<u64>,
}

/// Trail segment for rendering (player top-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub size: f32,
}

/// Floating "+N" text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePopup {
    pub pos: Vec2,
    pub amount: u64,
    pub age_ms: u64,
}

/// Visual-only effects queued for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Expanding ring around a super jump
    SuperJumpWave { center: Vec2 },
    /// Flash shown when a paid action lacks coins
    CoinWarning { center: Vec2 },
}

/// Gameplay notifications for the host (persistence, audio, HUD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RowsClimbed { rows: u64 },
    PlatformVisited { id: u32, kind: PlatformKind, points: u64 },
    TreasureCollected { kind: TreasureKind, coins: u64, combo: u32 },
    SuperJump { cost: u64 },
    InsufficientCoins { needed: u64, available: u64 },
    MonsterEscape { monster_id: u32 },
    /// Landed on a rest point; the host may offer to save progress
    BedReached { id: u32 },
    NewHighScore { score: u64 },
    SessionEnded { cause: EndCause, score: u64 },
    SessionRestarted,
    CoinsCredited { amount: u64 },
    LevelRegenerated,
}

/// Where the level generator will continue from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorCursor {
    /// Y at which the next platform is placed (the frontier)
    pub frontier_y: f32,
    /// X of the most recently placed platform
    pub last_x: f32,
    /// 1-based index of the most recently generated platform
    pub count: u32,
    /// Platforms generated since the last treasure spawn
    pub pending_treasure_hosts: Vec<u32>,
    pub last_treasure: Option<TreasureKind>,
    /// Index chosen to host the monster in the current layer group
    pub monster_slot: Option<u32>,
}

/// Read-only per-frame view for the draw routine
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FrameSnapshot<'a> {
    pub phase: SessionPhase,
    pub player: &'a Player,
    pub platforms: &'a [Platform],
    pub treasures: &'a [Treasure],
    pub monsters: &'a [Monster],
    pub popups: &'a [ScorePopup],
    pub trail: &'a [TrailPoint],
    pub camera_y: f32,
    pub score: u64,
    pub high_score: u64,
    pub coins: u64,
    pub combo: u32,
}

/// Complete session state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Seed the current RNG stream started from
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub viewport: Viewport,
    pub difficulty: Difficulty,
    pub trail_enabled: bool,
    pub popups_enabled: bool,
    pub phase: SessionPhase,
    pub reset_timer: DeferredReset,
    pub player: Player,
    /// Live platforms, floor first, then ascending by id
    pub platforms: Vec<Platform>,
    pub treasures: Vec<Treasure>,
    pub monsters: Vec<Monster>,
    /// Platform ids already scored this session
    pub visited: BTreeSet<u32>,
    pub score: u64,
    /// Best score seen, survives resets
    pub high_score: u64,
    pub coins: u64,
    pub combo: Combo,
    pub camera_y: f32,
    pub time_ticks: u64,
    pub time_ms: u64,
    pub cursor: GeneratorCursor,
    /// Up input on the previous tick (for jump edge detection)
    pub up_held: bool,
    /// Motion trail, newest first
    pub trail: Vec<TrailPoint>,
    #[serde(skip)]
    pub popups: Vec<ScorePopup>,
    #[serde(skip)]
    pub effects: Vec<Effect>,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new session with the given seed and default settings
    pub fn new(seed: u64, viewport: Viewport) -> Self {
        Self::with_settings(seed, viewport, &Settings::default())
    }

    /// Create a new session honouring the player's settings
    pub fn with_settings(seed: u64, viewport: Viewport, settings: &Settings) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            viewport,
            difficulty: settings.difficulty,
            trail_enabled: settings.trail,
            popups_enabled: settings.show_popups,
            phase: SessionPhase::Playing,
            reset_timer: DeferredReset::default(),
            player: Player::centered(&viewport),
            platforms: Vec::new(),
            treasures: Vec::new(),
            monsters: Vec::new(),
            visited: BTreeSet::new(),
            score: 0,
            high_score: 0,
            coins: 0,
            combo: Combo::default(),
            camera_y: 0.0,
            time_ticks: 0,
            time_ms: 0,
            cursor: GeneratorCursor::default(),
            up_held: false,
            trail: Vec::with_capacity(TRAIL_LENGTH),
            popups: Vec::new(),
            effects: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        };

        state.reset_trail();
        super::generator::populate_level(&mut state);
        log::info!(
            "Session started: seed={} viewport={}x{} difficulty={}",
            seed,
            viewport.width,
            viewport.height,
            state.difficulty.as_str()
        );

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Fill the trail with the player's current position
    pub fn reset_trail(&mut self) {
        self.trail.clear();
        if self.trail_enabled {
            let point = TrailPoint {
                pos: self.player.pos,
                size: self.player.size,
            };
            self.trail.resize(TRAIL_LENGTH, point);
        }
    }

    /// Push the current position to the front of the trail, dropping the oldest
    pub fn record_trail(&mut self) {
        if !self.trail_enabled {
            return;
        }
        self.trail.insert(
            0,
            TrailPoint {
                pos: self.player.pos,
                size: self.player.size,
            },
        );
        self.trail.truncate(TRAIL_LENGTH);
    }

    pub fn platform(&self, id: u32) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    /// Take queued gameplay events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take queued visual effects
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn snapshot(&self) -> FrameSnapshot<'_> {
        FrameSnapshot {
            phase: self.phase,
            player: &self.player,
            platforms: &self.platforms,
            treasures: &self.treasures,
            monsters: &self.monsters,
            popups: &self.popups,
            trail: &self.trail,
            camera_y: self.camera_y,
            score: self.score,
            high_score: self.high_score,
            coins: self.coins,
            combo: self.combo.count,
        }
    }
}
