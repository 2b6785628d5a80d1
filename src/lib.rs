//! Sky Jumper - An endless vertical platform jumper
//!
//! Core modules:
//! - `sim`: Deterministic simulation (level generation, physics, scoring, session lifecycle)
//! - `highscores`: Persisted best score
//! - `settings`: Player preferences (difficulty, visual toggles)
//! - `payment`: Crediting purchased coins from checkout status reports
//! - `host`: Session driver tying the simulation to storage and payments
//! - `web`: Browser bindings (wasm32 only)

pub mod highscores;
pub mod host;
pub mod payment;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::HighScore;
pub use host::GameHost;
pub use settings::{Difficulty, Settings};

/// Game configuration constants
pub mod consts {
    /// Downward acceleration per tick
    pub const GRAVITY: f32 = 0.25;
    /// Vertical velocity applied on jump (negative = up)
    pub const JUMP_FORCE: f32 = -8.0;
    /// Jump impulse multiplier for a paid super jump
    pub const SUPER_JUMP_MULTIPLIER: f32 = 3.0;
    /// Coins spent per super jump
    pub const SUPER_JUMP_COST: u64 = 100;
    /// Horizontal speed while a direction is held
    pub const MOVEMENT_SPEED: f32 = 3.5;

    /// Player square edge length
    pub const PLAYER_SIZE: f32 = 50.0;
    /// Platform thickness, also the height of one scoring row
    pub const PLATFORM_HEIGHT: f32 = 20.0;
    pub const ROW_HEIGHT: f32 = PLATFORM_HEIGHT;
    pub const FLOOR_HEIGHT: f32 = 40.0;

    /// Motion trail segments kept (newest first)
    pub const TRAIL_LENGTH: usize = 10;
    /// Distance kept generated ahead of (and retained behind) the player
    pub const VIEWPORT_PADDING: f32 = 200.0;

    /// Milliseconds per simulation tick (one tick = one animation frame)
    pub const FRAME_MS: u64 = 16;
    /// Delay before an ended session restarts on its own
    pub const RESET_DELAY_MS: u64 = 2000;
    pub const SCORE_POPUP_DURATION_MS: u64 = 1000;

    /// Every Nth generated platform is a bed (rest point)
    pub const BED_INTERVAL: u32 = 20;
    /// Every Nth generated platform is golden
    pub const GOLDEN_INTERVAL: u32 = 10;
    pub const BONUS_CHANCE: f32 = 0.15;

    /// Highest point reachable by a normal jump: j² / 2g
    pub const MAX_JUMP_HEIGHT: f32 = JUMP_FORCE * JUMP_FORCE / (2.0 * GRAVITY);
    /// Horizontal travel over a full jump arc: s · 2|j| / g
    pub const MAX_JUMP_DISTANCE: f32 = MOVEMENT_SPEED * (-2.0 * JUMP_FORCE / GRAVITY);

    /// Hard ceilings on generated gaps, whatever the jump physics allow
    pub const GAP_Y_CAP: f32 = 120.0;
    pub const GAP_X_CAP: f32 = 200.0;

    pub const MIN_GAP_Y: f32 = 60.0;
    pub const MAX_GAP_Y: f32 = min_f32(GAP_Y_CAP, MAX_JUMP_HEIGHT * 0.8);
    pub const MIN_GAP_X: f32 = 50.0;
    pub const MAX_GAP_X: f32 = min_f32(GAP_X_CAP, MAX_JUMP_DISTANCE * 0.7);

    /// Landing tolerance below a platform top, on top of the fall distance
    pub const LANDING_SLACK: f32 = 5.0;

    /// Treasure captures closer together than this extend the combo
    pub const COMBO_TIMEOUT_MS: u64 = 2000;
    /// Ticks of invincibility granted by a monster escape
    pub const INVINCIBILITY_TICKS: u32 = 90;

    const fn min_f32(a: f32, b: f32) -> f32 {
        if a < b { a } else { b }
    }
}
