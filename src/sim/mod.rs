//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per animation frame
//! - Seeded RNG only
//! - Stable iteration order (platforms by generation order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod generator;
pub mod scoring;
pub mod session;
pub mod state;
pub mod tick;

pub use collision::{Aabb, lands_on, within_reach};
pub use generator::{JumpEnvelope, extend_level, populate_level, resize, select_kind};
pub use scoring::{combo_multiplier, credit_coins, platform_score};
pub use session::{DeferredReset, begin_reset, reinitialize};
pub use state::{
    Combo, Effect, EndCause, FrameSnapshot, GameEvent, GameState, Monster, Platform,
    PlatformKind, Player, ScorePopup, SessionPhase, Treasure, TreasureKind, Viewport,
};
pub use tick::{TickInput, tick};
