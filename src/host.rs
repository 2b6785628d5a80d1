//! Session host
//!
//! Owns a [`GameState`] together with everything around it that is not
//! simulation: persisted settings and high score, the purchase ledger, and the
//! events and effects produced by the last tick. Both the browser bindings and
//! the native runner drive the game through this.

use serde::Serialize;

use crate::payment::PurchaseLedger;
use crate::sim::{Effect, FrameSnapshot, GameEvent, GameState, TickInput, Viewport, resize, tick};
use crate::{HighScore, Settings};

/// Everything the draw routine needs for one frame
#[derive(Debug, Serialize)]
pub struct Frame<'a> {
    #[serde(flatten)]
    pub snapshot: FrameSnapshot<'a>,
    pub events: &'a [GameEvent],
    pub effects: &'a [Effect],
}

pub struct GameHost {
    pub state: GameState,
    settings: Settings,
    high_score: HighScore,
    ledger: PurchaseLedger,
    events: Vec<GameEvent>,
    effects: Vec<Effect>,
}

impl GameHost {
    /// Start a session using stored settings and high score
    pub fn new(seed: u64, viewport: Viewport) -> Self {
        Self::with_storage(seed, viewport, Settings::load(), HighScore::load())
    }

    /// Start a session from already-loaded settings and high score
    pub fn with_storage(
        seed: u64,
        viewport: Viewport,
        settings: Settings,
        high_score: HighScore,
    ) -> Self {
        let mut state = GameState::with_settings(seed, viewport, &settings);
        state.high_score = high_score.best;
        Self {
            state,
            settings,
            high_score,
            ledger: PurchaseLedger::new(),
            events: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn high_score(&self) -> HighScore {
        self.high_score
    }

    /// Events produced by the last step
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Advance one frame and persist a new best score if one was reached
    pub fn step(&mut self, input: &TickInput) {
        tick(&mut self.state, input);
        self.events = self.state.drain_events();
        self.effects = self.state.drain_effects();

        let best = self.events.iter().fold(None, |best, event| match event {
            GameEvent::NewHighScore { score } => Some(*score),
            _ => best,
        });
        if let Some(score) = best {
            if self.high_score.record(score) {
                self.high_score.save();
            }
        }
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame {
            snapshot: self.state.snapshot(),
            events: &self.events,
            effects: &self.effects,
        }
    }

    pub fn frame_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(&self.frame())?)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        resize(&mut self.state, Viewport::new(width, height));
    }

    /// Replace the settings and save them. Difficulty applies to platforms generated from now on.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.state.difficulty = settings.difficulty;
        self.state.popups_enabled = settings.show_popups;
        if self.state.trail_enabled != settings.trail {
            self.state.trail_enabled = settings.trail;
            self.state.reset_trail();
        }
        settings.save();
        self.settings = settings;
    }

    /// Credit a checkout from its status reply
    pub fn apply_payment_reply(&mut self, session_id: &str, json: &str) -> anyhow::Result<bool> {
        self.ledger.apply_reply(&mut self.state, session_id, json)
    }
}
