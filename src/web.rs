//! Browser bindings
//!
//! The page owns the canvas, the animation frame loop and the checkout
//! redirects. It calls into [`WebGame`] once per frame and draws whatever
//! `frame_json` returns.

use std::sync::Once;

use wasm_bindgen::prelude::*;

use crate::host::GameHost;
use crate::settings::Settings;
use crate::sim::{TickInput, Viewport};

static INIT: Once = Once::new();

/// Install the panic hook and console logger (safe to call more than once)
pub fn init_logging() {
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
        }
    });
}

fn js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

#[wasm_bindgen]
pub struct WebGame {
    host: GameHost,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, width: f32, height: f32) -> WebGame {
        init_logging();
        log::info!("Sky Jumper starting...");
        WebGame {
            host: GameHost::new(seed, Viewport::new(width, height)),
        }
    }

    /// Advance one animation frame with the current key state
    pub fn tick(&mut self, left: bool, right: bool, up: bool, super_jump: bool, any_press: bool) {
        let input = TickInput {
            left,
            right,
            up,
            super_jump,
            any_press,
            ..Default::default()
        };
        self.host.step(&input);
    }

    /// Snapshot of the current frame plus the last tick's events and effects
    pub fn frame_json(&self) -> Result<String, JsValue> {
        self.host.frame_json().map_err(js_error)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.host.resize(width, height);
    }

    pub fn settings_json(&self) -> Result<String, JsValue> {
        self.host.settings().to_json().map_err(js_error)
    }

    pub fn set_settings_json(&mut self, json: &str) -> Result<(), JsValue> {
        let settings = Settings::from_json(json).map_err(js_error)?;
        self.host.apply_settings(settings);
        Ok(())
    }

    /// Feed a payment status reply; returns true when coins were credited
    pub fn credit_purchase(&mut self, session_id: &str, status_json: &str) -> Result<bool, JsValue> {
        self.host
            .apply_payment_reply(session_id, status_json)
            .map_err(js_error)
    }
}
