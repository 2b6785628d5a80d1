//! Coin purchases
//!
//! The checkout itself runs on a hosted payment page behind a small HTTP
//! service. This side only reads that service's JSON replies and credits the
//! session once per completed checkout.

use std::collections::BTreeSet;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::sim::GameState;
use crate::sim::scoring::credit_coins;

/// Coins granted by one completed purchase
pub const PURCHASE_COINS: u64 = 1000;

/// Reply to "create checkout session"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
}

/// Payment state reported by the status check or webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Complete,
    Pending,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply<T> {
    Ok(T),
    Failed { error: String },
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: PaymentStatus,
}

fn parse_reply<T: for<'de> Deserialize<'de>>(json: &str) -> anyhow::Result<T> {
    let reply: Reply<T> = serde_json::from_str(json).context("malformed payment reply")?;
    match reply {
        Reply::Ok(body) => Ok(body),
        Reply::Failed { error } => bail!("payment provider error: {error}"),
    }
}

/// Parse the checkout-session reply
pub fn parse_checkout_session(json: &str) -> anyhow::Result<CheckoutSession> {
    let session: CheckoutSession = parse_reply(json)?;
    if session.id.trim().is_empty() {
        bail!("checkout session has an empty id");
    }
    Ok(session)
}

/// Parse a status-check reply
pub fn parse_status(json: &str) -> anyhow::Result<PaymentStatus> {
    parse_reply::<StatusBody>(json).map(|body| body.status)
}

/// Remembers which checkout sessions were already credited
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseLedger {
    credited: BTreeSet<String>,
}

impl PurchaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_credited(&self, session_id: &str) -> bool {
        self.credited.contains(session_id)
    }

    /// Credit a completed checkout. Returns true only the first time a session completes.
    pub fn apply(&mut self, state: &mut GameState, session_id: &str, status: PaymentStatus) -> bool {
        if status != PaymentStatus::Complete {
            log::debug!("Checkout {session_id} still pending");
            return false;
        }
        if !self.credited.insert(session_id.to_string()) {
            log::warn!("Checkout {session_id} already credited, ignoring");
            return false;
        }
        credit_coins(state, PURCHASE_COINS);
        true
    }

    /// Parse a status reply and credit it. Errors leave the game state untouched.
    pub fn apply_reply(
        &mut self,
        state: &mut GameState,
        session_id: &str,
        json: &str,
    ) -> anyhow::Result<bool> {
        let status = parse_status(json).with_context(|| format!("checkout {session_id}"))?;
        Ok(self.apply(state, session_id, status))
    }
}
