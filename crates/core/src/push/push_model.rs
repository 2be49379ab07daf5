//! Payloads exchanged with the trading-terminal bridge.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::PUSH_TOKEN_LOG_PREFIX;
use crate::trades::TradeSide;

/// One trade pushed by the bridge, authenticated by the connection's push token.
#[derive(Clone, Deserialize)]
pub struct PushTradePayload {
    pub token: String,
    /// Broker-native ticket number.
    pub ticket: i64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub trade_type: String,
    pub lots: Decimal,
    pub open_price: Decimal,
    #[serde(default)]
    pub close_price: Option<Decimal>,
    pub open_time: String,
    #[serde(default)]
    pub close_time: Option<String>,
    pub profit: Decimal,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub swap: Decimal,
    #[serde(default)]
    pub magic: i64,
    #[serde(default)]
    pub comment: String,
}

impl PushTradePayload {
    /// Leading characters of the token, safe to log.
    pub fn token_prefix(&self) -> String {
        self.token.chars().take(PUSH_TOKEN_LOG_PREFIX).collect()
    }
}

impl fmt::Debug for PushTradePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushTradePayload")
            .field("token", &format_args!("{}...", self.token_prefix()))
            .field("ticket", &self.ticket)
            .field("symbol", &self.symbol)
            .field("trade_type", &self.trade_type)
            .field("lots", &self.lots)
            .field("open_time", &self.open_time)
            .field("close_time", &self.close_time)
            .field("profit", &self.profit)
            .finish_non_exhaustive()
    }
}

/// Result of a push. A duplicate is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum PushOutcome {
    #[serde(rename = "ok")]
    Recorded {
        connection_id: String,
        trade_id: String,
        symbol: String,
        side: TradeSide,
        pnl: Decimal,
    },
    #[serde(rename = "duplicate")]
    Duplicate {
        connection_id: String,
        external_trade_id: String,
    },
}

impl PushOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, PushOutcome::Duplicate { .. })
    }
}
