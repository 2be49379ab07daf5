//! Push module - token-authenticated ingestion from the trading-terminal bridge.

mod push_diagnostics;
mod push_model;
mod push_service;


pub use push_diagnostics::{PushDiagnostics, PushDiagnosticsService, TradeDigest, PUSH_TRADE_PATH};
pub use push_model::{PushOutcome, PushTradePayload};
pub use push_service::{PushIngestionService, PushIngestionServiceTrait};
