//! Canonical trade record shared by every ingestion path.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::connections::ProviderKind;
use crate::errors::Error;

/// Direction of a trade.
///
/// Unknown tokens from CSV exports are kept verbatim (lower-cased) in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TradeSide {
    Buy,
    Sell,
    Other(String),
}

impl TradeSide {
    /// Maps free-text side tokens onto buy/sell, passing anything else through lower-cased.
    pub fn normalize(raw: &str) -> Self {
        let token = raw.trim().to_lowercase();
        match token.as_str() {
            "buy" | "long" | "b" => TradeSide::Buy,
            "sell" | "short" | "s" => TradeSide::Sell,
            _ => TradeSide::Other(token),
        }
    }

    /// Buy-like tokens map to buy, everything else to sell.
    pub fn buy_or_sell(raw: &str) -> Self {
        match Self::normalize(raw) {
            TradeSide::Buy => TradeSide::Buy,
            _ => TradeSide::Sell,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
            TradeSide::Other(value) => value.as_str(),
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TradeSide {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TradeSide {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TradeSide::normalize(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

impl TradeStatus {
    /// A trade is closed exactly when it has a close time.
    pub fn for_close_time(close_time: Option<&DateTime<Utc>>) -> Self {
        if close_time.is_some() {
            TradeStatus::Closed
        } else {
            TradeStatus::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }
}

impl FromStr for TradeStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(TradeStatus::Open),
            "closed" => Ok(TradeStatus::Closed),
            other => Err(Error::Validation(
                crate::errors::ValidationError::InvalidInput(format!(
                    "Unknown trade status '{other}'"
                )),
            )),
        }
    }
}

/// Which ingestion path produced a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeSource {
    Csv,
    /// The trading-terminal bridge (expert advisor) push path.
    Ea,
    Provider(ProviderKind),
}

impl TradeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSource::Csv => "csv",
            TradeSource::Ea => "ea",
            TradeSource::Provider(kind) => kind.as_str(),
        }
    }
}

impl fmt::Display for TradeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(TradeSource::Csv),
            "ea" => Ok(TradeSource::Ea),
            other => ProviderKind::from_str(other).map(TradeSource::Provider),
        }
    }
}

impl Serialize for TradeSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TradeSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TradeSource::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Provider-specific extras attached to a trade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magic: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TradeMetadata {
    pub fn is_empty(&self) -> bool {
        self.magic.is_none() && self.comment.is_none() && self.extra.is_empty()
    }
}

/// One executed position, closed or still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub connection_id: String,
    pub owner_id: String,
    pub provider: ProviderKind,
    pub external_trade_id: Option<String>,
    pub symbol: String,
    pub side: TradeSide,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub open_price: Decimal,
    pub close_price: Option<Decimal>,
    pub volume: Decimal,
    /// Realized P&L before commission and swap.
    pub pnl: Option<Decimal>,
    pub commission: Decimal,
    pub swap: Decimal,
    pub status: TradeStatus,
    pub source: TradeSource,
    #[serde(default)]
    pub metadata: TradeMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// Realized P&L adjusted for commission and swap.
    pub fn net_pnl(&self) -> Decimal {
        self.pnl
            .unwrap_or(Decimal::ZERO)
            .saturating_add(self.commission)
            .saturating_add(self.swap)
    }

    /// Close time for closed trades, open time otherwise.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.close_time.unwrap_or(self.open_time)
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }
}

/// Trade data before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub connection_id: String,
    pub owner_id: String,
    pub provider: ProviderKind,
    pub external_trade_id: Option<String>,
    pub symbol: String,
    pub side: TradeSide,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub open_price: Decimal,
    pub close_price: Option<Decimal>,
    pub volume: Decimal,
    pub pnl: Option<Decimal>,
    pub commission: Decimal,
    pub swap: Decimal,
    pub source: TradeSource,
    pub metadata: TradeMetadata,
}

impl NewTrade {
    pub fn status(&self) -> TradeStatus {
        TradeStatus::for_close_time(self.close_time.as_ref())
    }

    pub fn net_pnl(&self) -> Decimal {
        self.pnl
            .unwrap_or(Decimal::ZERO)
            .saturating_add(self.commission)
            .saturating_add(self.swap)
    }

    /// External id usable for de-duplication, if any.
    pub fn dedup_key(&self) -> Option<&str> {
        self.external_trade_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Outcome of a batch upsert keyed on external trade id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertTradesResult {
    pub inserted: usize,
    pub updated: usize,
}

impl UpsertTradesResult {
    pub fn processed(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Trade counts for a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCounts {
    pub total: i64,
    pub closed: i64,
    pub open: i64,
    /// Trades received through the push path.
    pub pushed: i64,
}

/// Filter and window for paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeQuery {
    pub status: Option<TradeStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for TradeQuery {
    fn default() -> Self {
        Self {
            status: None,
            limit: crate::constants::DEFAULT_TRADES_PAGE_SIZE,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePage {
    pub trades: Vec<Trade>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl TradePage {
    pub fn new(trades: Vec<Trade>, total: i64, query: &TradeQuery) -> Self {
        Self {
            trades,
            total,
            limit: query.limit,
            offset: query.offset,
            has_more: query.offset + query.limit < total,
        }
    }
}
