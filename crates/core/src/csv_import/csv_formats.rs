//! Broker export formats and their row normalizers.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::csv_reader::CsvRow;
use crate::errors::{Error, Result};
use crate::trades::TradeSide;
use crate::utils::decimal_utils::parse_lenient_decimal;
use crate::utils::time_utils::{parse_utc_datetime, CSV_DATETIME_FORMATS};

/// Export schemas recognized by header signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvFormat {
    Mt4,
    Mt5,
    Ctrader,
    Tradovate,
    Generic,
}

impl CsvFormat {
    /// Formats in detection priority. The first whose signature matches wins.
    pub const DETECTION_ORDER: [CsvFormat; 5] = [
        CsvFormat::Mt4,
        CsvFormat::Mt5,
        CsvFormat::Ctrader,
        CsvFormat::Tradovate,
        CsvFormat::Generic,
    ];

    /// Headers a file must contain to be read as this format.
    pub fn required_headers(&self) -> &'static [&'static str] {
        match self {
            CsvFormat::Mt4 => &["ticket", "open time", "close time", "item", "profit"],
            CsvFormat::Mt5 => &["position", "time", "symbol", "profit"],
            CsvFormat::Ctrader => &["position id", "symbol", "direction", "net profit"],
            CsvFormat::Tradovate => &["orderid", "symbol", "side", "filltime"],
            CsvFormat::Generic => &["symbol", "side", "pnl"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CsvFormat::Mt4 => "mt4",
            CsvFormat::Mt5 => "mt5",
            CsvFormat::Ctrader => "ctrader",
            CsvFormat::Tradovate => "tradovate",
            CsvFormat::Generic => "generic",
        }
    }

    /// Identifies the format from normalized header names.
    pub fn detect(headers: &[String]) -> Result<CsvFormat> {
        CsvFormat::DETECTION_ORDER
            .into_iter()
            .find(|format| {
                format
                    .required_headers()
                    .iter()
                    .all(|required| headers.iter().any(|h| h == required))
            })
            .ok_or_else(|| {
                let shown: Vec<&str> = headers.iter().take(10).map(String::as_str).collect();
                Error::CsvParsing(format!(
                    "Unrecognized CSV format. Headers found: [{}]",
                    shown.join(", ")
                ))
            })
    }

    /// Maps one row to a trade, or `None` when the row should be skipped.
    pub fn normalize_row(&self, row: &CsvRow) -> Option<CsvTrade> {
        let trade = match self {
            CsvFormat::Mt4 => map_mt4(row)?,
            CsvFormat::Mt5 => map_mt5(row)?,
            CsvFormat::Ctrader => map_ctrader(row),
            CsvFormat::Tradovate => map_tradovate(row),
            CsvFormat::Generic => map_generic(row),
        };
        trade.into_usable()
    }
}

impl fmt::Display for CsvFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized CSV row, not yet bound to a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTrade {
    pub external_trade_id: Option<String>,
    pub symbol: String,
    pub side: TradeSide,
    pub open_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub volume: Decimal,
    pub pnl: Decimal,
    pub commission: Decimal,
    pub swap: Decimal,
}

/// Row fields before the usability check.
struct MappedRow {
    external_trade_id: String,
    symbol: String,
    side: TradeSide,
    open_time: Option<DateTime<Utc>>,
    close_time: Option<DateTime<Utc>>,
    open_price: Decimal,
    close_price: Decimal,
    volume: Decimal,
    pnl: Decimal,
    commission: Decimal,
    swap: Decimal,
}

impl MappedRow {
    /// Rows need a symbol and a parsable open time.
    fn into_usable(self) -> Option<CsvTrade> {
        let open_time = self.open_time?;
        if self.symbol.is_empty() {
            return None;
        }
        let external_trade_id = Some(self.external_trade_id).filter(|id| !id.is_empty());
        Some(CsvTrade {
            external_trade_id,
            symbol: self.symbol,
            side: self.side,
            open_time,
            close_time: self.close_time,
            open_price: self.open_price,
            close_price: self.close_price,
            volume: self.volume,
            pnl: self.pnl,
            commission: self.commission,
            swap: self.swap,
        })
    }
}

fn text(row: &CsvRow, aliases: &[&str]) -> String {
    row.first_of(aliases).trim().to_string()
}

fn number(row: &CsvRow, aliases: &[&str]) -> Decimal {
    parse_lenient_decimal(row.first_of(aliases))
}

fn timestamp(row: &CsvRow, aliases: &[&str]) -> Option<DateTime<Utc>> {
    parse_utc_datetime(row.first_of(aliases), CSV_DATETIME_FORMATS)
}

/// MetaTrader 4 account history. Balance and credit lines are skipped.
fn map_mt4(row: &CsvRow) -> Option<MappedRow> {
    let side = match row.first_of(&["type"]).trim().to_lowercase().as_str() {
        "buy" => TradeSide::Buy,
        "sell" => TradeSide::Sell,
        _ => return None,
    };
    Some(MappedRow {
        external_trade_id: text(row, &["ticket"]),
        symbol: text(row, &["item", "symbol"]),
        side,
        open_time: timestamp(row, &["open time"]),
        close_time: timestamp(row, &["close time"]),
        open_price: number(row, &["price"]),
        close_price: number(row, &["close price"]),
        volume: number(row, &["size", "lots"]),
        pnl: number(row, &["profit"]),
        commission: number(row, &["commission"]),
        swap: number(row, &["swap"]),
    })
}

/// MetaTrader 5 deal report: one timestamp and one price per line.
fn map_mt5(row: &CsvRow) -> Option<MappedRow> {
    let trade_type = row.first_of(&["type"]).trim().to_lowercase();
    let side = if trade_type.contains("buy") {
        TradeSide::Buy
    } else if trade_type.contains("sell") {
        TradeSide::Sell
    } else {
        return None;
    };
    let time = timestamp(row, &["time"]);
    let price = number(row, &["price"]);
    Some(MappedRow {
        external_trade_id: text(row, &["position", "deal"]),
        symbol: text(row, &["symbol"]),
        side,
        open_time: time,
        close_time: time,
        open_price: price,
        close_price: price,
        volume: number(row, &["volume", "lots"]),
        pnl: number(row, &["profit"]),
        commission: number(row, &["commission"]),
        swap: number(row, &["swap"]),
    })
}

fn map_ctrader(row: &CsvRow) -> MappedRow {
    MappedRow {
        external_trade_id: text(row, &["position id"]),
        symbol: text(row, &["symbol"]),
        side: TradeSide::normalize(row.first_of(&["direction"])),
        open_time: timestamp(row, &["open time"]),
        close_time: timestamp(row, &["close time"]),
        open_price: number(row, &["open price"]),
        close_price: number(row, &["close price"]),
        volume: number(row, &["volume", "quantity"]),
        pnl: number(row, &["net profit", "profit"]),
        commission: number(row, &["commission"]),
        swap: number(row, &["swap"]),
    }
}

/// Tradovate fills: one fill time and one average price per order, no swap.
fn map_tradovate(row: &CsvRow) -> MappedRow {
    let fill_time = timestamp(row, &["filltime", "fill time"]);
    let fill_price = number(row, &["avgfillprice", "fill price"]);
    MappedRow {
        external_trade_id: text(row, &["orderid", "order id"]),
        symbol: text(row, &["symbol", "contract"]),
        side: TradeSide::normalize(row.first_of(&["side", "action"])),
        open_time: fill_time,
        close_time: fill_time,
        open_price: fill_price,
        close_price: fill_price,
        volume: number(row, &["qty", "quantity"]),
        pnl: number(row, &["pnl", "profit"]),
        commission: number(row, &["commission"]),
        swap: Decimal::ZERO,
    }
}

fn map_generic(row: &CsvRow) -> MappedRow {
    MappedRow {
        external_trade_id: text(row, &["id", "trade_id"]),
        symbol: text(row, &["symbol", "instrument"]),
        side: TradeSide::normalize(row.first_of(&["side", "direction"])),
        open_time: timestamp(row, &["open_time", "entry_time"]),
        close_time: timestamp(row, &["close_time", "exit_time"]),
        open_price: number(row, &["open_price", "entry_price"]),
        close_price: number(row, &["close_price", "exit_price"]),
        volume: number(row, &["volume", "lots", "size"]),
        pnl: number(row, &["pnl", "profit", "net_pnl"]),
        commission: number(row, &["commission"]),
        swap: number(row, &["swap"]),
    }
}
