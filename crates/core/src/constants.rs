/// Minimum time between two successful syncs of the same connection.
pub const SYNC_COOLDOWN_SECONDS: i64 = 120;

/// Maximum length of the error message stored on a sync log.
pub const SYNC_LOG_ERROR_MAX_CHARS: usize = 1000;

/// Maximum length of the error message stored on a connection.
pub const CONNECTION_ERROR_MAX_CHARS: usize = 500;

/// Number of closed trades shown in the dashboard's recent-trades list.
pub const RECENT_TRADES_LIMIT: usize = 20;

/// Decimal precision for monetary output
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Default and maximum page sizes for trade listings.
pub const DEFAULT_TRADES_PAGE_SIZE: i64 = 50;
pub const MAX_TRADES_PAGE_SIZE: i64 = 200;

/// Default number of sync logs returned per connection.
pub const DEFAULT_SYNC_LOGS_LIMIT: i64 = 20;

/// Default number of failed sync logs returned to administrators.
pub const DEFAULT_FAILED_SYNC_LOGS_LIMIT: i64 = 50;

/// Number of characters of a push token that may appear in logs.
pub const PUSH_TOKEN_LOG_PREFIX: usize = 8;
