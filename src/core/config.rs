use chrono::NaiveDate;
use once_cell::sync::Lazy;
use secrecy::SecretString;
use std::env;
use std::time::Duration;

use crate::catalog::PaymentMethod;
use crate::i18n::Locale;

/// Configuration constants for the bot
/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<SecretString> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_default()
        .into()
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: database.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Externally reachable base URL (e.g. `https://xxxxx.up.railway.app`).
/// Updates are received at `<WEBHOOK_URL>/webhook`.
pub static WEBHOOK_URL: Lazy<Option<String>> = Lazy::new(|| env::var("WEBHOOK_URL").ok());

/// Local port for the webhook HTTP listener
pub static WEBHOOK_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("WEBHOOK_PORT")
        .or_else(|_| env::var("PORT"))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080)
});

/// Support contact shown next to the Pix button (optional)
pub static SUPPORT_URL: Lazy<Option<String>> = Lazy::new(|| env::var("SUPPORT_URL").ok().filter(|s| !s.is_empty()));

/// Operator configuration
pub mod admin {
    use super::*;

    /// The single operator allowed to approve, reject and deliver links.
    /// Read from ADMIN_CHAT_ID environment variable; 0 means "not configured"
    pub static ADMIN_CHAT_ID: Lazy<i64> = Lazy::new(|| {
        env::var("ADMIN_CHAT_ID")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    });

    /// Language of operator-facing messages, read from ADMIN_LOCALE (`pt` or `en`)
    pub static ADMIN_LOCALE: Lazy<Locale> = Lazy::new(|| {
        env::var("ADMIN_LOCALE")
            .ok()
            .and_then(|v| v.trim().to_lowercase().parse().ok())
            .unwrap_or_default()
    });
}

/// Deferred release (pre-sale) configuration
pub mod release {
    use super::*;

    /// Fallback release date for the 2026 pre-sale cohort
    pub const DEFAULT_RELEASE_DATE: &str = "2026-01-02";

    /// Default interval between release checks (in seconds)
    pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60 * 60;

    /// Release date, read from RELEASE_DATE (YYYY-MM-DD)
    pub static RELEASE_DATE: Lazy<NaiveDate> = Lazy::new(|| {
        env::var("RELEASE_DATE")
            .ok()
            .and_then(|v| match parse_date(&v) {
                Some(date) => Some(date),
                None => {
                    log::warn!("Ignoring invalid RELEASE_DATE '{}', using {}", v, DEFAULT_RELEASE_DATE);
                    None
                }
            })
            .unwrap_or_else(default_release_date)
    });

    /// Read from RELEASE_CHECK_INTERVAL_SECS environment variable
    pub static CHECK_INTERVAL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("RELEASE_CHECK_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_CHECK_INTERVAL_SECS)
    });

    /// Release check interval duration
    pub fn check_interval() -> Duration {
        Duration::from_secs(*CHECK_INTERVAL_SECS)
    }

    /// Parses a `YYYY-MM-DD` date
    pub fn parse_date(value: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
    }

    fn default_release_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap_or_default()
    }
}

/// Conversation session configuration
pub mod session {
    use super::*;

    /// Idle lifetime of a buyer session (in seconds)
    pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

    /// Upper bound on concurrently cached buyer sessions
    pub const MAX_SESSIONS: u64 = 50_000;

    /// Read from SESSION_TTL_SECS environment variable
    pub static TTL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TTL_SECS)
    });

    /// Session idle lifetime duration
    pub fn ttl() -> Duration {
        Duration::from_secs(*TTL_SECS)
    }
}

/// Payment destinations shown to buyers after they pick a method
pub mod payment {
    use super::*;

    /// Returns the destination configured for `method` via `PAYMENT_<METHOD>`.
    pub fn destination(method: PaymentMethod) -> Option<String> {
        let key = format!("PAYMENT_{}", method.as_ref().to_uppercase());
        env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher retry attempts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    /// Dispatcher retry delay duration
    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }

    /// Base for exponential backoff calculation
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_release_dates() {
        assert_eq!(release::parse_date("2026-01-02"), NaiveDate::from_ymd_opt(2026, 1, 2));
        assert_eq!(release::parse_date(" 2026-12-31 "), NaiveDate::from_ymd_opt(2026, 12, 31));
        assert_eq!(release::parse_date("02/01/2026"), None);
        assert_eq!(release::parse_date(""), None);
    }

    #[test]
    fn default_release_date_matches_constant() {
        assert_eq!(
            release::parse_date(release::DEFAULT_RELEASE_DATE),
            NaiveDate::from_ymd_opt(2026, 1, 2)
        );
    }
}
