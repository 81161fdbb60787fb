//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the configuration the bot runs with

use anyhow::Result;
use secrecy::ExposeSecret;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup.
///
/// Secrets are never printed; only whether they are present.
pub fn log_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⚙️  Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.expose_secret().is_empty() {
        log::error!("❌ BOT_TOKEN: not set");
    } else {
        log::info!("✅ BOT_TOKEN: set");
    }

    match *config::admin::ADMIN_CHAT_ID {
        0 => log::error!("❌ ADMIN_CHAT_ID: not set - proofs cannot be reviewed!"),
        id => log::info!("✅ ADMIN_CHAT_ID: {}", id),
    }

    match config::WEBHOOK_URL.as_deref() {
        Some(url) => log::info!("✅ WEBHOOK_URL: {} (port {})", url, *config::WEBHOOK_PORT),
        None => log::info!("ℹ️  WEBHOOK_URL: not set (long polling only)"),
    }

    log::info!("📦 DATABASE_PATH: {}", config::DATABASE_PATH.as_str());
    log::info!(
        "📅 RELEASE_DATE: {} (checked every {}s)",
        *config::release::RELEASE_DATE,
        *config::release::CHECK_INTERVAL_SECS
    );
    log::info!("⏳ SESSION_TTL_SECS: {}", *config::session::TTL_SECS);

    for method in crate::catalog::PaymentMethod::ALL {
        if config::payment::destination(method).is_none() {
            log::warn!("⚠️  PAYMENT_{}: not set", method.as_ref().to_uppercase());
        }
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        assert!(!path.exists());

        // The file is created before the global logger is installed, so it
        // exists even if another test already set the logger.
        let _ = init_logger(path.to_str().unwrap());

        assert!(path.exists());
    }

    #[test]
    fn test_init_logger_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("bot.log");

        let err = init_logger(path.to_str().unwrap()).unwrap_err();

        assert!(err.to_string().contains("Failed to create log file"));
        assert!(!path.exists());
    }
}
