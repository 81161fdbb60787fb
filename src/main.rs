use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::update_listeners::{webhooks, Polling};
use tokio::time::sleep;

use channelshop::cli::{Cli, Commands};
use channelshop::core::{config, init_logger, log_configuration};
use channelshop::messaging::Messenger;
use channelshop::operator::{format_order_line, OperatorDesk};
use channelshop::orders::{Arbiter, FixedClock, LifecycleEngine, Operator, OrderStatus, ReleaseScheduler};
use channelshop::session::SessionStore;
use channelshop::storage::{create_pool, get_connection, orders as store, DbPool};
use channelshop::storefront::Storefront;
use channelshop::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramMessenger};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics inside the dispatcher instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { webhook }) => {
            log::info!("Running bot in normal mode (webhook: {})", webhook);
            run_bot(webhook).await
        }
        Some(Commands::ReleaseCheck { today }) => run_release_check(today).await,
        Some(Commands::Orders { status, limit, json }) => run_orders_listing(status, limit, json),
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(false).await
        }
    }
}

fn open_pool() -> Result<Arc<DbPool>> {
    let db_pool = create_pool(&config::DATABASE_PATH)?;
    log::info!("Database ready at {}", config::DATABASE_PATH.as_str());
    Ok(Arc::new(db_pool))
}

/// Runs the release trigger once, optionally pretending today is `today`.
async fn run_release_check(today: Option<String>) -> Result<()> {
    let db_pool = open_pool()?;
    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(create_bot()?));

    let mut scheduler = ReleaseScheduler::new(
        db_pool,
        messenger,
        Operator::from_config(),
        *config::release::RELEASE_DATE,
    );
    if let Some(value) = today {
        let date = config::release::parse_date(&value)
            .ok_or_else(|| anyhow::anyhow!("Invalid --today date '{}', expected YYYY-MM-DD", value))?;
        scheduler = scheduler.with_clock(Arc::new(FixedClock(date)));
    }

    let outcome = scheduler.check_now().await?;
    log::info!("Release check for {}: {:?}", scheduler.release_date(), outcome);
    println!("{:?}", outcome);
    Ok(())
}

/// Prints recent orders straight from the database.
fn run_orders_listing(status: Option<String>, limit: usize, json: bool) -> Result<()> {
    let status = status
        .map(|s| {
            s.parse::<OrderStatus>()
                .map_err(|_| anyhow::anyhow!("Unknown order status '{}'", s))
        })
        .transpose()?;

    let db_pool = open_pool()?;
    let conn = get_connection(&db_pool)?;
    let orders = store::recent_orders(&conn, status, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&orders)?);
    } else if orders.is_empty() {
        println!("No orders.");
    } else {
        for order in &orders {
            println!("{}", format_order_line(order));
        }
    }
    Ok(())
}

async fn run_bot(use_webhook: bool) -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");

    log_configuration();

    let db_pool = open_pool()?;
    let bot = create_bot()?;

    let mut retry_count = 0;
    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;

    let bot_info = bot.get_me().await?;
    log::info!("Bot username: {:?}, Bot ID: {}", bot_info.username, bot_info.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(bot.clone()));
    let operator = Operator::from_config();
    let release_date = *config::release::RELEASE_DATE;

    let sessions = Arc::new(SessionStore::from_config());
    let engine = Arc::new(LifecycleEngine::new(db_pool.clone(), messenger.clone(), operator));
    let arbiter = Arc::new(Arbiter::new(
        db_pool.clone(),
        messenger.clone(),
        sessions.clone(),
        operator,
    ));
    let release = Arc::new(ReleaseScheduler::new(
        db_pool.clone(),
        messenger.clone(),
        operator,
        release_date,
    ));

    let storefront = Arc::new(
        Storefront::new(sessions, engine, messenger.clone(), release_date).with_support_url(config::SUPPORT_URL.clone()),
    );
    let desk = Arc::new(OperatorDesk::new(arbiter, release.clone(), messenger));

    let _release_task = release.start(config::release::check_interval());

    let handler = schema(HandlerDeps::new(storefront, desk));

    let webhook_url = if use_webhook { config::WEBHOOK_URL.clone() } else { None };
    if use_webhook && webhook_url.is_none() {
        log::warn!("--webhook given but WEBHOOK_URL is not set, falling back to long polling");
    }

    if let Some(base) = webhook_url {
        let url = url::Url::parse(&format!("{}/webhook", base.trim_end_matches('/')))?;
        let addr = SocketAddr::from(([0, 0, 0, 0], *config::WEBHOOK_PORT));
        log::info!("Starting bot in webhook mode at {} (listening on {})", url, addr);

        let listener = webhooks::axum(bot.clone(), webhooks::Options::new(addr, url)).await?;
        log::info!("🎉 Bot initialization complete in {:.2}s", bot_init_start.elapsed().as_secs_f64());

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the webhook listener"),
            )
            .await;
        return Ok(());
    }

    log::info!("Starting bot in long polling mode");
    log::info!("🎉 Bot initialization complete in {:.2}s", bot_init_start.elapsed().as_secs_f64());

    // Run the dispatcher with retry logic
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // Separate task so a panic surfaces as a JoinError instead of killing the process
        let handle = tokio::spawn(async move {
            let listener = Polling::builder(bot_clone.clone()).build();

            Dispatcher::builder(bot_clone, handler_clone)
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    log::error!("Dispatcher panicked: {}", join_err);

                    if retry_count < max_retries {
                        retry_count += 1;
                        log::info!(
                            "Retrying dispatcher connection after panic (attempt {}/{})...",
                            retry_count,
                            max_retries
                        );
                        exponential_backoff(retry_count).await;
                    } else {
                        log::error!("Max retries reached after panic. Exiting...");
                        break;
                    }
                } else {
                    log::warn!("Dispatcher task was cancelled: {}", join_err);
                    break;
                }
            }
        }

        sleep(config::retry::dispatcher_delay()).await;
    }

    Ok(())
}

async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    sleep(delay).await;
}
