//! weatherbot entry point.
//!
//! Loads configuration, initialises structured logging, resolves secrets,
//! wires the forecast and reply clients into the bot and serves the
//! webhook until Ctrl-C.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use weatherbot::bot::WeatherBot;
use weatherbot::config;
use weatherbot::line::client::LineClient;
use weatherbot::server::{self, routes::BotState};
use weatherbot::weather::cwa::CwaClient;

const BANNER: &str = r#"
 __      __         _   _             ___      _
 \ \    / /__ __ _ | |_| |_  ___ _ _ | _ ) ___| |_
  \ \/\/ / -_) _` ||  _| ' \/ -_) '_|| _ \/ _ \  _|
   \_/\_/\___\__,_| \__|_||_\___|_|  |___/\___/\__|

  LINE forecast bot, data from the Central Weather Administration
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load_or_default("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        bot_name = %cfg.bot.name,
        region = %cfg.bot.default_region,
        triggers = ?cfg.bot.trigger_keywords,
        "weatherbot starting up"
    );

    // Missing secrets are fatal before the port is bound.
    let secrets = cfg.resolve_secrets()?;

    let cwa = CwaClient::new(&cfg.cwa, secrets.cwa_api_key)?;
    let line = LineClient::new(&cfg.line, secrets.channel_access_token)?;
    let bot = WeatherBot::new(Arc::new(cwa), &cfg)?;

    info!(
        near_term = %cfg.cwa.near_term.id,
        five_day = %cfg.cwa.five_day.id,
        timeout_secs = cfg.cwa.timeout_secs,
        "Forecast source configured"
    );

    let state = Arc::new(BotState {
        bot,
        replier: Arc::new(line),
        channel_secret: secrets.channel_secret,
        max_reply_chars: cfg.bot.max_reply_chars,
    });

    server::serve(state, cfg.server.effective_port(), &cfg.server.webhook_path).await?;

    info!("weatherbot shut down cleanly.");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("weatherbot=info"));

    let json_logging = std::env::var("WEATHERBOT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
