mod logging;

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use reqwest::Url;
use sms_relay::{
    discord::DiscordClient,
    http::{ClientOptions, HttpClient},
    server::{self, DEFAULT_BODY_LIMIT, ServerOptions},
};
use tokio::{net::TcpListener, runtime::Builder, signal};

/// Older deployments set the webhook through this lower-case variable.
const LEGACY_WEBHOOK_ENV: &str = "discord_webhook_url";

/// SMS to Discord relay
#[derive(Parser)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// The Discord WebHook URL the notifications should be sent to
    /// (the lower-case `discord_webhook_url` variable is also read)
    #[arg(short, long, env = "DISCORD_WEBHOOK_URL")]
    discord_webhook_url: Option<Url>,

    /// Add XSS, sniffing and framing protection headers to every response
    #[arg(long, env = "SECURE_SERVER", default_value_t = true, action = ArgAction::Set)]
    secure_server: bool,

    /// Maximum accepted request body size in bytes
    #[arg(long, env = "BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
    body_limit: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init();

    let http_client =
        HttpClient::new(ClientOptions::default()).context("Could not create HTTP client")?;
    let webhook_url = resolve_webhook_url(
        args.discord_webhook_url,
        std::env::var(LEGACY_WEBHOOK_ENV).ok(),
    )?;
    let discord_client = DiscordClient::new(http_client, webhook_url)
        .context("Could not create Discord Webhook Client")?;
    log::info!("Relaying notifications to {}", discord_client.url().host_str().unwrap_or("?"));

    let app = server::router(
        discord_client,
        ServerOptions {
            secure_headers: args.secure_server,
            body_limit: args.body_limit,
        },
    );

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Could not start async runtime")?;
    runtime.block_on(async move {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, args.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Could not bind to {addr}"))?;
        log::info!("Listening on http://{addr}");
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("Server failed")
    })
}

/// Prefers the flag / `DISCORD_WEBHOOK_URL`, then falls back to [`LEGACY_WEBHOOK_ENV`].
fn resolve_webhook_url(flag: Option<Url>, legacy: Option<String>) -> Result<Url> {
    if let Some(url) = flag {
        return Ok(url);
    }
    let raw = legacy.filter(|raw| !raw.is_empty()).with_context(|| {
        format!(
            "A Discord webhook URL is required: pass --discord-webhook-url \
             or set DISCORD_WEBHOOK_URL (or {LEGACY_WEBHOOK_ENV})"
        )
    })?;
    log::debug!("Using webhook URL from {LEGACY_WEBHOOK_ENV}");
    Url::parse(&raw).with_context(|| format!("Invalid URL in {LEGACY_WEBHOOK_ENV}"))
}

async fn wait_for_shutdown() {
    signal::ctrl_c().await.ok();
    log::info!("Shutting down");
}
