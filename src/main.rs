use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courier::engine::dispatch::NotificationDispatcher;
use courier::engine::unread::UnreadAggregator;
use courier::models::notification::{NewNotification, NotificationKind};
use courier::store::memory::MemStore;
use courier::store::postgres::PgStore;
use courier::store::DataStore;
use courier::{api, cli, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "courier=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Unread { user_id }) => {
            let user_id = user_id.parse().context("invalid user_id")?;
            let store = connect(&cfg).await?;
            let badge = UnreadAggregator::new(store).badge(user_id).await?;
            println!("Unread total: {}", badge.total);
            for c in badge.conversations {
                println!(
                    "  {:<38} unread={:<4} last={}",
                    c.conversation_id,
                    c.unread_count,
                    c.last_message_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "-".into()),
                );
            }
            Ok(())
        }
        Some(cli::Commands::Notify {
            user_id,
            kind,
            title,
            body,
            link,
        }) => {
            let user_id = user_id.parse().context("invalid user_id")?;
            let kind = parse_kind(&kind)?;
            let store = connect(&cfg).await?;
            let row = NotificationDispatcher::new(store)
                .notify(NewNotification {
                    user_id,
                    kind,
                    title,
                    body,
                    link,
                    related_id: None,
                })
                .await?;
            println!("Notification created:\n  ID:   {}\n  Kind: {:?}", row.id, row.kind);
            Ok(())
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn connect(cfg: &config::Config) -> anyhow::Result<Arc<dyn DataStore>> {
    let db = PgStore::connect(&cfg.database_url).await?;
    Ok(Arc::new(db))
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    let store: Arc<dyn DataStore> = if std::env::var("COURIER_MEMORY_STORE").is_ok() {
        // Dev mode: no database, state lives and dies with the process.
        tracing::warn!("COURIER_MEMORY_STORE set — using the in-memory store");
        Arc::new(MemStore::new())
    } else {
        tracing::info!("Connecting to database...");
        let db = PgStore::connect(&cfg.database_url).await?;
        tracing::info!("Running migrations...");
        db.migrate().await?;
        Arc::new(db)
    };

    let state = Arc::new(AppState::new(store, cfg));

    let app = axum::Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/api/v1", api::api_router())
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("courier listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn parse_kind(raw: &str) -> anyhow::Result<NotificationKind> {
    Ok(match raw {
        "new_message" => NotificationKind::NewMessage,
        "new_follower" => NotificationKind::NewFollower,
        "new_listing" => NotificationKind::NewListing,
        "new_review" => NotificationKind::NewReview,
        "price_drop" => NotificationKind::PriceDrop,
        other => anyhow::bail!("unknown notification kind: {}", other),
    })
}
