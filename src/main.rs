//! JustShake - cocktail catalog API and Telegram bot

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use justshake::{
    bot::{self, BotSettings, CatalogService, TelegramClient},
    config::Args,
    db::{
        CatalogStore, InMemoryCatalogStore, InMemoryUserStore, MongoCatalogStore, MongoClient,
        MongoUserStore, UserStore,
    },
    server::{self, AppState, StorageBackend},
    services::{Catalog, Favorites},
    session::{self, InMemorySessionCache, SessionCache},
};

type Stores = (Arc<dyn CatalogStore>, Arc<dyn UserStore>);

async fn connect_mongo(args: &Args) -> justshake::Result<Stores> {
    let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    let catalog = MongoCatalogStore::new(&client).await?;
    let users = MongoUserStore::new(&client).await?;
    let stores: Stores = (Arc::new(catalog), Arc::new(users));
    Ok(stores)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("justshake={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  JustShake - cocktail catalog");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db {})", args.mongodb_uri, args.mongodb_db);
    info!("Page size: {}, search limit: {}", args.page_size, args.search_limit);
    info!("Session TTL: {}s", args.session_ttl_secs);
    info!("Bot: {}", if args.bot_token().is_some() { "enabled" } else { "disabled" });
    info!("======================================");

    // MongoDB is optional in dev mode
    let (storage, (catalog_store, user_store)) = match connect_mongo(&args).await {
        Ok(stores) => {
            info!("MongoDB connected successfully");
            (StorageBackend::Mongo, stores)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory stores): {}", e);
                let stores: Stores = (
                    Arc::new(InMemoryCatalogStore::new()),
                    Arc::new(InMemoryUserStore::new()),
                );
                (StorageBackend::Memory, stores)
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let sessions = Arc::new(InMemorySessionCache::new());
    session::spawn_cleanup_task(Arc::clone(&sessions));

    let catalog = Catalog::new(catalog_store, args.request_timeout());
    let favorites = Favorites::new(user_store, args.request_timeout());

    let bot_enabled = match args.bot_token() {
        Some(token) => {
            let client = TelegramClient::new(&args.telegram_api_url, token, args.poll_timeout())?;
            let service = CatalogService::new(
                catalog.clone(),
                favorites,
                Arc::clone(&sessions) as Arc<dyn SessionCache>,
                BotSettings::from_args(&args),
            );
            tokio::spawn(bot::run_polling(
                Arc::new(service),
                Arc::new(client),
                args.poll_timeout(),
            ));
            true
        }
        None => {
            info!("BOT_TOKEN not set, Telegram bot disabled");
            false
        }
    };

    let state = Arc::new(AppState::new(args, catalog, sessions, storage).with_bot(bot_enabled));
    server::run(state).await?;

    Ok(())
}
