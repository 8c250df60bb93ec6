//! QueueDeck - job queue monitoring panel
//!
//! Runs a host server with the queue panel routes mounted. Queues are kept in
//! memory; store statistics come from Redis when a URL is configured.

mod config;
mod router;

use clap::Parser;
use queuedeck_api::{AuthStrategy, PanelOptions, QueueList, QueueSource};
use queuedeck_core::{JobOptions, MemoryQueue, Queue, QueueError, StaticStore, StoreClient};
use queuedeck_redis::RedisStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, StoreConfig};

#[derive(Parser, Debug)]
#[command(name = "queuedeck")]
#[command(about = "Job queue monitoring panel", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./queuedeck.toml when present)
    #[arg(short, long, env = "QUEUEDECK_CONFIG")]
    config: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "QUEUEDECK_PORT")]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "QUEUEDECK_HOST")]
    host: Option<String>,

    /// Prefix for the panel routes
    #[arg(long, env = "QUEUEDECK_BASE_PATH")]
    base_path: Option<String>,

    /// Comma-separated queue names
    #[arg(long, env = "QUEUEDECK_QUEUES", value_delimiter = ',')]
    queues: Vec<String>,

    /// Redis URL used for store statistics
    #[arg(long, env = "QUEUEDECK_REDIS_URL")]
    redis_url: Option<String>,

    /// Require `Authorization: Bearer <token>` on panel routes
    #[arg(long, env = "QUEUEDECK_AUTH_TOKEN")]
    auth_token: Option<String>,

    /// Allow cross-origin requests to the panel routes
    #[arg(long, env = "QUEUEDECK_CORS")]
    cors: bool,

    /// Seed every queue with sample jobs
    #[arg(long, env = "QUEUEDECK_DEMO")]
    demo: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "QUEUEDECK_LOG_LEVEL")]
    log_level: String,
}

impl Args {
    /// Command line values take precedence over the configuration file
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(base_path) = self.base_path {
            config.panel.base_path = base_path;
        }
        if !self.queues.is_empty() {
            config.panel.queues = self.queues;
        }
        if let Some(url) = self.redis_url {
            config.store = StoreConfig::Redis { url };
        }
        if let Some(token) = self.auth_token {
            config.panel.route_options.auth = Some(AuthStrategy::Bearer { token });
        }
        config.panel.route_options.cors |= self.cors;
        config.panel.demo |= self.demo;
    }
}

fn store_client(config: &StoreConfig) -> anyhow::Result<Arc<dyn StoreClient>> {
    Ok(match config {
        StoreConfig::Static => Arc::new(StaticStore::default()),
        StoreConfig::Redis { url } => Arc::new(RedisStore::from_url(url)?),
    })
}

fn seed_demo_jobs(queue: &MemoryQueue) -> Result<(), QueueError> {
    let data = serde_json::json!({"source": "demo"});

    queue.add("waiting", data.clone(), JobOptions::default());
    queue.add(
        "delayed",
        data.clone(),
        JobOptions {
            delay: Some(60_000),
            ..Default::default()
        },
    );

    let done = queue.add("completed", data.clone(), JobOptions::default());
    queue.start(&done)?;
    queue.complete(&done, serde_json::json!({"ok": true}))?;

    let failed = queue.add("failed", data, JobOptions::default());
    queue.start(&failed)?;
    queue.fail(&failed, "demo failure")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("queuedeck={},tower_http=debug", args.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    info!("Starting QueueDeck...");
    info!("  Queues: {}", config.panel.queues.join(", "));
    info!(
        "  Store: {}",
        match config.store {
            StoreConfig::Static => "static",
            StoreConfig::Redis { .. } => "redis",
        }
    );
    info!(
        "  Auth: {}",
        if config.panel.route_options.auth.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );

    let store = store_client(&config.store)?;
    let names = config.panel.queues.clone();
    let demo = config.panel.demo;
    let queues = QueueSource::factory(move || async move {
        let queues: QueueList = names
            .into_iter()
            .map(|name| {
                let queue = MemoryQueue::new(name, store.clone());
                if demo {
                    if let Err(e) = seed_demo_jobs(&queue) {
                        warn!(queue = %queue.name(), error = %e, "Failed to seed demo jobs");
                    }
                }
                Arc::new(queue) as Arc<dyn Queue>
            })
            .collect();
        Ok(queues)
    });

    let app = router::create_router(PanelOptions {
        base_path: config.panel.base_path.clone(),
        queues,
        route_options: config.panel.route_options.clone(),
    })
    .await?;

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
