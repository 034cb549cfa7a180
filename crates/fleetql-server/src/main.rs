#![allow(clippy::doc_markdown)]
//! `FleetQL` Server - REST API for RSQL filtering over an in-memory fleet.

use axum::Router;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fleetql_core::config::LoggingConfig;
use fleetql_core::{FilterEngine, FleetQlConfig, MemoryStore};
use fleetql_server::{router, ApiDoc, AppState};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// FleetQL Server - RSQL filtering, paging and tag assignment
#[derive(Parser, Debug)]
#[command(name = "fleetql-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "fleetql.toml", env = "FLEETQL_CONFIG")]
    config: PathBuf,

    /// Host address to bind to (overrides the configuration)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides the configuration)
    #[arg(short, long)]
    port: Option<u16>,

    /// JSON seed file loaded into the store at startup
    #[arg(short, long)]
    seed: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = FleetQlConfig::load_from_path(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    init_tracing(&config.logging);
    tracing::info!("Starting FleetQL server...");

    let store = MemoryStore::new();
    let seed = args.seed.or_else(|| {
        (!config.server.seed_file.is_empty()).then(|| PathBuf::from(&config.server.seed_file))
    });
    if let Some(path) = seed {
        let loaded = store.load_seed_file(&path)?;
        tracing::info!("Loaded {} documents from {}", loaded, path.display());
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let cors_enabled = config.server.cors_enabled;
    let state = Arc::new(AppState {
        engine: FilterEngine::new(config),
        store,
    });

    // Swagger UI (stateless router)
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    let mut app = router(state).merge(Router::<()>::new().merge(swagger_ui));
    if cors_enabled {
        app = app.layer(CorsLayer::permissive());
    }
    let app = app.layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("FleetQL server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
