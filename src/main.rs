use liquity_views::datasource::{RpcChainReader, SubgraphIndexer};
use liquity_views::{api, config::Config, ChainReader, Indexer, PositionService, QueryCache};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let indexer: Arc<dyn Indexer> = Arc::new(SubgraphIndexer::new(config.subgraph_url.clone()));
    let chain: Arc<dyn ChainReader> = Arc::new(RpcChainReader::new(
        config.rpc_url.clone(),
        config.collaterals.clone(),
        config.staking_address,
        config.sp_yield_split.clone(),
    ));
    let cache = Arc::new(QueryCache::new(config.data_refresh_interval));
    let service = Arc::new(PositionService::new(indexer, chain, cache, &config));

    tracing::info!(
        "Serving {} collateral branches, refresh interval {:?}",
        config.collaterals.len(),
        config.data_refresh_interval
    );

    let app = api::create_router(api::AppState::new(service));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
