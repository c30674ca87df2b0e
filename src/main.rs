use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marquee::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, DocumentStore, MemoryDocumentStore, RedisDocumentStore},
    services::{
        CatalogGateway, FirebaseIdentityProvider, IdentitySession, ImageUrls, TmdbProvider,
        WishlistStore,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marquee=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let catalog = TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_language.clone(),
    );
    let gateway = CatalogGateway::new(
        Arc::new(catalog),
        ImageUrls::new(config.tmdb_image_url.clone()),
    );

    let identity_provider = FirebaseIdentityProvider::new(
        config.firebase_api_key.clone(),
        config.identity_api_url.clone(),
        config.token_api_url.clone(),
    );
    let identity = Arc::new(IdentitySession::new(Arc::new(identity_provider)));

    let documents: Arc<dyn DocumentStore> = if config.marquee_memory_store {
        tracing::warn!("Using in-memory document store; wishlists will not persist");
        Arc::new(MemoryDocumentStore::new())
    } else {
        Arc::new(RedisDocumentStore::connect(create_redis_client(&config.redis_url)?).await?)
    };
    tracing::info!(store = documents.name(), "Document store ready");

    let wishlist = Arc::new(WishlistStore::new(documents));
    let attached = wishlist.attach(&identity);

    // No persisted session: the initial auth check completes signed out
    identity.resolve();

    let app = create_router(AppState::new(
        gateway,
        Arc::clone(&identity),
        Arc::clone(&wishlist),
    ));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    attached.abort();
    wishlist.unbind().await;
    tracing::info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
