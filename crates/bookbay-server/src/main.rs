use anyhow::Context;
use bookbay_server::{config::Config, router, spawn_session_sweeper, AppState};
use bookbay_storage::{CatalogStore, InMemoryStore, PersistentStore, StaticCatalog, Storage};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Storage> = match &config.data_dir {
        Some(dir) => match PersistentStore::open(dir.clone()) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                tracing::warn!(error = %e, "persistent open failed, falling back to memory");
                Arc::new(InMemoryStore::new())
            }
        },
        None => Arc::new(InMemoryStore::new()),
    };
    let catalog: Arc<dyn CatalogStore> = match &config.catalog_path {
        Some(path) => Arc::new(
            StaticCatalog::from_path(path)
                .with_context(|| format!("loading catalog from {}", path.display()))?,
        ),
        None => Arc::new(StaticCatalog::sample()),
    };
    info!(books = catalog.books().len(), "catalog loaded");

    let addr = config.addr;
    let tls = config.tls.clone();
    let state = AppState::new(store, catalog, config);
    spawn_session_sweeper(state.clone());
    let app = router(state);

    match tls {
        Some((cert, key)) => {
            let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert, &key)
                .await
                .context("loading TLS certificate")?;
            info!("https listening on {}", addr);
            axum_server::bind_rustls(addr, tls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("http listening on {}", addr);
            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}
