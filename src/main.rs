use std::sync::Arc;

use bookmarks::config::{Backend, Cli, Config, default_config_dir, default_config_path};
use bookmarks::db::LibsqlStore;
use bookmarks::handler::AppState;
use bookmarks::routes;
use bookmarks::service::BookmarkService;
use bookmarks::store::{BookmarkStore, MemoryStore, demo_bookmarks};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    dotenvy::dotenv().ok();

    // --config puts the database next to the config file, otherwise ~/.bookmarks/
    let (config_path, data_dir) = match args.config_path {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            (path, dir)
        }
        None => (default_config_path(), default_config_dir()),
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).json().init();
    tracing::info!("bookmarks.svc starting");

    let cfg = Config::new(&config_path.to_string_lossy()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });

    let mut replica = None;
    let store: Arc<dyn BookmarkStore> = match cfg.storage.backend {
        Backend::Memory => {
            tracing::info!(seed = cfg.storage.seed, "[store] using in-memory bookmarks");
            if cfg.storage.seed {
                Arc::new(MemoryStore::with_bookmarks(demo_bookmarks()))
            } else {
                Arc::new(MemoryStore::new())
            }
        }
        Backend::Libsql => {
            let db = Arc::new(LibsqlStore::new(&cfg.storage, &data_dir).await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to setup database");
                std::process::exit(1);
            }));
            replica = Some(db.clone());
            db
        }
    };

    let state = AppState {
        bookmarks: BookmarkService::new(store),
        api_token: Arc::from(cfg.app.get_api_token()),
        expose_errors: !cfg.app.is_production(),
    };
    let app = routes::routes(state);

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("bookmarks.svc running on {}", &address);
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
    };

    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }

    if let Some(db) = replica {
        if let Err(e) = db.sync().await {
            tracing::warn!(error = %e, "final replica sync failed");
        }
    }
    tracing::info!("bookmarks.svc going off, graceful shutdown complete");
}
