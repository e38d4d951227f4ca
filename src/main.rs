use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use pl_dashboard_rs::{
    api::Api,
    data_service::DataService,
    store::{SafeStore, Store},
    LogResult, CONFIG,
};
use tracing::log;

#[tokio::main]
async fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        // Set the RUST_LOG, if it hasn't been explicitly defined
        std::env::set_var("RUST_LOG", "debug,hyper=debug" )
    }

    // Configure a custom event formatter
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(false)
        .with_ansi(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .compact();
    tracing_subscriber::fmt()
        .event_format(format)
        .with_max_level(tracing::Level::INFO)
        .init();

    std::env::set_var("DB_PATH", &CONFIG.db_path);

    let snapshot = DataService::read_snapshot();
    match &snapshot {
        Some(data) => log::info!("[MAIN] Serving snapshot from {}", data.last_updated),
        None => log::info!("[MAIN] No snapshot, loading until first refresh"),
    }
    let store: SafeStore = Arc::new(Store::new(snapshot.map(Arc::new)));

    let h1 = {
        let store = store.clone();
        tokio::spawn(async move { Api::serve(CONFIG.port, store).await })
    };
    let h2 = {
        let store = store.clone();
        tokio::spawn(async move { handle_refresh(store).await })
    };
    let h3 = {
        let store = store.clone();
        tokio::spawn(async move { handle_persist(store).await })
    };

    join_all(vec!(h1, h2, h3)).await;
}

async fn handle_refresh(store: SafeStore) {
    loop {
        let before = Instant::now();
        match DataService::update_all(&CONFIG).await {
            Ok(data) => {
                log::info!("[LOOP] Refreshed {} teams {:.2?}", data.team_names.len(), before.elapsed());
                store.set(Some(Arc::new(data)));
            },
            Err(e) => log::error!("[LOOP] Refresh failed, keeping previous data: {e}"),
        }
        tokio::time::sleep(Duration::from_secs(CONFIG.update_interval_s)).await;
    }
}

async fn handle_persist(store: SafeStore) {
    let mut receiver = store.subscribe();
    while receiver.changed().await.is_ok() {
        let snapshot = receiver.borrow_and_update().clone();
        if let Some(data) = snapshot {
            DataService::write_snapshot(&data).ok_log("[MAIN] Failed to write snapshot");
        }
    }
}
