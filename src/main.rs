use std::sync::Arc;

use tracing::{error, info};

use skratime::categorizer::{
    start_categorizer_worker, Categorizer, CategorizerWorker, HttpTextModel,
};
use skratime::ingest::{start_feed_updater, FeedIngestor, FeedUpdater, RssFetcher};
use skratime::queue::{SqlQueue, ARTICLE_QUEUE};
use skratime::speech::{HttpSpeechSynthesizer, ObjectStorage};
use skratime::web::WebServer;
use skratime::{Config, Database};

#[tokio::main]
async fn main() {
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = skratime::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        skratime::logging::init_console_only(&config.logging.level);
    }

    info!("Skratime News backend");

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> skratime::Result<()> {
    config.validate()?;

    let db = Database::open_with_max_connections(
        &config.database.path,
        config.database.max_connections,
    )
    .await?;
    let queue = Arc::new(SqlQueue::new(
        db.pool().clone(),
        ARTICLE_QUEUE,
        config.queue.visibility_timeout_secs,
    ));

    if config.feed.enabled {
        let fetcher = Arc::new(RssFetcher::new(&config.feed)?);
        let ingestor = FeedIngestor::new(
            db.pool().clone(),
            fetcher,
            queue.clone(),
            config.feed.clone(),
        );
        start_feed_updater(FeedUpdater::new(ingestor, config.feed.update_interval_secs));
    } else {
        info!("Feed updater disabled");
    }

    if config.llm.enabled {
        let model = Arc::new(HttpTextModel::new(&config.llm)?);
        let categorizer = Categorizer::new(
            db.pool().clone(),
            model,
            queue.clone(),
            config.queue.max_receive_count,
        );
        start_categorizer_worker(CategorizerWorker::new(
            categorizer,
            config.queue.batch_size,
            config.queue.poll_interval_secs,
        ));
    } else {
        info!("Categorizer disabled");
    }

    let storage = ObjectStorage::new(
        &config.storage.path,
        &config.storage.signing_secret,
        &config.web.public_base_url,
        config.storage.url_expiry_secs,
    )?;
    let synthesizer = Arc::new(HttpSpeechSynthesizer::new(&config.speech)?);

    let server = WebServer::new(&config, db, storage, synthesizer)?;
    info!("Server configured on {}", server.addr());
    server.run().await?;
    Ok(())
}
