pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use std::sync::Arc;

use historia_core::{BadgeRules, Catalog};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Settings;
use crate::db::Database;
use crate::services::locks::EntityLocks;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub catalog: Arc<Catalog>,
    pub badges: Arc<BadgeRules>,
    pub locks: Arc<EntityLocks>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Badge thresholds follow the size of the loaded catalog.
    pub fn new(db: Database, catalog: Catalog, settings: Settings) -> Self {
        let badges = catalog.badge_rules();
        Self {
            db: Arc::new(db),
            catalog: Arc::new(catalog),
            badges: Arc::new(badges),
            locks: Arc::new(EntityLocks::new()),
            settings: Arc::new(settings),
        }
    }
}

/// Install the global tracing subscriber (RUST_LOG, default "info").
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Load configuration, the catalog and the database pool.
pub async fn bootstrap() -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = Settings::from_env()?;
    let catalog = settings.load_catalog()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&settings.database_url, settings.max_connections).await?;

    tracing::info!(
        lessons = catalog.lesson_count(),
        figures = catalog.figures().len(),
        pk_questions = settings.pk_question_count,
        "Service state ready"
    );

    Ok(AppState::new(db, catalog, settings))
}
