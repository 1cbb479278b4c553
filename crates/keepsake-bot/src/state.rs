//! Application state wiring the engine to its infrastructure.
//!
//! The engine is generic over its store and platform ports; AppState pins
//! them to SQLite and the console gateway.

use std::path::PathBuf;
use std::sync::Arc;

use keepsake_core::platform::BoxPlatform;
use keepsake_core::registry::{CallbackRegistries, CommandModule};
use keepsake_core::repository::BoxSessionStore;
use keepsake_core::session::{InteractionRouter, SessionManager};
use keepsake_core::views::leveling::LevelingModule;
use keepsake_infra::config::database_url;
use keepsake_infra::console::ConsolePlatform;
use keepsake_infra::sqlite::pool::DatabasePool;
use keepsake_infra::sqlite::session::SqliteSessionStore;
use keepsake_types::config::BotConfig;

/// File holding the console gateway's rendered messages between runs.
const CONSOLE_STATE_FILE: &str = "console.json";

/// Shared state for the CLI commands and the serve loop.
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub store: Arc<SqliteSessionStore>,
    pub platform: Arc<ConsolePlatform>,
    pub router: InteractionRouter,
    modules: Arc<Vec<Box<dyn CommandModule>>>,
}

impl AppState {
    /// Connect to the database, open the console gateway and load the
    /// command modules.
    pub async fn init(data_dir: PathBuf, config: BotConfig) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&database_url(&config, &data_dir)).await?;
        let store = Arc::new(SqliteSessionStore::new(db_pool));
        let platform = Arc::new(ConsolePlatform::open(data_dir.join(CONSOLE_STATE_FILE)).await?);

        let manager = SessionManager::new(
            BoxSessionStore::from_arc(store.clone()),
            BoxPlatform::from_arc(platform.clone()),
            config,
        );

        let registries = Arc::new(CallbackRegistries::new());
        let modules: Vec<Box<dyn CommandModule>> = vec![Box::new(LevelingModule)];
        for module in &modules {
            module.on_load(&registries)?;
            tracing::debug!(module = module.name(), "command module loaded");
        }

        Ok(Self {
            data_dir,
            store,
            platform,
            router: InteractionRouter::new(manager, registries),
            modules: Arc::new(modules),
        })
    }

    pub fn manager(&self) -> &SessionManager {
        self.router.manager()
    }

    /// Remove every module's handlers from the registries.
    pub fn unload_modules(&self) {
        for module in self.modules.iter() {
            if let Err(err) = module.on_unload(self.router.registries()) {
                tracing::warn!(module = module.name(), error = %err, "failed to unload module");
            }
        }
    }
}
