pub mod adapter;
pub mod application;
pub mod domain;
pub mod infrastructure;

use application::service::{GroupService, RaffleService};
use domain::repository::{AssignmentRepository, GroupRepository};
use infrastructure::config::{StorageConfig, StorageType};
use infrastructure::persistence;

pub type DynGroupRepository = Box<dyn GroupRepository>;
pub type DynAssignmentRepository = Box<dyn AssignmentRepository>;

/// Services wired to the configured storage backend
pub struct App {
    pub groups: GroupService<DynGroupRepository>,
    pub raffles: RaffleService<DynGroupRepository, DynAssignmentRepository>,
}

/// Storage backend holder
struct StorageBackend {
    group_repo: DynGroupRepository,
    raffle_group_repo: DynGroupRepository,
    assignment_repo: DynAssignmentRepository,
}

/// Initialize storage based on configuration
async fn init_storage(config: &StorageConfig) -> anyhow::Result<StorageBackend> {
    match config.storage_type {
        StorageType::Sqlite => {
            tracing::info!("Using SQLite storage backend");
            let db = persistence::sqlite::init_database(&config.sqlite.effective_path())?;

            use persistence::sqlite::{SqliteAssignmentRepository, SqliteGroupRepository};

            Ok(StorageBackend {
                group_repo: Box::new(SqliteGroupRepository::new(db.clone())),
                raffle_group_repo: Box::new(SqliteGroupRepository::new(db.clone())),
                assignment_repo: Box::new(SqliteAssignmentRepository::new(db)),
            })
        }
        StorageType::Mongodb => {
            tracing::info!("Using MongoDB storage backend");

            let mongo_config = &config.mongodb;
            let conn = persistence::mongodb::init_mongodb(
                &mongo_config.uri,
                &mongo_config.database,
                mongo_config.timeout()?,
            )
            .await?;

            use persistence::mongodb::{MongoAssignmentRepository, MongoGroupRepository};

            Ok(StorageBackend {
                group_repo: Box::new(MongoGroupRepository::new(conn.clone())),
                raffle_group_repo: Box::new(MongoGroupRepository::new(conn.clone())),
                assignment_repo: Box::new(MongoAssignmentRepository::new(conn)),
            })
        }
    }
}

impl App {
    pub async fn from_config(config: &StorageConfig) -> anyhow::Result<Self> {
        let storage = init_storage(config).await?;

        Ok(Self {
            groups: GroupService::new(storage.group_repo),
            raffles: RaffleService::new(storage.raffle_group_repo, storage.assignment_repo),
        })
    }
}
