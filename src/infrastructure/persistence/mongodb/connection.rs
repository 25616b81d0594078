//! MongoDB connection management
//!
//! The `MongoConnection` wrapper holds the database handle and hands out
//! typed collections to the repositories.

use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::sync::Arc;
use std::time::Duration;

/// MongoDB connection wrapper.
pub struct MongoConnection {
    database: Database,
}

impl MongoConnection {
    /// Create a new MongoDB connection.
    ///
    /// `timeout` bounds both the initial connection and server selection, so
    /// every later store call fails fast instead of hanging.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The URI is invalid
    /// - Connection cannot be established within timeout
    /// - Database ping fails
    pub async fn new(uri: &str, db_name: &str, timeout: Duration) -> anyhow::Result<Self> {
        let options = Self::create_client_options(uri, timeout).await?;
        let client = Client::with_options(options)?;
        let database = client.database(db_name);

        // Ping to verify connection is actually working
        database
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await?;

        tracing::info!("Connected to MongoDB: {}", db_name);

        Ok(Self { database })
    }

    /// Get a typed collection from the database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> mongodb::Collection<T> {
        self.database.collection(name)
    }

    async fn create_client_options(uri: &str, timeout: Duration) -> anyhow::Result<ClientOptions> {
        let mut options = ClientOptions::parse(uri).await?;
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        Ok(options)
    }
}

/// Initialize MongoDB connection and return a shared reference.
pub async fn init_mongodb(
    uri: &str,
    db_name: &str,
    timeout: Duration,
) -> anyhow::Result<Arc<MongoConnection>> {
    let conn = Arc::new(MongoConnection::new(uri, db_name, timeout).await?);
    Ok(conn)
}
