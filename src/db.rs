// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::{anyhow, Result};
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::deadpool::{Object, Pool, PoolError};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use crate::config::DatabaseConfig;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection = Object<AsyncPgConnection>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Connection pool for the PostgreSQL backend
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Build the pool, check connectivity and apply pending migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);

        let pool = DbPool::builder(manager)
            .max_size(config.max_connections)
            .build()?;

        let db = Self { pool };

        let _conn = db.get_connection().await?;
        info!("Successfully connected to the database");

        run_migrations(config.url.clone()).await?;

        Ok(db)
    }

    /// Get a database connection from the pool
    pub async fn get_connection(&self) -> Result<DbConnection, PoolError> {
        self.pool.get().await
    }
}

/// Migrations run over a blocking connection, off the async workers
async fn run_migrations(url: String) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = PgConnection::establish(&url)?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("Failed to apply migrations: {}", e))?;
        info!("Database migrations applied successfully ({} new)", applied.len());
        Ok(())
    })
    .await?
}
