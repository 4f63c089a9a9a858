//! PostgreSQL test containers
//!
//! Each `TestDatabase` owns a throwaway `postgres:16-alpine` container with
//! the workspace migrations applied. The container stops when the value is
//! dropped. Tests using it need Docker and are marked `#[ignore]`.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use uuid::Uuid;

const IMAGE: (&str, &str) = ("postgres", "16-alpine");
const USER: &str = "premium";
const PASSWORD: &str = "premium";
const DATABASE: &str = "calculations_test";
const READY_MESSAGE: &str = "database system is ready to accept connections";

/// Boxed error used by the container helpers
pub type TestDbError = Box<dyn std::error::Error + Send + Sync>;

/// Builds the connection URL for a container mapped to `host:port`
pub fn connection_url(host: &str, port: u16) -> String {
    format!("postgres://{USER}:{PASSWORD}@{host}:{port}/{DATABASE}")
}

/// A migrated PostgreSQL database running in a container
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    url: String,
    pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies the migrations
    pub async fn start() -> Result<Self, TestDbError> {
        let container = GenericImage::new(IMAGE.0, IMAGE.1)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(READY_MESSAGE))
            .with_env_var("POSTGRES_USER", USER)
            .with_env_var("POSTGRES_PASSWORD", PASSWORD)
            .with_env_var("POSTGRES_DB", DATABASE)
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(5432).await?;
        let url = connection_url(&host, port);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;

        Ok(Self {
            _container: container,
            url,
            pool,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Deletes every calculation and address row
    pub async fn reset(&self) -> Result<(), sqlx::Error> {
        sqlx::query("TRUNCATE TABLE calculation_addresses, insurance_calculations")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Counts address rows for a calculation, deleted or not
    pub async fn address_rows(&self, calculation_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM calculation_addresses WHERE calculation_id = $1")
            .bind(calculation_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Reads the raw deletion marker of a calculation row
    pub async fn is_marked_deleted(&self, calculation_id: Uuid) -> Result<Option<bool>, sqlx::Error> {
        sqlx::query_scalar("SELECT deleted_at IS NOT NULL FROM insurance_calculations WHERE id = $1")
            .bind(calculation_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Adds a check constraint that fails every address insert for `city`
    pub async fn reject_addresses_in(&self, city: &str) -> Result<(), sqlx::Error> {
        let statement = format!(
            "ALTER TABLE calculation_addresses ADD CONSTRAINT test_rejected_city CHECK (city <> '{}')",
            city.replace('\'', "''")
        );
        sqlx::query(&statement).execute(&self.pool).await?;
        Ok(())
    }
}

/// Starts a dedicated database for one test
pub async fn create_isolated_test_database() -> Result<TestDatabase, TestDbError> {
    TestDatabase::start().await
}
