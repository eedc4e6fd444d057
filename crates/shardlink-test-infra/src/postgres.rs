use crate::{Result, TestInfraError};
use sqlx::{Connection, Executor, PgConnection};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const READY: &str = "database system is ready to accept connections";

#[derive(TypedBuilder)]
pub struct PostgresConfig {
    #[builder(default = "shardlink".to_string())]
    database: String,
    #[builder(default = "shardlink".to_string())]
    username: String,
    #[builder(default = "shardlink".to_string())]
    password: String,
}

/// Test fixture for a disposable PostgreSQL server.
///
/// One server can host several shard databases; see
/// [`PostgresServer::create_database`].
pub struct PostgresServer {
    container: ContainerAsync<GenericImage>,
    config: PostgresConfig,
}

impl PostgresServer {
    /// Starts a PostgreSQL container suitable for integration tests.
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        // The entrypoint starts a temporary server for initdb before the real
        // one, so the ready line shows up on both streams.
        let container = GenericImage::new("postgres", "16-alpine")
            .with_exposed_port(5432_u16.tcp())
            .with_wait_for(WaitFor::message_on_stdout(READY))
            .with_wait_for(WaitFor::message_on_stderr(READY))
            .with_env_var("POSTGRES_DB", config.database.as_str())
            .with_env_var("POSTGRES_USER", config.username.as_str())
            .with_env_var("POSTGRES_PASSWORD", config.password.as_str())
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        let host = self.container.get_host().await?.to_string();
        Ok(match host.as_str() {
            "localhost" => String::from("127.0.0.1"),
            _ => host,
        })
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(5432).await?)
    }

    /// URL of the database created at startup.
    pub async fn database_url(&self) -> Result<String> {
        self.database_url_for(&self.config.database).await
    }

    pub async fn database_url_for(&self, database: &str) -> Result<String> {
        let host = self.host().await?;
        let port = self.port().await?;
        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, database
        ))
    }

    /// Creates an empty database on this server and returns its URL.
    pub async fn create_database(&self, database: &str) -> Result<String> {
        let mut conn = self.connect_with_retry().await?;
        (&mut conn)
            .execute(format!("CREATE DATABASE \"{database}\"").as_str())
            .await?;
        conn.close().await?;

        self.database_url_for(database).await
    }

    /// Returns the underlying container reference.
    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        &self.container
    }

    async fn connect_with_retry(&self) -> Result<PgConnection> {
        let url = self.database_url().await?;
        let mut last_error = None;

        for _ in 0..20 {
            match PgConnection::connect(&url).await {
                Ok(conn) => return Ok(conn),
                Err(err) => {
                    last_error = Some(err);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }

        Err(TestInfraError::NotReady {
            service: "postgres",
            reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
