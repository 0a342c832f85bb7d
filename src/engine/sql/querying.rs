mod mariadb;
mod postgres;
mod sqlite;

use crate::context::ServerParams;
use crate::engine::rendering::Dialect;
use crate::engine::sql::{Gateway, Row, Statement};
use crate::Error;
use async_trait::async_trait;
use log::{debug, info, trace};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{MySql as MariaDB, MySqlPool, Pool, Postgres, Sqlite};
use std::str::FromStr;
use tokio::runtime::{Builder, Runtime};

/// The async side of a database connection, one implementation per backend.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<Row>, Error>;

    async fn execute(&self, statement: &Statement) -> Result<u64, Error>;

    async fn close(&self);
}

pub struct Connection<T> {
    pool: T,
}

pub async fn sqlite(url: &str) -> Result<Connection<Pool<Sqlite>>, Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // In-memory databases live and die with their connection, so there must be exactly one and it
    // must never be recycled.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(Connection { pool })
}

pub async fn postgres(
    server_params: &ServerParams,
    password: &str,
) -> Result<Connection<Pool<Postgres>>, Error> {
    let pool = PgPoolOptions::new()
        .connect(&format!(
            "postgres://{user}:{password}@{host}:{port}/{catalog}",
            user = &server_params.user,
            host = &server_params.hostname,
            port = &server_params.port,
            catalog = &server_params.database,
        ))
        .await?;

    Ok(Connection { pool })
}

pub async fn mariadb(
    server_params: &ServerParams,
    password: &str,
) -> Result<Connection<Pool<MariaDB>>, Error> {
    let pool = MySqlPool::connect(&format!(
        "mariadb://{user}:{password}@{host}:{port}/{db_name}",
        user = &server_params.user,
        host = &server_params.hostname,
        port = &server_params.port,
        db_name = &server_params.database,
    ))
    .await?;

    Ok(Connection { pool })
}

/// Runs an async [Driver] to completion on its own runtime.
///
/// sqlx is exclusively async, the rest of the crate is not.
pub struct BlockingGateway {
    dialect: Dialect,
    driver: Box<dyn Driver>,
    runtime: Runtime,
}

fn runtime() -> Result<Runtime, Error> {
    Ok(Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?)
}

impl BlockingGateway {
    pub fn sqlite_in_memory() -> Result<Self, Error> {
        BlockingGateway::sqlite("sqlite::memory:")
    }

    /// Opens a SQLite database, creating the file if needed.
    pub fn sqlite(url: &str) -> Result<Self, Error> {
        let runtime = runtime()?;
        let connection = runtime.block_on(sqlite(url))?;
        info!("connected to {url}");

        Ok(BlockingGateway {
            dialect: Dialect::Sqlite,
            driver: Box::new(connection),
            runtime,
        })
    }

    /// Connects to the server described by a context. For SQLite, the database is the file name.
    pub fn connect(server_params: &ServerParams, password: &str) -> Result<Self, Error> {
        let runtime = runtime()?;

        let driver: Box<dyn Driver> = match server_params.db_type {
            Dialect::PostgresSQL => Box::new(runtime.block_on(postgres(server_params, password))?),
            Dialect::MariaDB => Box::new(runtime.block_on(mariadb(server_params, password))?),
            Dialect::Sqlite => {
                let url = format!("sqlite://{}", server_params.database);
                Box::new(runtime.block_on(sqlite(&url))?)
            }
        };

        info!("connected to {server_params}");

        Ok(BlockingGateway {
            dialect: server_params.db_type,
            driver,
            runtime,
        })
    }
}

impl Gateway for BlockingGateway {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>, Error> {
        debug!("{}", statement.sql);
        trace!("parameters: {:?}", statement.params);

        let rows = self.runtime.block_on(self.driver.fetch_rows(statement))?;
        trace!("{} rows", rows.len());

        Ok(rows)
    }

    fn execute(&self, statement: &Statement) -> Result<u64, Error> {
        debug!("{}", statement.sql);
        trace!("parameters: {:?}", statement.params);

        let affected = self.runtime.block_on(self.driver.execute(statement))?;
        trace!("{affected} rows affected");

        Ok(affected)
    }
}

impl Drop for BlockingGateway {
    fn drop(&mut self) {
        self.runtime.block_on(self.driver.close());
    }
}
