use crate::commands::scenarios::Scenario;
use clap::{Parser, Subcommand, ValueEnum};
use rusty_query::context::{Context, ServerParams};
use rusty_query::Dialect;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates a context.
    ///
    /// Contexts hold the connection settings of a database, so the sql and run commands know
    /// which dialect to use and where to connect.
    CreateContext(ContextParams),
    /// Selects an existing context.
    UseContext { name: String },
    /// List available contexts.
    ListContexts,
    /// Prints the SQL a scenario runs, for the dialect of the current context.
    Sql { scenario: Scenario },
    /// Runs a scenario against freshly seeded data and prints the results as JSON.
    ///
    /// SQLite contexts run in memory. Other databases are asked for a password, and should be
    /// scratch databases: the schema is created and the demo data inserted on every run.
    Run { scenario: Scenario },
}

#[derive(clap::Args, Debug)]
pub struct ContextParams {
    /// You can reuse your context by referencing this name
    name: String,

    /// Database type
    #[arg(value_enum, long = "type")]
    db_type: DBType,
    /// Hostname or ip address of the database server (without the port number)
    #[arg(long = "host", default_value = "localhost")]
    hostname_or_ip: String,
    /// Port number of the database server, the default port of the database type if missing
    #[arg(short, long)]
    port: Option<u16>,
    /// Username
    #[arg(short, long, default_value = "")]
    username: String,
    /// Database. For SQLite, the database file.
    #[arg(short, long)]
    database: String,
    /// Use the new context
    #[arg(long = "use")]
    pub use_it: bool,
}

#[derive(Debug, ValueEnum, Clone, Copy)]
pub enum DBType {
    Sqlite,
    MariaDB,
    PostgresSQL,
}

impl From<ContextParams> for Context {
    fn from(value: ContextParams) -> Self {
        let db_type: Dialect = value.db_type.into();

        Context {
            name: value.name.into(),
            server_params: ServerParams {
                db_type,
                hostname: value.hostname_or_ip,
                port: value.port.unwrap_or_else(|| default_port(db_type)),
                user: value.username,
                database: value.database,
            },
        }
    }
}

fn default_port(dialect: Dialect) -> u16 {
    match dialect {
        Dialect::Sqlite => 0,
        Dialect::MariaDB => 3306,
        Dialect::PostgresSQL => 5432,
    }
}

impl From<DBType> for Dialect {
    fn from(value: DBType) -> Self {
        match value {
            DBType::Sqlite => Self::Sqlite,
            DBType::MariaDB => Self::MariaDB,
            DBType::PostgresSQL => Self::PostgresSQL,
        }
    }
}
