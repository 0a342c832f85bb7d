//! Named connection settings, so the CLI doesn't need them on every call.
use crate::cache;
use crate::cache::SharedCacheKey;
use crate::engine::rendering::Dialect;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub name: ContextName,
    pub server_params: ServerParams,
}

/// Where the database is. Passwords are never saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerParams {
    pub db_type: Dialect,
    pub hostname: String,
    pub port: u16,
    pub user: String,
    /// The database to use. For SQLite, the path to the database file.
    pub database: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContextName(String);

impl ContextName {
    pub fn current() -> Result<ContextName, crate::Error> {
        cache::read(&SharedCacheKey::of::<ContextName>())
    }
}

impl ServerParams {
    pub fn needs_password(&self) -> bool {
        self.db_type != Dialect::Sqlite
    }
}

impl From<String> for ContextName {
    fn from(value: String) -> Self {
        ContextName(value)
    }
}

impl From<&str> for ContextName {
    fn from(value: &str) -> Self {
        ContextName(value.to_string())
    }
}

impl From<ContextName> for String {
    fn from(value: ContextName) -> Self {
        value.0
    }
}

impl Display for ContextName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ServerParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.db_type {
            Dialect::Sqlite => write!(f, "sqlite:{}", self.database),
            _ => write!(
                f,
                "{}@{}:{}/{} ({})",
                self.user, self.hostname, self.port, self.database, self.db_type
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_params_display_without_a_password() {
        let params = ServerParams {
            db_type: Dialect::MariaDB,
            hostname: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            database: "study".to_string(),
        };

        assert_eq!(params.to_string(), "root@localhost:3306/study (MariaDB)");
        assert!(params.needs_password());
    }

    #[test]
    fn contexts_survive_a_round_trip_through_json() {
        let context = Context {
            name: "local".into(),
            server_params: ServerParams {
                db_type: Dialect::Sqlite,
                hostname: String::new(),
                port: 0,
                user: String::new(),
                database: "study.db".to_string(),
            },
        };

        let json = serde_json::to_string(&context).unwrap();
        let read: Context = serde_json::from_str(&json).unwrap();

        assert_eq!(read.name, context.name);
        assert_eq!(read.server_params, context.server_params);
    }
}
