use crate::engine::NumericKind;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The SQL flavours the renderer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Sqlite,
    MariaDB,
    PostgresSQL,
}

impl Dialect {
    /// Placeholder for the n-th parameter, counting from 1.
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Dialect::Sqlite | Dialect::MariaDB => "?".to_string(),
            Dialect::PostgresSQL => format!("${position}"),
        }
    }

    pub(crate) fn text_type(&self) -> &'static str {
        match self {
            Dialect::Sqlite | Dialect::PostgresSQL => "TEXT",
            Dialect::MariaDB => "CHAR",
        }
    }

    /// What SUM() and AVG() results get cast to, so every backend hands back the same types.
    pub(crate) fn sum_cast(&self, kind: NumericKind) -> Option<&'static str> {
        match (self, kind) {
            (Dialect::Sqlite, _) => None,
            (Dialect::MariaDB, NumericKind::Integer) => Some("SIGNED"),
            (Dialect::PostgresSQL, NumericKind::Integer) => Some("BIGINT"),
            (_, NumericKind::Real) => self.avg_cast(),
        }
    }

    pub(crate) fn avg_cast(&self) -> Option<&'static str> {
        match self {
            Dialect::Sqlite => None,
            Dialect::MariaDB => Some("DOUBLE"),
            Dialect::PostgresSQL => Some("DOUBLE PRECISION"),
        }
    }

    /// MariaDB turns `/` over integers into DECIMAL, `DIV` keeps them integers.
    pub(crate) fn division(&self, kind: NumericKind) -> &'static str {
        match (self, kind) {
            (Dialect::MariaDB, NumericKind::Integer) => " DIV ",
            _ => " / ",
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "SQLite"),
            Dialect::MariaDB => write!(f, "MariaDB"),
            Dialect::PostgresSQL => write!(f, "PostgreSQL"),
        }
    }
}
