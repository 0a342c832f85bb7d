use crate::engine::rendering::Dialect;
use crate::engine::value::Value;
use crate::error::Error;
use std::fmt::{Display, Formatter};

pub mod querying;

/// Parameterised SQL, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Column label and value pairs, in selection order.
pub type Row = Vec<(String, Value)>;

/// A blocking connection to a database.
pub trait Gateway {
    fn dialect(&self) -> Dialect;

    fn query(&self, statement: &Statement) -> Result<Vec<Row>, Error>;

    /// Runs a statement that returns no rows, handing back the number of affected rows.
    fn execute(&self, statement: &Statement) -> Result<u64, Error>;
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{};", self.sql)
    }
}
