use crate::engine::expression::template::Rule;
use std::env::VarError;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(value: E) -> Self {
        Error(Box::new(value.into()))
    }
}

#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum ErrorKind {
    /// A fetch_one() matched more than a single row.
    #[error("Query returned more than one row, but at most one was expected")]
    NonUniqueResult,
    /// Constructor binding needs exactly as many selections as the constructor takes.
    #[error("Constructor binding takes {expected} arguments, but the projection selects {found}")]
    ProjectionArity { expected: usize, found: usize },
    /// The database refused a write because of a unique, foreign key, not null or check
    /// constraint.
    #[error("The database rejected the write:\n{0}")]
    ConstraintViolation(sqlx::Error),
    #[error("Could not talk to the database:\n{0}")]
    Connection(sqlx::Error),
    /// The query descriptor cannot be turned into SQL.
    #[error("Cannot translate query: {0}")]
    Translation(String),
    #[error("Error trying to query database:\n{0}")]
    Database(sqlx::Error),
    #[error("Cannot decode value: {0}")]
    Decode(String),
    #[error("Invalid template syntax, failed to parse:\n{0}")]
    TemplateSyntax(#[from] PestError),
    #[error("Internal error:\n{0}")]
    InternalError(#[from] InternalError),
    #[error("Could not find environment variable: \n{0}")]
    EnvVarError(#[from] VarError),
    #[error("IO error:\n{0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error:\n{0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Error reading data from stdin")]
    DialogueError(#[from] dialoguer::Error),
}

pub type PestError = pest::error::Error<Rule>;

#[derive(Error, Debug)]
pub struct InternalError(pub String);

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<sqlx::Error> for ErrorKind {
    fn from(error: sqlx::Error) -> Self {
        if is_constraint_violation(&error) {
            ErrorKind::ConstraintViolation(error)
        } else if is_transport_failure(&error) {
            ErrorKind::Connection(error)
        } else {
            ErrorKind::Database(error)
        }
    }
}

fn is_constraint_violation(error: &sqlx::Error) -> bool {
    use sqlx::error::ErrorKind as DbErrorKind;

    match error {
        sqlx::Error::Database(database_error) => matches!(
            database_error.kind(),
            DbErrorKind::UniqueViolation
                | DbErrorKind::ForeignKeyViolation
                | DbErrorKind::NotNullViolation
                | DbErrorKind::CheckViolation
        ),
        _ => false,
    }
}

fn is_transport_failure(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn into_inner(self) -> ErrorKind {
        *self.0
    }

    pub(crate) fn translation(message: impl Into<String>) -> Self {
        ErrorKind::Translation(message.into()).into()
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        ErrorKind::Decode(message.into()).into()
    }
}
