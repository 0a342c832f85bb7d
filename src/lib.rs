//! A typed query builder over the `member` / `team` schema.
//!
//! Expressions are built from entity paths (`QMember`, `QTeam`), composed into immutable
//! [Query] descriptors, translated into parameterised SQL for one of the supported dialects and
//! executed through a [Session]. Rows come back as scalars, [Tuple]s, entities or records.
//!
//! ```no_run
//! use rusty_query::domain::QMember;
//! use rusty_query::{select_from, BlockingGateway, Session};
//!
//! # fn main() -> Result<(), rusty_query::Error> {
//! let session = Session::new(BlockingGateway::sqlite_in_memory()?);
//! session.create_schema()?;
//!
//! let member = QMember::member();
//! let adults = select_from(&member)
//!     .filter(member.age.goe(18))
//!     .fetch(&session)?;
//! # Ok(())
//! # }
//! ```
pub mod cache;
pub mod context;
pub mod domain;
mod engine;
mod error;

pub use engine::entity::{ColumnDef, ColumnType, Entity, EntityPath, EntityRecord, Relation, RelationPath};
pub use engine::expression::case::case;
pub use engine::expression::template::template;
pub use engine::expression::{
    and, constant, literal, or, Comparable, Expr, ExprNode, IntoExpr, Numeric, Predicate,
    PredicateBuilder,
};
pub use engine::mapping::record::{bean, constructor, fields, Bindings, Record, RecordProjection};
pub use engine::mapping::{Hydration, OptionalEntity, Projection, RowReader, Tuple, TupleProjection};
pub use engine::query_builder::{
    delete, select, select_from, update, Delete, Order, Query, QueryDescriptor, Update,
};
pub use engine::rendering::Dialect;
pub use engine::session::Session;
pub use engine::sql::querying::BlockingGateway;
pub use engine::sql::{Gateway, Row, Statement};
pub use engine::value::{FromValue, Value};
pub use engine::{
    AggregateFunction, ArithmeticOperator, Comparison, JoinType, NullOrdering, NumericKind,
    OrderDirection,
};
pub use error::{Error, ErrorKind, InternalError};
