/// Maps descriptors to entity tables and relations.
pub mod entity;
/// Typed expressions and predicates.
pub mod expression;
/// Turns rows into scalars, tuples, entities and records.
pub mod mapping;
pub mod query_builder;
/// Renders descriptors as parameterised SQL.
pub mod rendering;
pub mod session;
/// Talks to the database.
pub mod sql;
pub mod value;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Comparison {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LesserThan,
    LesserOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

/// Where NULLs go when sorting. `Default` leaves it to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrdering {
    #[default]
    Default,
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    /// Theta joins: a cross product filtered in the WHERE clause. These can't be outer joins.
    Cross,
}

/// Whether a numeric expression holds whole numbers or floating point ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum(NumericKind),
    Avg,
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    /// Integer division truncates on every backend.
    Divide(NumericKind),
}
