//! Typed expressions.
//!
//! Everything here is a value: building `member.age.gt(18)` never touches the column handle it
//! started from, it returns a new [Predicate]. Typing lives in the [Expr] wrapper only, the
//! untyped [ExprNode] tree is what the renderer walks.
use crate::engine::expression::case::SimpleCaseWhen;
use crate::engine::expression::template::Template;
use crate::engine::query_builder::{Order, Query, QueryDescriptor};
use crate::engine::value::Value;
use crate::engine::{
    AggregateFunction, ArithmeticOperator, Comparison, NullOrdering, NumericKind, OrderDirection,
};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

pub mod case;
pub mod template;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub alias: String,
    pub column: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    Column(ColumnRef),
    Literal(Value),
    Arithmetic {
        left: Box<ExprNode>,
        operator: ArithmeticOperator,
        right: Box<ExprNode>,
    },
    Concat(Box<ExprNode>, Box<ExprNode>),
    Lower(Box<ExprNode>),
    Upper(Box<ExprNode>),
    CastToText(Box<ExprNode>),
    Aggregate {
        function: AggregateFunction,
        argument: Box<ExprNode>,
    },
    /// Branches are checked in order, the first one that matches wins.
    Case {
        branches: Vec<(Condition, ExprNode)>,
        otherwise: Box<ExprNode>,
    },
    Subquery(Box<QueryDescriptor>),
    Template {
        template: Template,
        arguments: Vec<ExprNode>,
    },
    /// Names an expression so records can bind it to a property. Renders as the inner node.
    Aliased { node: Box<ExprNode>, alias: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        left: ExprNode,
        comparison: Comparison,
        right: ExprNode,
    },
    Between {
        operand: ExprNode,
        low: ExprNode,
        high: ExprNode,
    },
    In {
        operand: ExprNode,
        values: Vec<ExprNode>,
    },
    InSubquery {
        operand: ExprNode,
        subquery: Box<QueryDescriptor>,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

/// An expression whose SQL result maps to `T`.
pub struct Expr<T> {
    node: ExprNode,
    marker: PhantomData<fn() -> T>,
}

/// A boolean expression. Absent predicates are spelled `Option<Predicate>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate(pub(crate) Condition);

/// Anything that can stand on the right-hand side of an expression producing `T`: literals,
/// other expressions of a comparable type, and single column subqueries.
pub trait IntoExpr<T> {
    fn into_expr_node(self) -> ExprNode;
}

/// Marks which expression types can be compared with each other.
pub trait Comparable<T> {}

impl Comparable<i64> for i64 {}
impl Comparable<f64> for i64 {}
impl Comparable<i64> for f64 {}
impl Comparable<f64> for f64 {}
impl Comparable<String> for String {}
impl Comparable<bool> for bool {}

pub trait Numeric {
    /// What SUM() over this type produces.
    type Sum;

    const KIND: NumericKind;
}

impl Numeric for i64 {
    type Sum = i64;

    const KIND: NumericKind = NumericKind::Integer;
}

impl Numeric for f64 {
    type Sum = f64;

    const KIND: NumericKind = NumericKind::Real;
}

impl ExprNode {
    /// The property name used when binding this expression to a record.
    pub fn name(&self) -> Option<&str> {
        match self {
            ExprNode::Column(column) => Some(column.column),
            ExprNode::Aliased { alias, .. } => Some(alias.as_str()),
            _ => None,
        }
    }

    /// True if an aggregate function is applied somewhere outside of nested subqueries.
    pub fn is_aggregate(&self) -> bool {
        match self {
            ExprNode::Aggregate { .. } => true,
            ExprNode::Column(_) | ExprNode::Literal(_) | ExprNode::Subquery(_) => false,
            ExprNode::Arithmetic { left, right, .. } | ExprNode::Concat(left, right) => {
                left.is_aggregate() || right.is_aggregate()
            }
            ExprNode::Lower(inner)
            | ExprNode::Upper(inner)
            | ExprNode::CastToText(inner)
            | ExprNode::Aliased { node: inner, .. } => inner.is_aggregate(),
            ExprNode::Case {
                branches,
                otherwise,
            } => otherwise.is_aggregate() || branches.iter().any(|(_, node)| node.is_aggregate()),
            ExprNode::Template { arguments, .. } => arguments.iter().any(ExprNode::is_aggregate),
        }
    }

    /// True if a column is referenced outside of aggregates and subqueries.
    pub fn has_bare_column(&self) -> bool {
        match self {
            ExprNode::Column(_) => true,
            ExprNode::Literal(_) | ExprNode::Subquery(_) | ExprNode::Aggregate { .. } => false,
            ExprNode::Arithmetic { left, right, .. } | ExprNode::Concat(left, right) => {
                left.has_bare_column() || right.has_bare_column()
            }
            ExprNode::Lower(inner)
            | ExprNode::Upper(inner)
            | ExprNode::CastToText(inner)
            | ExprNode::Aliased { node: inner, .. } => inner.has_bare_column(),
            ExprNode::Case {
                branches,
                otherwise,
            } => {
                otherwise.has_bare_column()
                    || branches.iter().any(|(condition, node)| {
                        node.has_bare_column() || condition.has_bare_column()
                    })
            }
            ExprNode::Template { arguments, .. } => arguments.iter().any(ExprNode::has_bare_column),
        }
    }
}

impl Condition {
    fn has_bare_column(&self) -> bool {
        match self {
            Condition::Compare { left, right, .. } => left.has_bare_column() || right.has_bare_column(),
            Condition::Between { operand, low, high } => {
                operand.has_bare_column() || low.has_bare_column() || high.has_bare_column()
            }
            Condition::In { operand, values } => {
                operand.has_bare_column() || values.iter().any(ExprNode::has_bare_column)
            }
            Condition::InSubquery { operand, .. } => operand.has_bare_column(),
            Condition::And(conditions) | Condition::Or(conditions) => {
                conditions.iter().any(Condition::has_bare_column)
            }
            Condition::Not(condition) => condition.has_bare_column(),
        }
    }

    fn conjunction(left: Condition, right: Condition) -> Condition {
        let mut conditions = match left {
            Condition::And(conditions) => conditions,
            other => vec![other],
        };

        match right {
            Condition::And(more) => conditions.extend(more),
            other => conditions.push(other),
        }

        Condition::And(conditions)
    }

    fn disjunction(left: Condition, right: Condition) -> Condition {
        let mut conditions = match left {
            Condition::Or(conditions) => conditions,
            other => vec![other],
        };

        match right {
            Condition::Or(more) => conditions.extend(more),
            other => conditions.push(other),
        }

        Condition::Or(conditions)
    }
}

impl<T> Expr<T> {
    pub(crate) fn from_node(node: ExprNode) -> Self {
        Expr {
            node,
            marker: PhantomData,
        }
    }

    /// A column of the entity aliased `alias`.
    pub fn column(alias: &str, column: &'static str) -> Self {
        Expr::from_node(ExprNode::Column(ColumnRef {
            alias: alias.to_string(),
            column,
        }))
    }

    pub fn node(&self) -> &ExprNode {
        &self.node
    }

    fn boxed(&self) -> Box<ExprNode> {
        Box::new(self.node.clone())
    }

    fn compare(&self, comparison: Comparison, right: impl IntoExpr<T>) -> Predicate {
        Predicate(Condition::Compare {
            left: self.node.clone(),
            comparison,
            right: right.into_expr_node(),
        })
    }

    pub fn eq(&self, right: impl IntoExpr<T>) -> Predicate {
        self.compare(Comparison::Equals, right)
    }

    pub fn ne(&self, right: impl IntoExpr<T>) -> Predicate {
        self.compare(Comparison::NotEquals, right)
    }

    pub fn gt(&self, right: impl IntoExpr<T>) -> Predicate {
        self.compare(Comparison::GreaterThan, right)
    }

    pub fn goe(&self, right: impl IntoExpr<T>) -> Predicate {
        self.compare(Comparison::GreaterOrEqual, right)
    }

    pub fn lt(&self, right: impl IntoExpr<T>) -> Predicate {
        self.compare(Comparison::LesserThan, right)
    }

    pub fn loe(&self, right: impl IntoExpr<T>) -> Predicate {
        self.compare(Comparison::LesserOrEqual, right)
    }

    fn null_check(&self, comparison: Comparison) -> Predicate {
        Predicate(Condition::Compare {
            left: self.node.clone(),
            comparison,
            right: ExprNode::Literal(Value::Null),
        })
    }

    pub fn is_null(&self) -> Predicate {
        self.null_check(Comparison::Equals)
    }

    pub fn is_not_null(&self) -> Predicate {
        self.null_check(Comparison::NotEquals)
    }

    /// Inclusive on both ends.
    pub fn between(&self, low: impl IntoExpr<T>, high: impl IntoExpr<T>) -> Predicate {
        Predicate(Condition::Between {
            operand: self.node.clone(),
            low: low.into_expr_node(),
            high: high.into_expr_node(),
        })
    }

    /// An empty list matches nothing.
    pub fn is_in<I>(&self, values: I) -> Predicate
    where
        I: IntoIterator,
        I::Item: IntoExpr<T>,
    {
        Predicate(Condition::In {
            operand: self.node.clone(),
            values: values.into_iter().map(IntoExpr::into_expr_node).collect(),
        })
    }

    pub fn in_subquery<U>(&self, subquery: &Query<Expr<U>>) -> Predicate
    where
        U: Comparable<T>,
    {
        Predicate(Condition::InSubquery {
            operand: self.node.clone(),
            subquery: Box::new(subquery.descriptor().clone()),
        })
    }

    pub fn asc(&self) -> Order {
        Order::new(self.node.clone(), OrderDirection::Ascending, NullOrdering::Default)
    }

    pub fn desc(&self) -> Order {
        Order::new(self.node.clone(), OrderDirection::Descending, NullOrdering::Default)
    }

    fn aggregate<R>(&self, function: AggregateFunction) -> Expr<R> {
        Expr::from_node(ExprNode::Aggregate {
            function,
            argument: self.boxed(),
        })
    }

    /// Counts non-NULL values.
    pub fn count(&self) -> Expr<i64> {
        self.aggregate(AggregateFunction::Count)
    }

    pub fn max(&self) -> Expr<T> {
        self.aggregate(AggregateFunction::Max)
    }

    pub fn min(&self) -> Expr<T> {
        self.aggregate(AggregateFunction::Min)
    }

    pub fn string_value(&self) -> Expr<String> {
        Expr::from_node(ExprNode::CastToText(self.boxed()))
    }

    /// Names the expression, so bean and field projections can bind it to a property.
    pub fn alias(&self, alias: &str) -> Expr<T> {
        Expr::from_node(ExprNode::Aliased {
            node: self.boxed(),
            alias: alias.to_string(),
        })
    }

    /// The same expression, but projected as `Option<T>` so NULLs don't fail decoding.
    pub fn nullable(&self) -> Expr<Option<T>> {
        Expr::from_node(self.node.clone())
    }

    /// Starts a simple CASE expression over this operand.
    pub fn when(&self, value: impl IntoExpr<T>) -> SimpleCaseWhen<T> {
        SimpleCaseWhen::new(self.node.clone(), value.into_expr_node())
    }
}

impl<T> Expr<T>
where
    T: Numeric,
{
    fn arithmetic(&self, operator: ArithmeticOperator, right: impl IntoExpr<T>) -> Expr<T> {
        Expr::from_node(ExprNode::Arithmetic {
            left: self.boxed(),
            operator,
            right: Box::new(right.into_expr_node()),
        })
    }

    pub fn add(&self, right: impl IntoExpr<T>) -> Expr<T> {
        self.arithmetic(ArithmeticOperator::Add, right)
    }

    pub fn subtract(&self, right: impl IntoExpr<T>) -> Expr<T> {
        self.arithmetic(ArithmeticOperator::Subtract, right)
    }

    pub fn multiply(&self, right: impl IntoExpr<T>) -> Expr<T> {
        self.arithmetic(ArithmeticOperator::Multiply, right)
    }

    pub fn divide(&self, right: impl IntoExpr<T>) -> Expr<T> {
        self.arithmetic(ArithmeticOperator::Divide(T::KIND), right)
    }

    pub fn sum(&self) -> Expr<T::Sum> {
        self.aggregate(AggregateFunction::Sum(T::KIND))
    }

    pub fn avg(&self) -> Expr<f64> {
        self.aggregate(AggregateFunction::Avg)
    }
}

impl Expr<String> {
    pub fn concat(&self, right: impl IntoExpr<String>) -> Expr<String> {
        Expr::from_node(ExprNode::Concat(self.boxed(), Box::new(right.into_expr_node())))
    }

    pub fn lower(&self) -> Expr<String> {
        Expr::from_node(ExprNode::Lower(self.boxed()))
    }

    pub fn upper(&self) -> Expr<String> {
        Expr::from_node(ExprNode::Upper(self.boxed()))
    }
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Expr::from_node(self.node.clone())
    }
}

impl<T> Debug for Expr<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Expr").field(&self.node).finish()
    }
}

impl<T> From<Expr<T>> for ExprNode {
    fn from(value: Expr<T>) -> Self {
        value.node
    }
}

impl<T> From<&Expr<T>> for ExprNode {
    fn from(value: &Expr<T>) -> Self {
        value.node.clone()
    }
}

impl<T, U> IntoExpr<T> for Expr<U>
where
    U: Comparable<T>,
{
    fn into_expr_node(self) -> ExprNode {
        self.node
    }
}

impl<T, U> IntoExpr<T> for &Expr<U>
where
    U: Comparable<T>,
{
    fn into_expr_node(self) -> ExprNode {
        self.node.clone()
    }
}

impl<T, U> IntoExpr<T> for Query<Expr<U>>
where
    U: Comparable<T>,
{
    fn into_expr_node(self) -> ExprNode {
        ExprNode::Subquery(Box::new(self.descriptor().clone()))
    }
}

impl<T, U> IntoExpr<T> for &Query<Expr<U>>
where
    U: Comparable<T>,
{
    fn into_expr_node(self) -> ExprNode {
        ExprNode::Subquery(Box::new(self.descriptor().clone()))
    }
}

impl IntoExpr<i64> for i64 {
    fn into_expr_node(self) -> ExprNode {
        literal(self)
    }
}

impl IntoExpr<i64> for i32 {
    fn into_expr_node(self) -> ExprNode {
        literal(self)
    }
}

impl IntoExpr<f64> for f64 {
    fn into_expr_node(self) -> ExprNode {
        literal(self)
    }
}

impl IntoExpr<bool> for bool {
    fn into_expr_node(self) -> ExprNode {
        literal(self)
    }
}

impl IntoExpr<String> for &str {
    fn into_expr_node(self) -> ExprNode {
        literal(self)
    }
}

impl IntoExpr<String> for String {
    fn into_expr_node(self) -> ExprNode {
        literal(self)
    }
}

impl IntoExpr<String> for &String {
    fn into_expr_node(self) -> ExprNode {
        literal(self.as_str())
    }
}

/// A literal wrapped as an untyped node, for template arguments.
pub fn literal(value: impl Into<Value>) -> ExprNode {
    ExprNode::Literal(value.into())
}

/// A constant expression, `constant("A")` selects the string 'A' for every row.
pub fn constant<T>(value: impl IntoExpr<T>) -> Expr<T> {
    Expr::from_node(value.into_expr_node())
}

impl Predicate {
    pub fn condition(&self) -> &Condition {
        &self.0
    }

    /// `p.and(None) == p`
    pub fn and(self, other: impl Into<Option<Predicate>>) -> Predicate {
        match other.into() {
            None => self,
            Some(other) => Predicate(Condition::conjunction(self.0, other.0)),
        }
    }

    /// `p.or(None) == p`
    pub fn or(self, other: impl Into<Option<Predicate>>) -> Predicate {
        match other.into() {
            None => self,
            Some(other) => Predicate(Condition::disjunction(self.0, other.0)),
        }
    }

    pub fn negate(self) -> Predicate {
        match self.0 {
            Condition::Not(inner) => Predicate(*inner),
            condition => Predicate(Condition::Not(Box::new(condition))),
        }
    }
}

/// Conjunction where either side may be absent. An absent side yields the other operand.
pub fn and(
    left: impl Into<Option<Predicate>>,
    right: impl Into<Option<Predicate>>,
) -> Option<Predicate> {
    match left.into() {
        Some(left) => Some(left.and(right)),
        None => right.into(),
    }
}

/// Disjunction where either side may be absent. An absent side yields the other operand.
pub fn or(
    left: impl Into<Option<Predicate>>,
    right: impl Into<Option<Predicate>>,
) -> Option<Predicate> {
    match left.into() {
        Some(left) => Some(left.or(right)),
        None => right.into(),
    }
}

/// Accumulates optional predicates, for queries whose filters depend on the caller's input.
///
/// ```
/// use rusty_query::domain::QMember;
/// use rusty_query::PredicateBuilder;
///
/// let member = QMember::member();
/// let age: Option<i64> = None;
///
/// let mut builder = PredicateBuilder::new();
/// builder.and(member.username.eq("member1"));
/// if let Some(age) = age {
///     builder.and(member.age.eq(age));
/// }
///
/// assert_eq!(builder.build(), Some(member.username.eq("member1")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PredicateBuilder {
    predicate: Option<Predicate>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        PredicateBuilder::default()
    }

    pub fn and(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self {
        self.predicate = and(self.predicate.take(), predicate);
        self
    }

    pub fn or(&mut self, predicate: impl Into<Option<Predicate>>) -> &mut Self {
        self.predicate = or(self.predicate.take(), predicate);
        self
    }

    pub fn has_value(&self) -> bool {
        self.predicate.is_some()
    }

    pub fn build(&self) -> Option<Predicate> {
        self.predicate.clone()
    }
}

impl From<PredicateBuilder> for Option<Predicate> {
    fn from(value: PredicateBuilder) -> Self {
        value.predicate
    }
}

impl From<&PredicateBuilder> for Option<Predicate> {
    fn from(value: &PredicateBuilder) -> Self {
        value.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age() -> Expr<i64> {
        Expr::column("member", "age")
    }

    fn username() -> Expr<String> {
        Expr::column("member", "username")
    }

    #[test]
    fn absent_predicates_are_identities() {
        let p = username().eq("member1");
        let q = age().eq(10);

        assert_eq!(and(p.clone(), None), Some(p.clone()));
        assert_eq!(and(None, q.clone()), Some(q.clone()));
        assert_eq!(or(None, q.clone()), Some(q.clone()));
        assert_eq!(and(None, None), None);
        assert_eq!(p.clone().and(None), p);
    }

    #[test]
    fn conjunctions_are_flattened() {
        let predicate = age()
            .gt(10)
            .and(age().lt(40))
            .and(username().ne("member2"));

        match predicate.condition() {
            Condition::And(conditions) => assert_eq!(conditions.len(), 3),
            other => panic!("expected a flat conjunction, got {:?}", other),
        }
    }

    #[test]
    fn double_negation_cancels_out() {
        let predicate = age().eq(10);

        assert_eq!(predicate.clone().negate().negate(), predicate);
    }

    #[test]
    fn building_expressions_does_not_change_the_operands() {
        let age = age();
        let doubled = age.multiply(2);

        assert_eq!(age.node(), &Expr::<i64>::column("member", "age").node().clone());
        assert!(matches!(doubled.node(), ExprNode::Arithmetic { .. }));
    }

    #[test]
    fn aggregates_and_bare_columns_are_told_apart() {
        assert!(age().avg().node().is_aggregate());
        assert!(!age().avg().node().has_bare_column());
        assert!(age().add(1).node().has_bare_column());
        assert!(age().max().alias("oldest").node().is_aggregate());
    }

    #[test]
    fn names_come_from_columns_and_aliases() {
        assert_eq!(username().node().name(), Some("username"));
        assert_eq!(username().alias("name").node().name(), Some("name"));
        assert_eq!(username().lower().node().name(), None);
    }

    #[test]
    fn predicate_builder_skips_absent_predicates() {
        let mut builder = PredicateBuilder::new();
        builder.and(None).and(username().eq("member1")).and(None);

        assert_eq!(builder.build(), Some(username().eq("member1")));
        assert!(!PredicateBuilder::new().has_value());
    }
}
