//! Immutable query descriptors.
//!
//! Every builder method consumes the query and returns a new one. Clone a query before refining
//! it if the original is still needed, clones share nothing.
use crate::engine::entity::{Entity, EntityPath, RelationPath};
use crate::engine::expression::{Condition, Expr, ExprNode, IntoExpr, Predicate};
use crate::engine::mapping::Projection;
use crate::engine::rendering::{self, Dialect};
use crate::engine::sql::Statement;
use crate::engine::{JoinType, NullOrdering, OrderDirection};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub table: &'static str,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Expression(ExprNode),
    /// All mapped columns of an entity.
    Entity {
        alias: String,
        table: &'static str,
        columns: Vec<&'static str>,
    },
}

/// The association a join follows, `member.team` for example.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRelation {
    pub owner_alias: String,
    pub name: &'static str,
    pub foreign_key: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub target: Source,
    /// Absent for joins on arbitrary conditions.
    pub relation: Option<JoinRelation>,
    /// Extra join condition, added to the relation's key match.
    pub on: Option<Condition>,
    /// Fetch joins hydrate the target into the owner's relation field.
    pub fetch: bool,
    pub columns: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub expr: ExprNode,
    pub direction: OrderDirection,
    pub nulls: NullOrdering,
}

/// Everything needed to render a SELECT.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryDescriptor {
    pub select: Vec<Selection>,
    pub from: Option<Source>,
    pub joins: Vec<Join>,
    pub filter: Option<Condition>,
    pub group_by: Vec<ExprNode>,
    pub having: Option<Condition>,
    pub orders: Vec<Order>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    /// Builder misuse noticed along the way, reported when the query is translated.
    pub problems: Vec<String>,
}

/// A query whose rows are read through the projection `P`.
#[derive(Debug, Clone)]
pub struct Query<P> {
    projection: P,
    descriptor: QueryDescriptor,
}

pub fn select<P>(projection: P) -> Query<P>
where
    P: Projection,
{
    let descriptor = QueryDescriptor {
        select: projection.selections(),
        ..QueryDescriptor::default()
    };

    Query {
        projection,
        descriptor,
    }
}

/// Selects an entity from its own table, `select(member.clone()).from(&member)`.
pub fn select_from<P>(path: &P) -> Query<P>
where
    P: Projection + EntityPath + Clone,
{
    select(path.clone()).from(path)
}

impl Source {
    pub fn of<P>(path: &P) -> Self
    where
        P: EntityPath,
    {
        Source {
            table: path.table(),
            alias: path.alias().to_string(),
        }
    }
}

impl Order {
    pub(crate) fn new(expr: ExprNode, direction: OrderDirection, nulls: NullOrdering) -> Self {
        Order {
            expr,
            direction,
            nulls,
        }
    }

    pub fn nulls_first(self) -> Self {
        Order {
            nulls: NullOrdering::First,
            ..self
        }
    }

    pub fn nulls_last(self) -> Self {
        Order {
            nulls: NullOrdering::Last,
            ..self
        }
    }
}

fn conjunction(current: Option<Condition>, predicate: impl Into<Option<Predicate>>) -> Option<Condition> {
    match (current, predicate.into()) {
        (Some(current), Some(predicate)) => Some(Predicate(current).and(predicate).0),
        (current, None) => current,
        (None, Some(predicate)) => Some(predicate.0),
    }
}

impl<P> Query<P> {
    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    /// Sets the root entity. Further calls add theta joins, filtered in the WHERE clause.
    pub fn from<E>(mut self, path: &E) -> Self
    where
        E: EntityPath,
    {
        let source = Source::of(path);

        if self.descriptor.from.is_none() {
            self.descriptor.from = Some(source);
        } else {
            self.descriptor.joins.push(Join {
                join_type: JoinType::Cross,
                target: source,
                relation: None,
                on: None,
                fetch: false,
                columns: E::Entity::column_names(),
            });
        }

        self
    }

    fn push_join<E>(mut self, join_type: JoinType, relation: Option<JoinRelation>, target: &E) -> Self
    where
        E: EntityPath,
    {
        self.descriptor.joins.push(Join {
            join_type,
            target: Source::of(target),
            relation,
            on: None,
            fetch: false,
            columns: E::Entity::column_names(),
        });

        self
    }

    /// Inner join following an association: `join(&member.team, &team)`.
    pub fn join<E>(self, relation: &RelationPath<E>, target: &E) -> Self
    where
        E: EntityPath,
    {
        self.push_join(JoinType::Inner, Some(relation.into()), target)
    }

    pub fn left_join<E>(self, relation: &RelationPath<E>, target: &E) -> Self
    where
        E: EntityPath,
    {
        self.push_join(JoinType::Left, Some(relation.into()), target)
    }

    /// Inner join on an arbitrary condition, which must be given with [Query::on].
    pub fn join_on<E>(self, target: &E) -> Self
    where
        E: EntityPath,
    {
        self.push_join(JoinType::Inner, None, target)
    }

    /// Left join on an arbitrary condition, which must be given with [Query::on].
    pub fn left_join_on<E>(self, target: &E) -> Self
    where
        E: EntityPath,
    {
        self.push_join(JoinType::Left, None, target)
    }

    /// Adds a condition to the last join.
    pub fn on(mut self, predicate: Predicate) -> Self {
        match self.descriptor.joins.last_mut() {
            Some(join) if join.join_type != JoinType::Cross => {
                join.on = conjunction(join.on.take(), predicate);
            }
            _ => self
                .descriptor
                .problems
                .push("on() needs a preceding join".to_string()),
        }

        self
    }

    /// Turns the last join into a fetch join.
    pub fn fetch_join(mut self) -> Self {
        match self.descriptor.joins.last_mut() {
            Some(join) => join.fetch = true,
            None => self
                .descriptor
                .problems
                .push("fetch_join() needs a preceding join".to_string()),
        }

        self
    }

    /// ANDs the predicate with the current filter. Absent predicates are ignored.
    pub fn filter(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        self.descriptor.filter = conjunction(self.descriptor.filter.take(), predicate);

        self
    }

    pub fn filter_all<I>(self, predicates: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<Predicate>>,
    {
        predicates
            .into_iter()
            .fold(self, |query, predicate| query.filter(predicate))
    }

    pub fn group_by(mut self, expr: impl Into<ExprNode>) -> Self {
        self.descriptor.group_by.push(expr.into());

        self
    }

    pub fn having(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        self.descriptor.having = conjunction(self.descriptor.having.take(), predicate);

        self
    }

    pub fn order_by(mut self, orders: impl IntoIterator<Item = Order>) -> Self {
        self.descriptor.orders.extend(orders);

        self
    }

    /// Rows to skip, zero based.
    pub fn offset(mut self, offset: u64) -> Self {
        self.descriptor.offset = Some(offset);

        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.descriptor.limit = Some(limit);

        self
    }

    pub fn to_statement(&self, dialect: Dialect) -> Result<Statement, Error> {
        Ok(rendering::render_select(&self.descriptor, dialect)?.statement)
    }

    pub fn to_count_statement(&self, dialect: Dialect) -> Result<Statement, Error> {
        rendering::render_count(&self.descriptor, dialect)
    }
}

impl<T> Query<Expr<T>> {
    /// Uses the query as a scalar subquery, for selecting it or giving it an alias.
    pub fn as_expr(&self) -> Expr<T> {
        Expr::from_node(ExprNode::Subquery(Box::new(self.descriptor.clone())))
    }
}

impl<E> From<&RelationPath<E>> for JoinRelation {
    fn from(value: &RelationPath<E>) -> Self {
        JoinRelation {
            owner_alias: value.owner_alias().to_string(),
            name: value.name(),
            foreign_key: value.foreign_key(),
        }
    }
}

/// A bulk UPDATE. It bypasses the session, so entities it already holds go stale.
#[derive(Debug, Clone)]
pub struct Update {
    pub(crate) target: Source,
    pub(crate) assignments: Vec<(ExprNode, ExprNode)>,
    pub(crate) filter: Option<Condition>,
}

/// A bulk DELETE. It bypasses the session, so entities it already holds go stale.
#[derive(Debug, Clone)]
pub struct Delete {
    pub(crate) target: Source,
    pub(crate) filter: Option<Condition>,
}

pub fn update<E>(path: &E) -> Update
where
    E: EntityPath,
{
    Update {
        target: Source::of(path),
        assignments: Vec::new(),
        filter: None,
    }
}

pub fn delete<E>(path: &E) -> Delete
where
    E: EntityPath,
{
    Delete {
        target: Source::of(path),
        filter: None,
    }
}

impl Update {
    /// `set(&member.age, member.age.add(1))`
    pub fn set<T>(mut self, column: &Expr<T>, value: impl IntoExpr<T>) -> Self {
        self.assignments
            .push((column.node().clone(), value.into_expr_node()));

        self
    }

    pub fn filter(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        self.filter = conjunction(self.filter.take(), predicate);

        self
    }

    pub fn to_statement(&self, dialect: Dialect) -> Result<Statement, Error> {
        rendering::render_update(self, dialect)
    }
}

impl Delete {
    pub fn filter(mut self, predicate: impl Into<Option<Predicate>>) -> Self {
        self.filter = conjunction(self.filter.take(), predicate);

        self
    }

    pub fn to_statement(&self, dialect: Dialect) -> Result<Statement, Error> {
        rendering::render_delete(self, dialect)
    }
}
