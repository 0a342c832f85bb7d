use crate::engine::expression::template::Segment;
use crate::engine::expression::{Condition, ExprNode};
use crate::engine::query_builder::{Join, Order, QueryDescriptor, Selection, Source};
use crate::engine::rendering::{Dialect, OptionalClause, SqlWriter};
use crate::engine::sql::Statement;
use crate::engine::value::Value;
use crate::engine::{
    AggregateFunction, ArithmeticOperator, Comparison, JoinType, NullOrdering, OrderDirection,
};
use crate::error::Error;

/// A rendered SELECT, plus where the columns of fetch joined entities are in its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSelect {
    pub statement: Statement,
    pub fetches: Vec<FetchSlot>,
}

/// The columns of one fetch joined entity, appended after the projection's own columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSlot {
    pub owner_alias: String,
    pub relation: &'static str,
    pub columns: Vec<&'static str>,
    /// Position of the first column in the row.
    pub offset: usize,
}

pub fn render_select(descriptor: &QueryDescriptor, dialect: Dialect) -> Result<RenderedSelect, Error> {
    let mut writer = SqlWriter::new(dialect);
    let fetches = write_select(&mut writer, descriptor, true)?;

    Ok(RenderedSelect {
        statement: writer.finish(),
        fetches,
    })
}

/// Counts the rows the query would return, ignoring ordering and paging.
pub fn render_count(descriptor: &QueryDescriptor, dialect: Dialect) -> Result<Statement, Error> {
    check_sources(descriptor)?;
    let from = root(descriptor)?;

    let mut writer = SqlWriter::new(dialect);

    if descriptor.group_by.is_empty() {
        writer.push("SELECT COUNT(*) AS c0");
        write_sources(&mut writer, from, &descriptor.joins)?;
        write_filter(&mut writer, descriptor)?;
    } else {
        writer.push("SELECT COUNT(*) AS c0 FROM (");
        writer.nested(|writer| {
            writer.push("SELECT 1 AS present");
            write_sources(writer, from, &descriptor.joins)?;
            write_filter(writer, descriptor)?;
            write_grouping(writer, descriptor)
        })?;
        writer.push(") grouped");
    }

    Ok(writer.finish())
}

fn root(descriptor: &QueryDescriptor) -> Result<&Source, Error> {
    descriptor
        .from
        .as_ref()
        .ok_or_else(|| Error::translation("the query has no from() source"))
}

fn check_sources(descriptor: &QueryDescriptor) -> Result<(), Error> {
    if !descriptor.problems.is_empty() {
        return Err(Error::translation(descriptor.problems.join(", ")));
    }

    if descriptor.having.is_some() && descriptor.group_by.is_empty() {
        return Err(Error::translation("having() needs a group_by()"));
    }

    for join in &descriptor.joins {
        if join.join_type != JoinType::Cross && join.relation.is_none() && join.on.is_none() {
            return Err(Error::translation(format!(
                "the join on {} {} needs an on() condition",
                join.target.table, join.target.alias
            )));
        }
    }

    Ok(())
}

fn check_projection(descriptor: &QueryDescriptor) -> Result<(), Error> {
    if descriptor.select.is_empty() {
        return Err(Error::translation("the query selects nothing"));
    }

    for join in descriptor.joins.iter().filter(|join| join.fetch) {
        let Some(relation) = &join.relation else {
            return Err(Error::translation(format!(
                "fetch_join() on {} {} needs an association to follow",
                join.target.table, join.target.alias
            )));
        };

        let owner_selected = descriptor.select.iter().any(|selection| {
            matches!(selection, Selection::Entity { alias, .. } if *alias == relation.owner_alias)
        });
        if !owner_selected {
            return Err(Error::translation(format!(
                "fetch_join() of {}.{} needs {} in the select",
                relation.owner_alias, relation.name, relation.owner_alias
            )));
        }
    }

    if descriptor.group_by.is_empty() {
        let aggregated = descriptor.select.iter().any(|selection| {
            matches!(selection, Selection::Expression(node) if node.is_aggregate())
        });
        let bare = descriptor.select.iter().any(|selection| match selection {
            Selection::Expression(node) => node.has_bare_column(),
            Selection::Entity { .. } => true,
        });

        if aggregated && bare {
            return Err(Error::translation(
                "aggregates can't be mixed with plain columns without a group_by()",
            ));
        }
    }

    Ok(())
}

/// Writes a full SELECT. Only top level statements label their columns.
fn write_select(
    writer: &mut SqlWriter,
    descriptor: &QueryDescriptor,
    labelled: bool,
) -> Result<Vec<FetchSlot>, Error> {
    check_sources(descriptor)?;
    check_projection(descriptor)?;
    let from = root(descriptor)?;

    writer.push("SELECT ");

    let mut position = 0;

    for (index, selection) in descriptor.select.iter().enumerate() {
        if index > 0 {
            writer.push(", ");
        }

        match selection {
            Selection::Expression(node) => {
                write_expr(writer, node)?;
                label(writer, labelled, &mut position);
            }
            Selection::Entity { alias, columns, .. } => {
                for (index, column) in columns.iter().enumerate() {
                    if index > 0 {
                        writer.push(", ");
                    }
                    writer.qualified(alias, column)?;
                    label(writer, labelled, &mut position);
                }
            }
        }
    }

    let mut fetches = Vec::new();
    for join in descriptor.joins.iter().filter(|join| join.fetch) {
        let Some(relation) = &join.relation else {
            continue;
        };

        fetches.push(FetchSlot {
            owner_alias: relation.owner_alias.clone(),
            relation: relation.name,
            columns: join.columns.clone(),
            offset: position,
        });

        for column in &join.columns {
            writer.push(", ");
            writer.qualified(&join.target.alias, column)?;
            label(writer, labelled, &mut position);
        }
    }

    write_sources(writer, from, &descriptor.joins)?;
    write_filter(writer, descriptor)?;
    write_grouping(writer, descriptor)?;

    OptionalClause::order_by(descriptor.orders.as_slice()).render(writer, write_order)?;

    write_paging(writer, descriptor);

    Ok(fetches)
}

fn label(writer: &mut SqlWriter, labelled: bool, position: &mut usize) {
    if labelled {
        writer.push(&format!(" AS c{position}"));
    }

    *position += 1;
}

fn write_sources(writer: &mut SqlWriter, from: &Source, joins: &[Join]) -> Result<(), Error> {
    writer.clause_break();
    writer.push("FROM ");
    writer.table(from.table, &from.alias)?;

    for join in joins {
        writer.clause_break();
        write_join(writer, join)?;
    }

    Ok(())
}

fn write_join(writer: &mut SqlWriter, join: &Join) -> Result<(), Error> {
    let join_type = match join.join_type {
        JoinType::Inner => "JOIN ",
        JoinType::Left => "LEFT JOIN ",
        JoinType::Cross => "CROSS JOIN ",
    };
    writer.push(join_type);
    writer.table(join.target.table, &join.target.alias)?;

    if join.join_type == JoinType::Cross {
        return Ok(());
    }

    writer.push(" ON ");
    match (&join.relation, &join.on) {
        (Some(relation), on) => {
            writer.qualified(&relation.owner_alias, relation.foreign_key)?;
            writer.push(" = ");
            writer.qualified(&join.target.alias, "id")?;

            if let Some(on) = on {
                writer.push(" AND ");
                write_nested_condition(writer, on)?;
            }
        }
        (None, Some(on)) => write_condition(writer, on)?,
        (None, None) => {
            return Err(Error::translation(format!(
                "the join on {} needs an on() condition",
                join.target.alias
            )))
        }
    }

    Ok(())
}

fn write_filter(writer: &mut SqlWriter, descriptor: &QueryDescriptor) -> Result<(), Error> {
    OptionalClause::filter(descriptor.filter.as_slice()).render(writer, write_condition)
}

fn write_grouping(writer: &mut SqlWriter, descriptor: &QueryDescriptor) -> Result<(), Error> {
    OptionalClause::group_by(descriptor.group_by.as_slice()).render(writer, write_expr)?;
    OptionalClause::having(descriptor.having.as_slice()).render(writer, write_condition)
}

fn write_paging(writer: &mut SqlWriter, descriptor: &QueryDescriptor) {
    let bound = |value: u64| Value::Integer(i64::try_from(value).unwrap_or(i64::MAX));

    match (descriptor.limit, descriptor.offset) {
        (None, None) => {}
        (Some(limit), offset) => {
            writer.clause_break();
            writer.push("LIMIT ");
            writer.bind(bound(limit));

            if let Some(offset) = offset {
                writer.push(" OFFSET ");
                writer.bind(bound(offset));
            }
        }
        (None, Some(offset)) => {
            writer.clause_break();
            match writer.dialect {
                Dialect::Sqlite => writer.push("LIMIT -1 "),
                Dialect::MariaDB => writer.push("LIMIT 18446744073709551615 "),
                Dialect::PostgresSQL => {}
            }
            writer.push("OFFSET ");
            writer.bind(bound(offset));
        }
    }
}

fn write_order(writer: &mut SqlWriter, order: &Order) -> Result<(), Error> {
    // MariaDB can't place NULLs explicitly, it sorts them as the smallest value. A leading
    // "IS NULL" key does the same job.
    if writer.dialect == Dialect::MariaDB && order.nulls != NullOrdering::Default {
        write_expr(writer, &order.expr)?;
        match order.nulls {
            NullOrdering::First => writer.push(" IS NULL DESC, "),
            _ => writer.push(" IS NULL, "),
        }
    }

    write_expr(writer, &order.expr)?;

    match order.direction {
        OrderDirection::Ascending => writer.push(" ASC"),
        OrderDirection::Descending => writer.push(" DESC"),
    }

    if writer.dialect != Dialect::MariaDB {
        match order.nulls {
            NullOrdering::Default => {}
            NullOrdering::First => writer.push(" NULLS FIRST"),
            NullOrdering::Last => writer.push(" NULLS LAST"),
        }
    }

    Ok(())
}

fn comparison_symbol(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::Equals => "=",
        Comparison::NotEquals => "!=",
        Comparison::GreaterThan => ">",
        Comparison::GreaterOrEqual => ">=",
        Comparison::LesserThan => "<",
        Comparison::LesserOrEqual => "<=",
    }
}

pub(super) fn write_condition(writer: &mut SqlWriter, condition: &Condition) -> Result<(), Error> {
    match condition {
        Condition::Compare {
            left,
            comparison,
            right: ExprNode::Literal(Value::Null),
        } if matches!(comparison, Comparison::Equals | Comparison::NotEquals) => {
            write_expr(writer, left)?;
            if *comparison == Comparison::Equals {
                writer.push(" IS NULL");
            } else {
                writer.push(" IS NOT NULL");
            }
        }
        Condition::Compare {
            left,
            comparison,
            right,
        } => {
            write_expr(writer, left)?;
            writer.push(" ");
            writer.push(comparison_symbol(*comparison));
            writer.push(" ");
            write_expr(writer, right)?;
        }
        Condition::Between { operand, low, high } => {
            write_expr(writer, operand)?;
            writer.push(" BETWEEN ");
            write_expr(writer, low)?;
            writer.push(" AND ");
            write_expr(writer, high)?;
        }
        Condition::In { values, .. } if values.is_empty() => writer.push("1 = 0"),
        Condition::In { operand, values } => {
            write_expr(writer, operand)?;
            writer.push(" IN (");
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    writer.push(", ");
                }
                write_expr(writer, value)?;
            }
            writer.push(")");
        }
        Condition::InSubquery { operand, subquery } => {
            write_expr(writer, operand)?;
            writer.push(" IN ");
            write_subquery(writer, subquery)?;
        }
        Condition::And(conditions) => write_junction(writer, conditions, " AND ")?,
        Condition::Or(conditions) => write_junction(writer, conditions, " OR ")?,
        Condition::Not(condition) => {
            writer.push("NOT ");
            writer.push("(");
            write_condition(writer, condition)?;
            writer.push(")");
        }
    }

    Ok(())
}

fn write_junction(writer: &mut SqlWriter, conditions: &[Condition], ligature: &str) -> Result<(), Error> {
    for (index, condition) in conditions.iter().enumerate() {
        if index > 0 {
            writer.push(ligature);
        }
        write_nested_condition(writer, condition)?;
    }

    Ok(())
}

/// Parenthesizes junctions, so they keep their meaning inside other junctions.
fn write_nested_condition(writer: &mut SqlWriter, condition: &Condition) -> Result<(), Error> {
    if matches!(condition, Condition::And(_) | Condition::Or(_)) {
        writer.push("(");
        write_condition(writer, condition)?;
        writer.push(")");

        Ok(())
    } else {
        write_condition(writer, condition)
    }
}

fn write_subquery(writer: &mut SqlWriter, subquery: &QueryDescriptor) -> Result<(), Error> {
    writer.push("(");
    writer.nested(|writer| write_select(writer, subquery, false))?;
    writer.push(")");

    Ok(())
}

fn write_cast(writer: &mut SqlWriter, node: &ExprNode, to: &str) -> Result<(), Error> {
    writer.push("CAST(");
    write_expr(writer, node)?;
    writer.push(" AS ");
    writer.push(to);
    writer.push(")");

    Ok(())
}

fn write_aggregate(writer: &mut SqlWriter, function: AggregateFunction, argument: &ExprNode) -> Result<(), Error> {
    let name = match function {
        AggregateFunction::Count => "COUNT",
        AggregateFunction::Sum(_) => "SUM",
        AggregateFunction::Avg => "AVG",
        AggregateFunction::Max => "MAX",
        AggregateFunction::Min => "MIN",
    };
    let cast = match function {
        AggregateFunction::Sum(kind) => writer.dialect.sum_cast(kind),
        AggregateFunction::Avg => writer.dialect.avg_cast(),
        _ => None,
    };

    if cast.is_some() {
        writer.push("CAST(");
    }

    writer.push(name);
    writer.push("(");
    write_expr(writer, argument)?;
    writer.push(")");

    if let Some(cast) = cast {
        writer.push(" AS ");
        writer.push(cast);
        writer.push(")");
    }

    Ok(())
}

pub(super) fn write_expr(writer: &mut SqlWriter, node: &ExprNode) -> Result<(), Error> {
    match node {
        ExprNode::Column(column) => writer.qualified(&column.alias, column.column)?,
        ExprNode::Literal(value) => writer.bind(value.clone()),
        ExprNode::Arithmetic {
            left,
            operator,
            right,
        } => {
            let symbol = match operator {
                ArithmeticOperator::Add => " + ",
                ArithmeticOperator::Subtract => " - ",
                ArithmeticOperator::Multiply => " * ",
                ArithmeticOperator::Divide(kind) => writer.dialect.division(*kind),
            };

            writer.push("(");
            write_expr(writer, left)?;
            writer.push(symbol);
            write_expr(writer, right)?;
            writer.push(")");
        }
        ExprNode::Concat(left, right) => {
            if writer.dialect == Dialect::MariaDB {
                writer.push("CONCAT(");
                write_expr(writer, left)?;
                writer.push(", ");
                write_expr(writer, right)?;
                writer.push(")");
            } else {
                writer.push("(");
                write_expr(writer, left)?;
                writer.push(" || ");
                write_expr(writer, right)?;
                writer.push(")");
            }
        }
        ExprNode::Lower(inner) => {
            writer.push("LOWER(");
            write_expr(writer, inner)?;
            writer.push(")");
        }
        ExprNode::Upper(inner) => {
            writer.push("UPPER(");
            write_expr(writer, inner)?;
            writer.push(")");
        }
        ExprNode::CastToText(inner) => {
            let text_type = writer.dialect.text_type();
            write_cast(writer, inner, text_type)?;
        }
        ExprNode::Aggregate { function, argument } => write_aggregate(writer, *function, argument)?,
        ExprNode::Case {
            branches,
            otherwise,
        } => {
            writer.push("CASE");
            for (condition, result) in branches {
                writer.push(" WHEN ");
                write_condition(writer, condition)?;
                writer.push(" THEN ");
                write_expr(writer, result)?;
            }
            writer.push(" ELSE ");
            write_expr(writer, otherwise)?;
            writer.push(" END");
        }
        ExprNode::Subquery(subquery) => write_subquery(writer, subquery)?,
        ExprNode::Template {
            template,
            arguments,
        } => {
            for segment in template.segments() {
                match segment {
                    Segment::Text(text) => writer.push(text),
                    Segment::Argument(index) => {
                        let argument = arguments.get(*index).ok_or_else(|| {
                            Error::translation(format!("template placeholder {{{index}}} has no argument"))
                        })?;
                        write_expr(writer, argument)?;
                    }
                }
            }
        }
        ExprNode::Aliased { node, .. } => write_expr(writer, node)?,
    }

    Ok(())
}
