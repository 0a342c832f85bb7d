//! UPDATE, DELETE, INSERT and CREATE TABLE statements.
use crate::engine::entity::{ColumnType, Entity};
use crate::engine::expression::ExprNode;
use crate::engine::query_builder::{Delete, Source, Update};
use crate::engine::rendering::query_rendering::{write_condition, write_expr};
use crate::engine::rendering::{Dialect, OptionalClause, SqlWriter};
use crate::engine::sql::Statement;
use crate::error::Error;

/// Unlike in SELECTs, the alias needs an explicit AS here.
fn write_target(writer: &mut SqlWriter, target: &Source) -> Result<(), Error> {
    writer.identifier(target.table)?;

    if target.alias != target.table {
        writer.push(" AS ");
        writer.identifier(&target.alias)?;
    }

    Ok(())
}

pub fn render_update(update: &Update, dialect: Dialect) -> Result<Statement, Error> {
    if update.assignments.is_empty() {
        return Err(Error::translation("the update doesn't set anything"));
    }

    let mut writer = SqlWriter::new(dialect);
    writer.push("UPDATE ");
    write_target(&mut writer, &update.target)?;
    writer.clause_break();
    writer.push("SET ");

    for (index, (column, value)) in update.assignments.iter().enumerate() {
        let ExprNode::Column(column) = column else {
            return Err(Error::translation(format!(
                "only columns can be assigned to, not {column:?}"
            )));
        };
        if column.alias != update.target.alias {
            return Err(Error::translation(format!(
                "{}.{} is not a column of the updated {}",
                column.alias, column.column, update.target.alias
            )));
        }

        if index > 0 {
            writer.push(", ");
        }

        // Postgres does not allow qualified names on the left side of SET.
        writer.identifier(column.column)?;
        writer.push(" = ");
        write_expr(&mut writer, value)?;
    }

    OptionalClause::filter(update.filter.as_slice()).render(&mut writer, write_condition)?;

    Ok(writer.finish())
}

pub fn render_delete(delete: &Delete, dialect: Dialect) -> Result<Statement, Error> {
    let mut writer = SqlWriter::new(dialect);
    writer.push("DELETE FROM ");
    write_target(&mut writer, &delete.target)?;

    OptionalClause::filter(delete.filter.as_slice()).render(&mut writer, write_condition)?;

    Ok(writer.finish())
}

/// Inserts the entity, handing back the generated key.
pub fn render_insert<E>(entity: &E, dialect: Dialect) -> Result<Statement, Error>
where
    E: Entity,
{
    let columns = &E::COLUMNS[1..];
    let values = entity.values()?;

    if values.len() != columns.len() {
        return Err(Error::translation(format!(
            "{} has {} columns, but {} values were given",
            E::TABLE,
            columns.len(),
            values.len()
        )));
    }

    let mut writer = SqlWriter::new(dialect);
    writer.push("INSERT INTO ");
    writer.identifier(E::TABLE)?;
    writer.push(" (");
    for (index, column) in columns.iter().enumerate() {
        if index > 0 {
            writer.push(", ");
        }
        writer.identifier(column.name)?;
    }
    writer.push(")");

    writer.clause_break();
    writer.push("VALUES (");
    for (index, value) in values.into_iter().enumerate() {
        if index > 0 {
            writer.push(", ");
        }
        writer.bind(value);
    }
    writer.push(")");

    writer.clause_break();
    writer.push("RETURNING id");

    Ok(writer.finish())
}

fn column_type(dialect: Dialect, column_type: ColumnType) -> &'static str {
    match (dialect, column_type) {
        (Dialect::Sqlite, ColumnType::Id) => "INTEGER PRIMARY KEY AUTOINCREMENT",
        (Dialect::MariaDB, ColumnType::Id) => "BIGINT AUTO_INCREMENT PRIMARY KEY",
        (Dialect::PostgresSQL, ColumnType::Id) => "BIGSERIAL PRIMARY KEY",
        (Dialect::Sqlite, ColumnType::Integer | ColumnType::Reference(_)) => "INTEGER",
        (_, ColumnType::Integer | ColumnType::Reference(_)) => "BIGINT",
        (Dialect::MariaDB, ColumnType::Text) => "VARCHAR(255)",
        (_, ColumnType::Text) => "TEXT",
    }
}

/// CREATE TABLE for the entity. Does nothing if the table is already there.
pub fn render_table<E>(dialect: Dialect) -> Result<Statement, Error>
where
    E: Entity,
{
    let mut writer = SqlWriter::new(dialect);
    writer.push("CREATE TABLE IF NOT EXISTS ");
    writer.identifier(E::TABLE)?;
    writer.push(" (");

    for (index, column) in E::COLUMNS.iter().enumerate() {
        if index > 0 {
            writer.push(",");
        }
        writer.push("\n    ");
        writer.identifier(column.name)?;
        writer.push(" ");
        writer.push(column_type(dialect, column.column_type));

        if !column.nullable && column.column_type != ColumnType::Id {
            writer.push(" NOT NULL");
        }
    }

    for column in E::COLUMNS {
        if let ColumnType::Reference(table) = column.column_type {
            writer.push(",\n    FOREIGN KEY (");
            writer.identifier(column.name)?;
            writer.push(") REFERENCES ");
            writer.identifier(table)?;
            writer.push(" (id)");
        }
    }

    writer.push("\n)");

    Ok(writer.finish())
}
