pub use dialect::Dialect;
pub use mutation_rendering::{render_delete, render_insert, render_table, render_update};
pub use query_rendering::{render_count, render_select, FetchSlot};

use crate::engine::sql::Statement;
use crate::engine::value::Value;
use crate::error::Error;
use once_cell::sync::Lazy;
use regex::Regex;

mod dialect;
mod mutation_rendering;
mod query_rendering;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Accumulates SQL text and the parameters bound to its placeholders.
///
/// Literals never end up in the SQL text, with the exception of NULL.
struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
    /// Subquery nesting. Clauses of the outermost statement go on their own line.
    depth: usize,
}

impl SqlWriter {
    fn new(dialect: Dialect) -> Self {
        SqlWriter {
            dialect,
            sql: String::new(),
            params: Vec::new(),
            depth: 0,
        }
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn clause_break(&mut self) {
        if self.depth == 0 {
            self.sql.push('\n');
        } else {
            self.sql.push(' ');
        }
    }

    fn bind(&mut self, value: Value) {
        if value.is_null() {
            self.push("NULL");
            return;
        }

        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.push(&placeholder);
    }

    fn identifier(&mut self, name: &str) -> Result<(), Error> {
        if !IDENTIFIER.is_match(name) {
            return Err(Error::translation(format!("\"{name}\" is not a valid identifier")));
        }

        self.push(name);

        Ok(())
    }

    fn qualified(&mut self, alias: &str, column: &str) -> Result<(), Error> {
        self.identifier(alias)?;
        self.push(".");
        self.identifier(column)
    }

    /// `table` or `table alias`, the alias is left out when it matches the table.
    fn table(&mut self, table: &str, alias: &str) -> Result<(), Error> {
        self.identifier(table)?;

        if alias != table {
            self.push(" ");
            self.identifier(alias)?;
        }

        Ok(())
    }

    fn nested<T>(
        &mut self,
        render: impl FnOnce(&mut SqlWriter) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.depth += 1;
        let result = render(self);
        self.depth -= 1;

        result
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Renders things like "WHERE x AND y", "GROUP BY a, b" and "ORDER BY a, b".
/// These are all optional clauses that have a ligature between each element.
struct OptionalClause<'a, T> {
    intro: &'a str,
    ligature: &'a str,
    items: &'a [T],
}

impl<'a, T> OptionalClause<'a, T> {
    fn group_by(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "GROUP BY",
            ligature: ",",
            items,
        }
    }

    fn order_by(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "ORDER BY",
            ligature: ",",
            items,
        }
    }

    fn filter(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "WHERE",
            ligature: " AND",
            items,
        }
    }

    fn having(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "HAVING",
            ligature: " AND",
            items,
        }
    }

    fn render(
        &self,
        writer: &mut SqlWriter,
        mut render_item: impl FnMut(&mut SqlWriter, &T) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let Self {
            intro,
            ligature,
            items,
        } = self;

        if let Some((first, rest)) = items.split_first() {
            writer.clause_break();
            writer.push(intro);
            writer.push(" ");
            render_item(writer, first)?;

            for item in rest {
                writer.push(ligature);
                writer.push(" ");
                render_item(writer, item)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_are_written_inline_and_everything_else_is_bound() {
        let mut writer = SqlWriter::new(Dialect::PostgresSQL);
        writer.bind(Value::Integer(10));
        writer.push(", ");
        writer.bind(Value::Null);
        writer.push(", ");
        writer.bind(Value::Text("teamA".into()));

        let statement = writer.finish();
        assert_eq!(statement.sql, "$1, NULL, $2");
        assert_eq!(statement.params.len(), 2);
    }

    #[test]
    fn identifiers_are_validated() {
        let mut writer = SqlWriter::new(Dialect::Sqlite);

        assert!(writer.identifier("team_id").is_ok());
        assert!(writer.identifier("team; DROP TABLE member").is_err());
    }

    #[test]
    fn empty_optional_clauses_render_nothing() {
        let mut writer = SqlWriter::new(Dialect::Sqlite);
        OptionalClause::<&str>::filter(&[])
            .render(&mut writer, |writer, item| {
                writer.push(item);
                Ok(())
            })
            .unwrap();

        assert_eq!(writer.finish().sql, "");
    }

    #[test]
    fn optional_clauses_join_their_items() {
        let mut writer = SqlWriter::new(Dialect::Sqlite);
        writer.push("SELECT 1");
        OptionalClause::group_by(&["a", "b"])
            .render(&mut writer, |writer, item| {
                writer.push(item);
                Ok(())
            })
            .unwrap();

        assert_eq!(writer.finish().sql, "SELECT 1\nGROUP BY a, b");
    }
}
