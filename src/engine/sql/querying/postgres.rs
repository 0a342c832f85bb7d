use super::{Connection, Driver};
use crate::engine::sql::{Row, Statement};
use crate::engine::value::Value;
use crate::Error;
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Pool, Postgres, Row as _, TypeInfo, ValueRef};

fn bind_params<'q>(
    query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    params.iter().fold(query, |query, value| match value {
        Value::Null => query.bind(None::<i64>),
        Value::Integer(integer) => query.bind(*integer),
        Value::Real(real) => query.bind(*real),
        Value::Text(text) => query.bind(text.clone()),
        Value::Boolean(boolean) => query.bind(*boolean),
    })
}

fn decode_row(row: &PgRow) -> Result<Row, Error> {
    let mut decoded = Vec::with_capacity(row.len());

    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();

            match type_name.as_str() {
                "INT2" => Value::Integer(row.try_get_unchecked::<i16, _>(index)?.into()),
                "INT4" => Value::Integer(row.try_get_unchecked::<i32, _>(index)?.into()),
                "INT8" => Value::Integer(row.try_get_unchecked(index)?),
                "FLOAT4" => Value::Real(row.try_get_unchecked::<f32, _>(index)?.into()),
                "FLOAT8" => Value::Real(row.try_get_unchecked(index)?),
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Value::Text(row.try_get_unchecked(index)?),
                "BOOL" => Value::Boolean(row.try_get_unchecked(index)?),
                other => {
                    return Err(Error::decode(format!(
                        "column {} has unsupported type {other}",
                        column.name()
                    )))
                }
            }
        };

        decoded.push((column.name().to_string(), value));
    }

    Ok(decoded)
}

#[async_trait]
impl Driver for Connection<Pool<Postgres>> {
    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<Row>, Error> {
        let rows = bind_params(sqlx::query(&statement.sql), &statement.params)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, Error> {
        let result = bind_params(sqlx::query(&statement.sql), &statement.params)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
