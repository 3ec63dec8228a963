//! Query executor
//!
//! Takes `?`-placeholder templates plus a matching argument list, borrows a
//! pooled connection, runs the statement and hands back decoded rows or the
//! affected-row count.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, Column, Connection, Row as _, TypeInfo, ValueRef};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::pool::Database;
use crate::value::{Row, SqlType, Value};

/// Statement execution seam used by records.
///
/// [`Database`] is the production implementation; tests can substitute a
/// recording double.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a read and return up to `limit` rows (all rows when `None`).
    /// Zero rows is an empty vector, never an error.
    async fn select(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<Vec<Row>>;

    /// Run a write and return the affected-row count.
    ///
    /// With `autocommit == false` the statement runs inside an explicit
    /// transaction that is committed on success and rolled back before the
    /// error is returned.
    async fn execute(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64>;

    /// Commit mode records use for their writes
    fn autocommit(&self) -> bool {
        true
    }
}

#[async_trait]
impl Executor for Database {
    async fn select(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<Vec<Row>> {
        let statement = self.driver().translate(sql);
        info!(sql = %statement, args = ?args, "SQL");

        let mut conn = self.acquire().await?;
        let query = bind_all(sqlx::query(&statement), args);
        let fetched: Vec<AnyRow> = match limit {
            Some(limit) => query.fetch(&mut *conn).take(limit).try_collect().await?,
            None => query.fetch_all(&mut *conn).await?,
        };
        drop(conn);

        let rows = fetched.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
        info!(rows = rows.len(), "rows returned");
        Ok(rows)
    }

    async fn execute(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64> {
        let statement = self.driver().translate(sql);
        info!(sql = %statement, args = ?args, autocommit, "SQL");

        let mut conn = self.acquire().await?;
        if autocommit {
            let done = bind_all(sqlx::query(&statement), args)
                .execute(&mut *conn)
                .await?;
            return Ok(done.rows_affected());
        }

        let mut tx = Connection::begin(&mut *conn).await?;
        match bind_all(sqlx::query(&statement), args)
            .execute(&mut *tx)
            .await
        {
            Ok(done) => {
                tx.commit().await?;
                Ok(done.rows_affected())
            }
            Err(err) => {
                error!(error = %err, "statement failed, rolling back");
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err.into())
            }
        }
    }

    fn autocommit(&self) -> bool {
        Database::autocommit(self)
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    args: &[Value],
) -> Query<'q, Any, AnyArguments<'q>> {
    for arg in args {
        query = match arg {
            Value::Null | Value::TypedNull(SqlType::Text) => query.bind(None::<String>),
            Value::TypedNull(SqlType::Bool) => query.bind(None::<bool>),
            Value::TypedNull(SqlType::Int) => query.bind(None::<i64>),
            Value::TypedNull(SqlType::Float) => query.bind(None::<f64>),
            Value::TypedNull(SqlType::Bytes) => query.bind(None::<Vec<u8>>),
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.clone()),
            Value::Bytes(b) => query.bind(b.clone()),
        };
    }
    query
}

fn decode_row(row: &AnyRow) -> Result<Row> {
    let mut decoded = Row::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        decoded.push(column.name(), decode_column(row, index)?);
    }
    Ok(decoded)
}

/// Decode by the runtime type of the value, falling back through the
/// common representations when the driver reports an unfamiliar one.
fn decode_column(row: &AnyRow, index: usize) -> Result<Value> {
    let kind = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };

    let value = match kind.as_str() {
        "BOOLEAN" | "BOOL" => row.try_get::<bool, _>(index).map(Value::Bool),
        "SMALLINT" | "INTEGER" | "INT" | "BIGINT" => row.try_get::<i64, _>(index).map(Value::Int),
        "REAL" | "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" => decode_float(row, index),
        "BLOB" | "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),
        "TEXT" | "VARCHAR" => row.try_get::<String, _>(index).map(Value::Text),
        _ => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .or_else(|_| decode_float(row, index))
            .or_else(|_| row.try_get::<String, _>(index).map(Value::Text))
            .or_else(|_| row.try_get::<Vec<u8>, _>(index).map(Value::Bytes)),
    };
    Ok(value?)
}

fn decode_float(row: &AnyRow, index: usize) -> std::result::Result<Value, sqlx::Error> {
    row.try_get::<f64, _>(index)
        .or_else(|_| row.try_get::<f32, _>(index).map(f64::from))
        .map(Value::Float)
}
