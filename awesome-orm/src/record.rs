//! Record finders and mutators
//!
//! A record type is a plain struct that implements [`Record`]: it declares its
//! fields once, exposes them by name through `get`/`set`, and inherits
//! `find`/`find_all`/`find_number` and `save`/`update`/`remove`.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{OrmError, Result};
use crate::executor::Executor;
use crate::schema::{Declaration, FindAll, Schema, SchemaCell, COUNT_ALIAS};
use crate::value::{Row, Value};

#[async_trait]
pub trait Record: Default + Send + Sync + Sized + 'static {
    /// Field descriptors and optional table name for this type
    fn declare() -> Declaration;

    /// Static cell the derived schema is cached in
    fn schema_cell() -> &'static SchemaCell;

    /// Current value of an attribute; `None` when unset or unknown
    fn get(&self, field: &str) -> Option<Value>;

    /// Assign an attribute from a dynamic value.
    ///
    /// # Errors
    ///
    /// `AttributeMissing` for names the type does not declare, `Conversion`
    /// when the value does not fit the field's type.
    fn set(&mut self, field: &str, value: Value) -> Result<()>;

    /// Derived schema, computed on first use and shared afterwards.
    ///
    /// Call it once at startup to surface declaration errors early.
    fn schema() -> Result<&'static Schema> {
        Ok(Self::schema_cell().get_or_derive(Self::declare)?)
    }

    /// Strict accessor: unset attributes are a caller error
    fn value(&self, field: &str) -> Result<Value> {
        self.get(field).ok_or_else(|| {
            let model = Self::schema().map(Schema::model).unwrap_or("Record");
            OrmError::attribute_missing(model, field)
        })
    }

    /// Current value, or the declared default (stored back on the record).
    /// Unset fields without a default resolve to NULL.
    fn value_or_default(&mut self, field: &str) -> Result<Value> {
        if let Some(value) = self.get(field) {
            return Ok(value);
        }
        let schema = Self::schema()?;
        let mapping = schema
            .mapping(field)
            .ok_or_else(|| OrmError::attribute_missing(schema.model(), field))?;
        match mapping.field().default() {
            Some(default) => {
                let value = default.resolve();
                debug!(field, value = ?value, "using default value");
                self.set(field, value.clone())?;
                Ok(value)
            }
            None => Ok(Value::Null),
        }
    }

    /// Build an instance from a result row; unmapped columns are ignored.
    fn from_row(row: Row) -> Result<Self> {
        let schema = Self::schema()?;
        let mut record = Self::default();
        for (column, value) in row {
            if let Some(field) = schema.attribute_for_column(&column) {
                record.set(field, value)?;
            }
        }
        Ok(record)
    }

    /// Look up one record by primary key
    async fn find<E, K>(db: &E, pk: K) -> Result<Option<Self>>
    where
        E: Executor + ?Sized,
        K: Into<Value> + Send,
    {
        let schema = Self::schema()?;
        let (sql, args) = schema.find_query(pk.into());
        let rows = db.select(&sql, &args, Some(1)).await?;
        rows.into_iter().next().map(Self::from_row).transpose()
    }

    /// Select records with optional WHERE / ORDER BY / LIMIT clauses
    async fn find_all<E>(db: &E, query: FindAll) -> Result<Vec<Self>>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema()?;
        let (sql, args) = schema.find_all_query(&query);
        let rows = db.select(&sql, &args, None).await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    /// Scalar aggregate, e.g. `count(id)`; `None` when no row comes back
    async fn find_number<E>(
        db: &E,
        select_expr: &str,
        filter: Option<&str>,
        args: Vec<Value>,
    ) -> Result<Option<Value>>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema()?;
        let (sql, args) = schema.find_number_query(select_expr, filter, args);
        let rows = db.select(&sql, &args, Some(1)).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get(COUNT_ALIAS).cloned()))
    }

    /// Insert this record, filling unset fields from their defaults.
    ///
    /// Returns the affected-row count; zero is logged, not raised.
    async fn save<E>(&mut self, db: &E) -> Result<u64>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema()?;
        let mut args = Vec::with_capacity(schema.fields().len() + 1);
        for mapping in schema.fields() {
            let value = self.value_or_default(mapping.name())?;
            args.push(value.typed(mapping.field().sql_type()));
        }
        let pk = self.value_or_default(schema.primary_key())?;
        if pk.is_null() {
            return Err(OrmError::attribute_missing(schema.model(), schema.primary_key()));
        }
        args.push(pk);

        let affected = db.execute(schema.insert_sql(), &args, db.autocommit()).await?;
        log_write("insert", schema, affected);
        Ok(affected)
    }

    /// Write every non-key field back to the row with this primary key.
    /// Unset fields are written as NULL; defaults are not applied.
    async fn update<E>(&self, db: &E) -> Result<u64>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema()?;
        let pk = self.value(schema.primary_key())?;
        let Some(sql) = schema.update_sql() else {
            debug!(table = schema.table(), "no non-key fields to update");
            return Ok(0);
        };

        let mut args: Vec<Value> = schema
            .fields()
            .iter()
            .map(|mapping| {
                self.get(mapping.name())
                    .unwrap_or(Value::Null)
                    .typed(mapping.field().sql_type())
            })
            .collect();
        args.push(pk);

        let affected = db.execute(sql, &args, db.autocommit()).await?;
        log_write("update", schema, affected);
        Ok(affected)
    }

    /// Delete the row with this primary key
    async fn remove<E>(&self, db: &E) -> Result<u64>
    where
        E: Executor + ?Sized,
    {
        let schema = Self::schema()?;
        let args = [self.value(schema.primary_key())?];

        let affected = db.execute(schema.delete_sql(), &args, db.autocommit()).await?;
        log_write("remove", schema, affected);
        Ok(affected)
    }
}

fn log_write(action: &str, schema: &Schema, affected: u64) {
    if affected == 0 {
        warn!(table = schema.table(), affected, "failed to {action} by primary key");
    } else {
        info!(table = schema.table(), affected, "{action} by primary key succeeded");
    }
}
