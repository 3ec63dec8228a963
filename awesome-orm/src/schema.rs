//! Schema registrar
//!
//! Turns a [`Declaration`] into an immutable [`Schema`]: table name, primary
//! key, ordered non-key fields and the canned SELECT/INSERT/UPDATE/DELETE
//! templates. Derivation runs once per record type through a [`SchemaCell`].
//!
//! Templates use backtick-quoted identifiers and `?` placeholders; the
//! executor rewrites both for the target driver.

use std::collections::HashSet;
use std::sync::OnceLock;

use tracing::{debug, info};

use crate::error::{DeclarationError, OrmError, Result};
use crate::field::Field;
use crate::value::Value;

/// Column alias used by `find_number`
pub const COUNT_ALIAS: &str = "_count_";

/// A record type declaration: named field descriptors plus an optional table name
#[derive(Debug, Clone)]
pub struct Declaration {
    name: String,
    table: Option<String>,
    fields: Vec<(String, Field)>,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    /// Override the table name (defaults to the type name)
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One mapped attribute after derivation
#[derive(Debug, Clone)]
pub struct Mapping {
    name: String,
    column: String,
    field: Field,
}

impl Mapping {
    /// Attribute name on the record type
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn field(&self) -> &Field {
        &self.field
    }
}

/// The four canned statements, plus the single-row finder and table DDL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub select: String,
    pub find: String,
    pub insert: String,
    /// `None` when the type has no non-key fields
    pub update: Option<String>,
    pub delete: String,
    pub create_table: String,
}

/// Derived, immutable mapping from a record type to its table
#[derive(Debug, Clone)]
pub struct Schema {
    model: String,
    table: String,
    primary_key: Mapping,
    fields: Vec<Mapping>,
    templates: Templates,
}

impl Schema {
    /// Derive a schema from a declaration.
    ///
    /// # Errors
    ///
    /// Fails when the declaration has zero or several primary keys, repeats a
    /// field name, or uses a table/column name that is not a plain identifier.
    pub fn derive(declaration: &Declaration) -> std::result::Result<Self, DeclarationError> {
        let model = declaration.name.clone();
        let table = declaration
            .table
            .clone()
            .unwrap_or_else(|| declaration.name.clone());
        check_identifier(&model, &table)?;
        info!(model = %model, table = %table, "found model");

        let mut seen = HashSet::new();
        let mut primary_key: Option<Mapping> = None;
        let mut fields = Vec::new();

        for (name, field) in &declaration.fields {
            if !seen.insert(name.as_str()) {
                return Err(DeclarationError::DuplicateField {
                    model,
                    field: name.clone(),
                });
            }
            let column = field.column_name().unwrap_or(name).to_owned();
            check_identifier(&model, name)?;
            check_identifier(&model, &column)?;
            check_column_type(&model, name, field.column_type())?;
            debug!(model = %model, field = %name, mapping = %field, "found mapping");

            let mapping = Mapping {
                name: name.clone(),
                column,
                field: field.clone(),
            };
            if field.is_primary_key() {
                if primary_key.is_some() {
                    return Err(DeclarationError::DuplicatePrimaryKey {
                        model,
                        field: name.clone(),
                    });
                }
                primary_key = Some(mapping);
            } else {
                fields.push(mapping);
            }
        }

        let primary_key =
            primary_key.ok_or_else(|| DeclarationError::MissingPrimaryKey { model: model.clone() })?;
        let templates = build_templates(&table, &primary_key, &fields);

        Ok(Self {
            model,
            table,
            primary_key,
            fields,
            templates,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary key attribute name
    pub fn primary_key(&self) -> &str {
        &self.primary_key.name
    }

    pub fn primary_key_mapping(&self) -> &Mapping {
        &self.primary_key
    }

    /// Non-key fields in declaration order
    pub fn fields(&self) -> &[Mapping] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|m| m.name.as_str())
    }

    /// Look up a mapping (primary key included) by attribute name
    pub fn mapping(&self, name: &str) -> Option<&Mapping> {
        std::iter::once(&self.primary_key)
            .chain(&self.fields)
            .find(|m| m.name == name)
    }

    /// Attribute name backing a result column
    pub fn attribute_for_column(&self, column: &str) -> Option<&str> {
        std::iter::once(&self.primary_key)
            .chain(&self.fields)
            .find(|m| m.column == column)
            .map(|m| m.name.as_str())
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn select_sql(&self) -> &str {
        &self.templates.select
    }

    pub fn insert_sql(&self) -> &str {
        &self.templates.insert
    }

    pub fn update_sql(&self) -> Option<&str> {
        self.templates.update.as_deref()
    }

    pub fn delete_sql(&self) -> &str {
        &self.templates.delete
    }

    pub fn create_table_sql(&self) -> &str {
        &self.templates.create_table
    }

    /// Single-row lookup by primary key
    pub fn find_query(&self, pk: Value) -> (String, Vec<Value>) {
        (self.templates.find.clone(), vec![pk])
    }

    /// Build the statement for `find_all`. Clause order is fixed:
    /// WHERE, ORDER BY, LIMIT.
    pub fn find_all_query(&self, query: &FindAll) -> (String, Vec<Value>) {
        let mut sql = self.templates.select.clone();
        let mut args = query.args.clone();

        if let Some(filter) = &query.filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        if let Some(order_by) = &query.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        match query.limit {
            Some(Limit::Count(count)) => {
                sql.push_str(" LIMIT ?");
                args.push(count.into());
            }
            Some(Limit::Range { offset, count }) => {
                sql.push_str(" LIMIT ?, ?");
                args.push(offset.into());
                args.push(count.into());
            }
            None => {}
        }
        (sql, args)
    }

    /// `SELECT <expr> AS _count_ FROM <table> [WHERE ...]`
    pub fn find_number_query(
        &self,
        select_expr: &str,
        filter: Option<&str>,
        args: Vec<Value>,
    ) -> (String, Vec<Value>) {
        let mut sql = format!(
            "SELECT {} AS {} FROM {}",
            select_expr,
            COUNT_ALIAS,
            quote(&self.table)
        );
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        (sql, args)
    }
}

fn build_templates(table: &str, primary_key: &Mapping, fields: &[Mapping]) -> Templates {
    let table = quote(table);
    let pk = quote(&primary_key.column);
    let columns: Vec<String> = fields.iter().map(|m| quote(&m.column)).collect();

    let select = if columns.is_empty() {
        format!("SELECT {pk} FROM {table}")
    } else {
        format!("SELECT {pk}, {} FROM {table}", columns.join(", "))
    };
    let find = format!("{select} WHERE {pk} = ?");

    let mut insert_columns = columns.clone();
    insert_columns.push(pk.clone());
    let insert = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        insert_columns.join(", "),
        placeholders(insert_columns.len())
    );

    let update = (!columns.is_empty()).then(|| {
        let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
        format!("UPDATE {table} SET {} WHERE {pk} = ?", assignments.join(", "))
    });
    let delete = format!("DELETE FROM {table} WHERE {pk} = ?");

    let mut definitions = vec![format!("{pk} {} NOT NULL", primary_key.field.column_type())];
    definitions.extend(
        fields
            .iter()
            .map(|m| format!("{} {}", quote(&m.column), m.field.column_type())),
    );
    definitions.push(format!("PRIMARY KEY ({pk})"));
    let create_table = format!(
        "CREATE TABLE IF NOT EXISTS {table} ({})",
        definitions.join(", ")
    );

    Templates {
        select,
        find,
        insert,
        update,
        delete,
        create_table,
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Identifiers are validated at declaration time, so quoting never needs escaping
fn quote(ident: &str) -> String {
    format!("`{ident}`")
}

fn check_identifier(model: &str, ident: &str) -> std::result::Result<(), DeclarationError> {
    let mut chars = ident.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DeclarationError::InvalidIdentifier {
            model: model.to_owned(),
            ident: ident.to_owned(),
        })
    }
}

fn check_column_type(
    model: &str,
    field: &str,
    column_type: &str,
) -> std::result::Result<(), DeclarationError> {
    let valid = !column_type.trim().is_empty()
        && column_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '(' | ')' | ',' | '_'));
    if valid {
        Ok(())
    } else {
        Err(DeclarationError::InvalidColumnType {
            model: model.to_owned(),
            field: field.to_owned(),
            column_type: column_type.to_owned(),
        })
    }
}

/// Per-type holder for the derived schema.
///
/// Each record type owns one `static` cell; the first successful derivation
/// wins and is shared read-only afterwards.
#[derive(Debug, Default)]
pub struct SchemaCell(OnceLock<Schema>);

impl SchemaCell {
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    pub fn get_or_derive(
        &self,
        declare: impl FnOnce() -> Declaration,
    ) -> std::result::Result<&Schema, DeclarationError> {
        if let Some(schema) = self.0.get() {
            return Ok(schema);
        }
        let schema = Schema::derive(&declare())?;
        Ok(self.0.get_or_init(|| schema))
    }

    pub fn get(&self) -> Option<&Schema> {
        self.0.get()
    }
}

/// Row limit for `find_all`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Count(u32),
    Range { offset: u32, count: u32 },
}

impl From<u32> for Limit {
    fn from(count: u32) -> Self {
        Limit::Count(count)
    }
}

impl From<(u32, u32)> for Limit {
    fn from((offset, count): (u32, u32)) -> Self {
        Limit::Range { offset, count }
    }
}

impl TryFrom<&[Value]> for Limit {
    type Error = OrmError;

    /// Accepts exactly one count or an `(offset, count)` pair of non-negative integers.
    fn try_from(values: &[Value]) -> Result<Self> {
        let as_u32 = |value: &Value| value.as_i64().and_then(|n| u32::try_from(n).ok());
        let limit = match values {
            [count] => as_u32(count).map(Limit::Count),
            [offset, count] => as_u32(offset)
                .zip(as_u32(count))
                .map(|(offset, count)| Limit::Range { offset, count }),
            _ => None,
        };
        limit.ok_or_else(|| OrmError::invalid_limit(values))
    }
}

impl TryFrom<Value> for Limit {
    type Error = OrmError;

    fn try_from(value: Value) -> Result<Self> {
        Limit::try_from(std::slice::from_ref(&value))
    }
}

/// Optional clauses appended to the select template by `find_all`
#[derive(Debug, Clone, Default)]
pub struct FindAll {
    filter: Option<String>,
    args: Vec<Value>,
    order_by: Option<String>,
    limit: Option<Limit>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    /// WHERE clause body with `?` placeholders and its arguments
    pub fn filter<I, V>(mut self, filter: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter = Some(filter.into());
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Dynamically shaped limit, e.g. straight from request parameters.
    ///
    /// # Errors
    ///
    /// `InvalidLimit` unless `values` is one count or an `(offset, count)` pair.
    pub fn try_limit(self, values: &[Value]) -> Result<Self> {
        let limit = Limit::try_from(values)?;
        Ok(self.limit(limit))
    }
}
