//! Field descriptors
//!
//! A [`Field`] is declaration-time metadata for one mapped attribute: its DDL
//! column type, whether it is the primary key, and an optional default.

use std::fmt;

use crate::value::{SqlType, Value};

/// Zero-argument default producer, invoked once per `save`
pub type Producer = fn() -> Value;

/// Default applied by `save` when an attribute is unset
#[derive(Debug, Clone)]
pub enum FieldDefault {
    Value(Value),
    Producer(Producer),
}

impl FieldDefault {
    pub fn resolve(&self) -> Value {
        match self {
            FieldDefault::Value(value) => value.clone(),
            FieldDefault::Producer(produce) => produce(),
        }
    }
}

/// Descriptor for one mapped attribute
#[derive(Debug, Clone)]
pub struct Field {
    column: Option<String>,
    column_type: String,
    primary_key: bool,
    default: Option<FieldDefault>,
}

impl Field {
    pub fn new(column_type: impl Into<String>) -> Self {
        Self {
            column: None,
            column_type: column_type.into(),
            primary_key: false,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::new("varchar(100)")
    }

    pub fn boolean() -> Self {
        Self::new("boolean").default_value(false)
    }

    pub fn integer() -> Self {
        Self::new("bigint").default_value(0_i64)
    }

    pub fn float() -> Self {
        Self::new("double precision").default_value(0.0)
    }

    pub fn text() -> Self {
        Self::new("text")
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Override the DDL column type (e.g. `varchar(50)`)
    pub fn ddl(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = column_type.into();
        self
    }

    /// Map the attribute onto a differently named column
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    pub fn default_with(mut self, producer: Producer) -> Self {
        self.default = Some(FieldDefault::Producer(producer));
        self
    }

    pub fn column_name(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    /// Storage class used to type NULL parameters
    pub fn sql_type(&self) -> SqlType {
        SqlType::from_ddl(&self.column_type)
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Field, {}:{}>",
            self.column_type,
            self.column.as_deref().unwrap_or("-")
        )
    }
}
