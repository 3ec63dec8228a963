//! Error types for awesome-orm
//!
//! Declaration and configuration problems are fatal at startup; everything
//! else is request-scoped and handed back to the caller unchanged.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::value::Value;

/// Raised while deriving a [`Schema`](crate::schema::Schema) from a declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    #[error("duplicate primary key for field '{field}' in model {model}")]
    DuplicatePrimaryKey { model: String, field: String },

    #[error("primary key not found in model {model}")]
    MissingPrimaryKey { model: String },

    #[error("field '{field}' declared twice in model {model}")]
    DuplicateField { model: String, field: String },

    /// Table and column names must be plain `[A-Za-z_][A-Za-z0-9_]*` identifiers
    #[error("invalid identifier '{ident}' in model {model}")]
    InvalidIdentifier { model: String, ident: String },

    #[error("invalid column type '{column_type}' for field '{field}' in model {model}")]
    InvalidColumnType {
        model: String,
        field: String,
        column_type: String,
    },
}

/// Configuration loading/validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Mandatory key absent after all layers were applied
    #[error("missing required database setting '{key}'")]
    Missing { key: &'static str },

    #[error("failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

impl ConfigError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// Main error type for record operations
#[derive(Error, Debug)]
pub enum OrmError {
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `limit` was neither a single count nor an `(offset, count)` pair
    #[error("invalid limit value: {value}")]
    InvalidLimit { value: String },

    #[error("'{model}' object has no attribute '{field}'")]
    AttributeMissing { model: String, field: String },

    #[error("cannot convert {found} value into {expected}")]
    Conversion {
        expected: &'static str,
        found: &'static str,
    },

    /// Driver-level failure during select/execute
    #[error("execution failed: {0}")]
    Execution(#[from] sqlx::Error),
}

/// Result type alias for awesome-orm operations
pub type Result<T> = std::result::Result<T, OrmError>;

impl OrmError {
    pub fn invalid_limit(values: &[Value]) -> Self {
        Self::InvalidLimit {
            value: format!("{values:?}"),
        }
    }

    pub fn attribute_missing(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::AttributeMissing {
            model: model.into(),
            field: field.into(),
        }
    }

    pub fn conversion(expected: &'static str, found: &Value) -> Self {
        Self::Conversion {
            expected,
            found: found.type_name(),
        }
    }
}
