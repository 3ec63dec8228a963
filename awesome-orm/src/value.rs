//! Dynamic SQL values and result rows
//!
//! [`Value`] is what flows between typed records and the executor: bound as
//! statement arguments on the way in, decoded from driver rows on the way out.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{OrmError, Result};

/// Storage class of a column, derived from its DDL type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
}

impl SqlType {
    /// Classify a DDL column type such as `bigint` or `varchar(50)`.
    /// Anything unrecognized is treated as text.
    pub fn from_ddl(column_type: &str) -> Self {
        let ddl = column_type.to_ascii_lowercase();
        if ddl.contains("bool") {
            SqlType::Bool
        } else if ddl.contains("int") {
            SqlType::Int
        } else if ["double", "real", "float", "numeric", "decimal"]
            .iter()
            .any(|kind| ddl.contains(kind))
        {
            SqlType::Float
        } else if ["blob", "bytea", "binary"].iter().any(|kind| ddl.contains(kind)) {
            SqlType::Bytes
        } else {
            SqlType::Text
        }
    }
}

/// A single SQL value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// NULL bound with the column's type, for drivers that type parameters
    #[serde(serialize_with = "serialize_typed_null", skip_deserializing)]
    TypedNull(SqlType),
}

fn serialize_typed_null<S>(_: &SqlType, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_none()
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::TypedNull(_))
    }

    /// Attach `kind` to an untyped NULL; other values pass through
    pub fn typed(self, kind: SqlType) -> Self {
        match self {
            Value::Null => Value::TypedNull(kind),
            other => other,
        }
    }

    /// SQL-ish name of the variant, used in conversion errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null | Value::TypedNull(_) => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Conversion from a dynamic [`Value`] back into a typed record field.
///
/// Conversions are strict apart from the integer/boolean and integer/float
/// widenings drivers commonly need (`TINYINT(1)` booleans, integral `REAL`s).
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            other => Err(OrmError::conversion("bool", &other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(i) => Ok(i),
            Value::Bool(b) => Ok(i64::from(b)),
            other => Err(OrmError::conversion("i64", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(i) => i32::try_from(i).map_err(|_| OrmError::conversion("i32", &Value::Int(i))),
            Value::Bool(b) => Ok(i32::from(b)),
            other => Err(OrmError::conversion("i32", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(OrmError::conversion("f64", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(OrmError::conversion("String", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(OrmError::conversion("Vec<u8>", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            value if value.is_null() => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// One result row: column names paired with decoded values, in select order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_to_null() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }

    #[test]
    fn lenient_numeric_conversions() {
        assert!(bool::from_value(Value::Int(1)).unwrap());
        assert_eq!(f64::from_value(Value::Int(3)).unwrap(), 3.0);
        assert_eq!(i32::from_value(Value::Int(7)).unwrap(), 7);
        assert!(i32::from_value(Value::Int(i64::MAX)).is_err());
    }

    #[test]
    fn strict_text_conversion() {
        let err = String::from_value(Value::Int(5)).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert INTEGER value into String");
        assert!(String::from_value(Value::Null).is_err());
    }

    #[test]
    fn optional_fields_accept_null() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<f64>::from_value(Value::Float(1.5)).unwrap(),
            Some(1.5)
        );
    }

    #[test]
    fn ddl_types_classify_for_typed_nulls() {
        assert_eq!(SqlType::from_ddl("boolean"), SqlType::Bool);
        assert_eq!(SqlType::from_ddl("BIGINT"), SqlType::Int);
        assert_eq!(SqlType::from_ddl("double precision"), SqlType::Float);
        assert_eq!(SqlType::from_ddl("varchar(50)"), SqlType::Text);
        assert_eq!(SqlType::from_ddl("bytea"), SqlType::Bytes);

        assert_eq!(Value::Null.typed(SqlType::Bool), Value::TypedNull(SqlType::Bool));
        assert_eq!(Value::Int(1).typed(SqlType::Bool), Value::Int(1));
        assert!(Value::TypedNull(SqlType::Int).is_null());
        assert_eq!(
            Option::<i64>::from_value(Value::TypedNull(SqlType::Int)).unwrap(),
            None
        );
    }

    #[test]
    fn row_lookup_by_column() {
        let mut row = Row::new();
        row.push("id", Value::from("abc"));
        row.push("_count_", Value::Int(3));

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("_count_"), Some(&Value::Int(3)));
        assert_eq!(row.get("missing"), None);
    }
}
