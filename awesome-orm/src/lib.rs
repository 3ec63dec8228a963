//! awesome-orm: a minimal declarative record mapper over a pooled async SQL connection
//!
//! Record types declare their fields once; the registrar derives the table
//! name, primary key and canned SELECT/INSERT/UPDATE/DELETE templates, and the
//! executor runs them through a shared sqlx pool.
//!
//! # Architecture
//!
//! - [`field`]: field descriptors (column type, primary-key flag, default)
//! - [`schema`]: schema derivation, per-type schema cells, query builders
//! - [`dialect`]: placeholder/identifier translation per driver
//! - [`config`]: layered pool configuration
//! - [`pool`]: the connection pool handle
//! - [`executor`]: select/execute over pooled connections
//! - [`record`]: `find`/`find_all`/`find_number` and `save`/`update`/`remove`
//!
//! # Example
//!
//! ```no_run
//! use awesome_orm::{Database, DbConfig, Declaration, Field, Record, SchemaCell, Value};
//!
//! #[derive(Debug, Default)]
//! struct Tag {
//!     id: Option<i64>,
//!     label: String,
//! }
//!
//! impl Record for Tag {
//!     fn declare() -> Declaration {
//!         Declaration::new("Tag")
//!             .table("tags")
//!             .field("id", Field::integer().primary_key())
//!             .field("label", Field::string())
//!     }
//!
//!     fn schema_cell() -> &'static SchemaCell {
//!         static CELL: SchemaCell = SchemaCell::new();
//!         &CELL
//!     }
//!
//!     fn get(&self, field: &str) -> Option<Value> {
//!         match field {
//!             "id" => self.id.map(Value::from),
//!             "label" => Some(self.label.clone().into()),
//!             _ => None,
//!         }
//!     }
//!
//!     fn set(&mut self, field: &str, value: Value) -> awesome_orm::Result<()> {
//!         use awesome_orm::FromValue;
//!         match field {
//!             "id" => self.id = FromValue::from_value(value)?,
//!             "label" => self.label = FromValue::from_value(value)?,
//!             _ => return Err(awesome_orm::OrmError::attribute_missing("Tag", field)),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> awesome_orm::Result<()> {
//! let config = DbConfig::from_toml_str(
//!     "[db]\nuser = \"www-data\"\npassword = \"www-data\"\ndb = \"awesome\"",
//! )?;
//! let db = Database::create_pool(&config).await?;
//!
//! let mut tag = Tag { id: Some(1), label: "rust".into() };
//! tag.save(&db).await?;
//! let found = Tag::find(&db, 1).await?;
//! assert_eq!(found.map(|t| t.label), Some("rust".to_string()));
//!
//! db.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod field;
pub mod pool;
pub mod record;
pub mod schema;
pub mod value;

pub use config::DbConfig;
pub use dialect::Driver;
pub use error::{ConfigError, DeclarationError, OrmError, Result};
pub use executor::Executor;
pub use field::{Field, FieldDefault, Producer};
pub use pool::{Database, ScopedConnection};
pub use record::Record;
pub use schema::{Declaration, FindAll, Limit, Mapping, Schema, SchemaCell, Templates};
pub use value::{FromValue, Row, SqlType, Value};
