use awesome_orm::{Declaration, Field, FromValue, OrmError, Record, Result, SchemaCell, Value};
use serde::{Deserialize, Serialize};

use crate::ids::{next_id_value, now_value};

/// Registered account.
///
/// Plain `String` fields map onto `NOT NULL` columns; a NULL written there by
/// other tooling fails to load with a conversion error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<String>,
    pub email: String,
    pub passwd: String,
    pub admin: Option<bool>,
    pub name: String,
    pub image: String,
    pub created_at: Option<f64>,
}

impl User {
    /// Copy safe to hand to clients: the password hash is masked
    pub fn redacted(&self) -> Self {
        Self {
            passwd: "******".to_string(),
            ..self.clone()
        }
    }
}

impl Record for User {
    fn declare() -> Declaration {
        Declaration::new("User")
            .table("users")
            .field(
                "id",
                Field::string()
                    .primary_key()
                    .ddl("varchar(50)")
                    .default_with(next_id_value),
            )
            .field("email", Field::string().ddl("varchar(50) not null"))
            .field("passwd", Field::string().ddl("varchar(50) not null"))
            .field("admin", Field::boolean())
            .field("name", Field::string().ddl("varchar(50) not null"))
            .field("image", Field::string().ddl("varchar(500) not null"))
            .field("created_at", Field::float().default_with(now_value))
    }

    fn schema_cell() -> &'static SchemaCell {
        static CELL: SchemaCell = SchemaCell::new();
        &CELL
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => self.id.clone().map(Value::from),
            "email" => Some(self.email.clone().into()),
            "passwd" => Some(self.passwd.clone().into()),
            "admin" => self.admin.map(Value::from),
            "name" => Some(self.name.clone().into()),
            "image" => Some(self.image.clone().into()),
            "created_at" => self.created_at.map(Value::from),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = FromValue::from_value(value)?,
            "email" => self.email = FromValue::from_value(value)?,
            "passwd" => self.passwd = FromValue::from_value(value)?,
            "admin" => self.admin = FromValue::from_value(value)?,
            "name" => self.name = FromValue::from_value(value)?,
            "image" => self.image = FromValue::from_value(value)?,
            "created_at" => self.created_at = FromValue::from_value(value)?,
            _ => return Err(OrmError::attribute_missing("User", field)),
        }
        Ok(())
    }
}
