use awesome_orm::{Declaration, Field, FromValue, OrmError, Record, Result, SchemaCell, Value};
use serde::{Deserialize, Serialize};

use crate::ids::{next_id_value, now_value};
use crate::user::User;

/// Blog post. `String` fields map onto `NOT NULL` columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    pub id: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub user_image: String,
    pub name: String,
    pub summary: String,
    pub content: String,
    pub created_at: Option<f64>,
}

impl Blog {
    /// New post with the author columns copied from `author`
    pub fn by(author: &User, name: &str, summary: &str, content: &str) -> Self {
        Self {
            user_id: author.id.clone().unwrap_or_default(),
            user_name: author.name.clone(),
            user_image: author.image.clone(),
            name: name.to_string(),
            summary: summary.to_string(),
            content: content.to_string(),
            ..Self::default()
        }
    }
}

impl Record for Blog {
    fn declare() -> Declaration {
        Declaration::new("Blog")
            .table("blogs")
            .field(
                "id",
                Field::string()
                    .primary_key()
                    .ddl("varchar(50)")
                    .default_with(next_id_value),
            )
            .field("user_id", Field::string().ddl("varchar(50) not null"))
            .field("user_name", Field::string().ddl("varchar(50) not null"))
            .field("user_image", Field::string().ddl("varchar(500) not null"))
            .field("name", Field::string().ddl("varchar(50) not null"))
            .field("summary", Field::string().ddl("varchar(200) not null"))
            .field("content", Field::text().ddl("text not null"))
            .field("created_at", Field::float().default_with(now_value))
    }

    fn schema_cell() -> &'static SchemaCell {
        static CELL: SchemaCell = SchemaCell::new();
        &CELL
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => self.id.clone().map(Value::from),
            "user_id" => Some(self.user_id.clone().into()),
            "user_name" => Some(self.user_name.clone().into()),
            "user_image" => Some(self.user_image.clone().into()),
            "name" => Some(self.name.clone().into()),
            "summary" => Some(self.summary.clone().into()),
            "content" => Some(self.content.clone().into()),
            "created_at" => self.created_at.map(Value::from),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = FromValue::from_value(value)?,
            "user_id" => self.user_id = FromValue::from_value(value)?,
            "user_name" => self.user_name = FromValue::from_value(value)?,
            "user_image" => self.user_image = FromValue::from_value(value)?,
            "name" => self.name = FromValue::from_value(value)?,
            "summary" => self.summary = FromValue::from_value(value)?,
            "content" => self.content = FromValue::from_value(value)?,
            "created_at" => self.created_at = FromValue::from_value(value)?,
            _ => return Err(OrmError::attribute_missing("Blog", field)),
        }
        Ok(())
    }
}
