use awesome_orm::{Declaration, Field, FromValue, OrmError, Record, Result, SchemaCell, Value};
use serde::{Deserialize, Serialize};

use crate::ids::{next_id_value, now_value};

/// Comment on a blog post. `String` fields map onto `NOT NULL` columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Option<String>,
    pub blog_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_image: String,
    pub content: String,
    pub created_at: Option<f64>,
}

impl Record for Comment {
    fn declare() -> Declaration {
        Declaration::new("Comment")
            .table("comments")
            .field(
                "id",
                Field::string()
                    .primary_key()
                    .ddl("varchar(50)")
                    .default_with(next_id_value),
            )
            .field("blog_id", Field::string().ddl("varchar(50) not null"))
            .field("user_id", Field::string().ddl("varchar(50) not null"))
            .field("user_name", Field::string().ddl("varchar(50) not null"))
            .field("user_image", Field::string().ddl("varchar(500) not null"))
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
            "blog_id" => Some(self.blog_id.clone().into()),
            "user_id" => Some(self.user_id.clone().into()),
            "user_name" => Some(self.user_name.clone().into()),
            "user_image" => Some(self.user_image.clone().into()),
            "content" => Some(self.content.clone().into()),
            "created_at" => self.created_at.map(Value::from),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "id" => self.id = FromValue::from_value(value)?,
            "blog_id" => self.blog_id = FromValue::from_value(value)?,
            "user_id" => self.user_id = FromValue::from_value(value)?,
            "user_name" => self.user_name = FromValue::from_value(value)?,
            "user_image" => self.user_image = FromValue::from_value(value)?,
            "content" => self.content = FromValue::from_value(value)?,
            "created_at" => self.created_at = FromValue::from_value(value)?,
            _ => return Err(OrmError::attribute_missing("Comment", field)),
        }
        Ok(())
    }
}
