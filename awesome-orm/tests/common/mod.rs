//! Shared fixtures for integration tests
//!
//! Every test gets its own file-backed SQLite database in a temp directory,
//! reached through the same pooled executor production code uses.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use awesome_orm::{
    Database, DbConfig, Declaration, Driver, Executor, Field, FromValue, OrmError, Record,
    SchemaCell, Value,
};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Pool plus the directory holding its database file
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

pub fn sqlite_config(dir: &TempDir, max_size: u32) -> DbConfig {
    DbConfig {
        driver: Driver::Sqlite,
        user: Some("root".into()),
        password: Some("secret".into()),
        db: Some(dir.path().join("awesome.db").display().to_string()),
        min_size: 1,
        max_size,
        ..DbConfig::default()
    }
}

pub async fn sqlite_db(max_size: u32) -> TestDb {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::create_pool(&sqlite_config(&dir, max_size))
        .await
        .expect("pool creation failed");
    TestDb { db, _dir: dir }
}

/// Database with the `notes` table already created
pub async fn notes_db() -> TestDb {
    let test_db = sqlite_db(4).await;
    let ddl = Note::schema().expect("Note declaration").create_table_sql();
    test_db
        .db
        .execute(ddl, &[], true)
        .await
        .expect("create notes table");
    test_db
}

pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs_f64()
}

fn next_note_id() -> Value {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    Value::Text(format!("note-{:06}", NEXT.fetch_add(1, Ordering::SeqCst)))
}

fn now_value() -> Value {
    Value::Float(now())
}

/// Record type covering every field kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Note {
    pub id: Option<String>,
    pub title: String,
    pub body: Option<String>,
    pub stars: Option<i64>,
    pub pinned: Option<bool>,
    pub created_at: Option<f64>,
}

impl Note {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }
}

impl Record for Note {
    fn declare() -> Declaration {
        Declaration::new("Note")
            .table("notes")
            .field(
                "id",
                Field::string()
                    .primary_key()
                    .ddl("varchar(50)")
                    .default_with(next_note_id),
            )
            .field("title", Field::string().ddl("varchar(50)"))
            .field("body", Field::text())
            .field("stars", Field::integer())
            .field("pinned", Field::boolean())
            .field("created_at", Field::float().default_with(now_value))
    }

    fn schema_cell() -> &'static SchemaCell {
        static CELL: SchemaCell = SchemaCell::new();
        &CELL
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => self.id.clone().map(Value::from),
            "title" => Some(self.title.clone().into()),
            "body" => self.body.clone().map(Value::from),
            "stars" => self.stars.map(Value::from),
            "pinned" => self.pinned.map(Value::from),
            "created_at" => self.created_at.map(Value::from),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> awesome_orm::Result<()> {
        match field {
            "id" => self.id = FromValue::from_value(value)?,
            "title" => self.title = FromValue::from_value(value)?,
            "body" => self.body = FromValue::from_value(value)?,
            "stars" => self.stars = FromValue::from_value(value)?,
            "pinned" => self.pinned = FromValue::from_value(value)?,
            "created_at" => self.created_at = FromValue::from_value(value)?,
            _ => return Err(OrmError::attribute_missing("Note", field)),
        }
        Ok(())
    }
}
