//! Statement shapes records hand to the executor, captured by a recording double

mod common;

use std::sync::Mutex;

use async_trait::async_trait;
use awesome_orm::{Executor, FindAll, Record, Result, Row, SqlType, Value};
use common::Note;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Select {
        sql: String,
        args: Vec<Value>,
        limit: Option<usize>,
    },
    Execute {
        sql: String,
        args: Vec<Value>,
        autocommit: bool,
    },
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Call>>,
    rows: Vec<Row>,
    affected: u64,
    autocommit: bool,
}

impl Recorder {
    fn affecting(affected: u64) -> Self {
        Self {
            affected,
            autocommit: true,
            ..Self::default()
        }
    }

    fn returning(rows: Vec<Row>) -> Self {
        Self {
            rows,
            autocommit: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for Recorder {
    async fn select(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<Vec<Row>> {
        self.calls.lock().unwrap().push(Call::Select {
            sql: sql.to_string(),
            args: args.to_vec(),
            limit,
        });
        let rows = self.rows.iter().take(limit.unwrap_or(usize::MAX));
        Ok(rows.cloned().collect())
    }

    async fn execute(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64> {
        self.calls.lock().unwrap().push(Call::Execute {
            sql: sql.to_string(),
            args: args.to_vec(),
            autocommit,
        });
        Ok(self.affected)
    }

    fn autocommit(&self) -> bool {
        self.autocommit
    }
}

fn stored_note() -> Note {
    Note {
        id: Some("n1".into()),
        title: "hello".into(),
        body: Some("world".into()),
        stars: Some(3),
        pinned: Some(true),
        created_at: Some(1.5),
    }
}

#[tokio::test]
async fn save_binds_fields_in_order_then_primary_key() {
    let db = Recorder::affecting(1);
    let mut note = stored_note();
    note.save(&db).await.unwrap();

    assert_eq!(
        db.calls(),
        [Call::Execute {
            sql: "INSERT INTO `notes` (`title`, `body`, `stars`, `pinned`, `created_at`, `id`) \
                  VALUES (?, ?, ?, ?, ?, ?)"
                .into(),
            args: vec![
                "hello".into(),
                "world".into(),
                Value::Int(3),
                Value::Bool(true),
                Value::Float(1.5),
                "n1".into(),
            ],
            autocommit: true,
        }]
    );
}

#[tokio::test]
async fn save_uses_executor_commit_mode() {
    let db = Recorder {
        affected: 1,
        autocommit: false,
        ..Recorder::default()
    };
    stored_note().save(&db).await.unwrap();
    assert!(matches!(
        db.calls().as_slice(),
        [Call::Execute { autocommit: false, .. }]
    ));
}

#[tokio::test]
async fn zero_affected_rows_is_not_an_error() {
    let db = Recorder::affecting(0);
    let mut note = stored_note();
    assert_eq!(note.save(&db).await.unwrap(), 0);
    assert_eq!(note.update(&db).await.unwrap(), 0);
    assert_eq!(note.remove(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn update_sets_every_non_key_field() {
    let db = Recorder::affecting(1);
    let mut note = stored_note();
    note.body = None;
    note.update(&db).await.unwrap();

    assert_eq!(
        db.calls(),
        [Call::Execute {
            sql: "UPDATE `notes` SET `title` = ?, `body` = ?, `stars` = ?, `pinned` = ?, \
                  `created_at` = ? WHERE `id` = ?"
                .into(),
            args: vec![
                "hello".into(),
                Value::TypedNull(SqlType::Text),
                Value::Int(3),
                Value::Bool(true),
                Value::Float(1.5),
                "n1".into(),
            ],
            autocommit: true,
        }]
    );
}

#[tokio::test]
async fn unset_fields_bind_nulls_typed_by_column() {
    let db = Recorder::affecting(1);
    let note = Note {
        id: Some("n1".into()),
        title: "hello".into(),
        ..Note::default()
    };
    note.update(&db).await.unwrap();

    let calls = db.calls();
    let [Call::Execute { args, .. }] = calls.as_slice() else {
        panic!("expected one execute call");
    };
    assert_eq!(
        args[1..5],
        [
            Value::TypedNull(SqlType::Text),
            Value::TypedNull(SqlType::Int),
            Value::TypedNull(SqlType::Bool),
            Value::TypedNull(SqlType::Float),
        ]
    );
}

#[tokio::test]
async fn save_types_nulls_for_fields_without_default() {
    let db = Recorder::affecting(1);
    let mut note = Note::titled("bare");
    note.save(&db).await.unwrap();

    let calls = db.calls();
    let [Call::Execute { args, .. }] = calls.as_slice() else {
        panic!("expected one execute call");
    };
    assert_eq!(args[1], Value::TypedNull(SqlType::Text));
    assert_eq!(args[2], Value::Int(0));
    assert_eq!(args[3], Value::Bool(false));
}

#[tokio::test]
async fn remove_binds_only_primary_key() {
    let db = Recorder::affecting(1);
    stored_note().remove(&db).await.unwrap();

    assert_eq!(
        db.calls(),
        [Call::Execute {
            sql: "DELETE FROM `notes` WHERE `id` = ?".into(),
            args: vec!["n1".into()],
            autocommit: true,
        }]
    );
}

#[tokio::test]
async fn find_asks_for_a_single_row() {
    let mut row = Row::new();
    row.push("id", "n1".into());
    row.push("title", "hello".into());
    row.push("extra_column", Value::Int(7));
    let db = Recorder::returning(vec![row]);

    let found = Note::find(&db, "n1").await.unwrap().unwrap();
    assert_eq!(found.id.as_deref(), Some("n1"));
    assert_eq!(found.title, "hello");
    assert_eq!(found.stars, None);

    assert_eq!(
        db.calls(),
        [Call::Select {
            sql: "SELECT `id`, `title`, `body`, `stars`, `pinned`, `created_at` FROM `notes` \
                  WHERE `id` = ?"
                .into(),
            args: vec!["n1".into()],
            limit: Some(1),
        }]
    );
}

#[tokio::test]
async fn find_all_appends_clauses_and_limit_args() {
    let db = Recorder::returning(vec![]);
    let found = Note::find_all(
        &db,
        FindAll::new()
            .filter("`stars` > ?", [2i64])
            .order_by("`created_at` DESC")
            .limit((10u32, 5u32)),
    )
    .await
    .unwrap();
    assert!(found.is_empty());

    assert_eq!(
        db.calls(),
        [Call::Select {
            sql: "SELECT `id`, `title`, `body`, `stars`, `pinned`, `created_at` FROM `notes` \
                  WHERE `stars` > ? ORDER BY `created_at` DESC LIMIT ?, ?"
                .into(),
            args: vec![Value::Int(2), Value::Int(10), Value::Int(5)],
            limit: None,
        }]
    );
}

#[tokio::test]
async fn find_number_reads_count_alias() {
    let mut row = Row::new();
    row.push("_count_", Value::Int(42));
    let db = Recorder::returning(vec![row]);

    let count = Note::find_number(&db, "count(`id`)", Some("`pinned` = ?"), vec![true.into()])
        .await
        .unwrap();
    assert_eq!(count, Some(Value::Int(42)));

    assert_eq!(
        db.calls(),
        [Call::Select {
            sql: "SELECT count(`id`) AS _count_ FROM `notes` WHERE `pinned` = ?".into(),
            args: vec![Value::Bool(true)],
            limit: Some(1),
        }]
    );
}

#[tokio::test]
async fn find_number_without_rows_is_none() {
    let db = Recorder::returning(vec![]);
    let count = Note::find_number(&db, "max(`stars`)", None, vec![])
        .await
        .unwrap();
    assert_eq!(count, None);
}
