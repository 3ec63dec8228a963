//! Blog domain records: users, posts and their comments
//!
//! Each type declares its columns against `awesome-orm`; ids default to
//! [`next_id`] and `created_at` to the current Unix time in seconds.

pub mod blog;
pub mod comment;
pub mod ids;
pub mod user;

pub use blog::Blog;
pub use comment::Comment;
pub use ids::{next_id, now_timestamp};
pub use user::User;

use awesome_orm::{Executor, Record, Result};
use tracing::info;

/// Derive every model's schema up front so declaration mistakes fail at
/// startup instead of on first query.
pub fn register_all() -> Result<()> {
    for schema in [User::schema()?, Blog::schema()?, Comment::schema()?] {
        info!(model = schema.model(), table = schema.table(), "registered model");
    }
    Ok(())
}

/// Create any missing tables for the registered models
pub async fn create_tables<E>(db: &E) -> Result<()>
where
    E: Executor + ?Sized,
{
    for schema in [User::schema()?, Blog::schema()?, Comment::schema()?] {
        db.execute(schema.create_table_sql(), &[], true).await?;
    }
    Ok(())
}
