//! Repository Module
//!
//! Data access for the embedded SurrealDB store. Every state-machine mutation
//! is a single conditional `UPDATE … WHERE <expected state> RETURN AFTER`
//! statement: the store executes the read-check-write indivisibly, so
//! concurrent callers race on the condition, never on two round trips.

pub mod notification;
pub mod order;

pub use notification::NotificationRepository;
pub use order::{AdminOrderFilter, OrderRepository};

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;
use thiserror::Error;

use crate::utils::AppError;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Parse a `"table:id"` string and require it to reference the given table
///
/// 网关回调 URL 里携带的订单 id 属于不可信输入，入库前必须先过这里。
pub fn parse_id(id: &str, table: &str) -> RepoResult<RecordId> {
    let record: RecordId = id
        .parse()
        .map_err(|_| RepoError::Validation(format!("Invalid id format: {}", id)))?;
    if record.table() != table {
        return Err(RepoError::Validation(format!(
            "Expected a {} id, got: {}",
            table, id
        )));
    }
    Ok(record)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
