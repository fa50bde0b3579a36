// db/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
            if db_err.code().is_some_and(|code| is_lost_race(&code)) {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }

        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

/// Deadlock (`40P01`) and serialization failure (`40001`): the transaction
/// lost to a concurrent writer.
fn is_lost_race(code: &str) -> bool {
    matches!(code, "40P01" | "40001")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_failures_count_as_conflicts() {
        assert!(is_lost_race("40P01"));
        assert!(is_lost_race("40001"));
        assert!(!is_lost_race("23503"));
    }

    #[test]
    fn missing_rows_are_not_found() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::NotFound
        ));
    }
}
