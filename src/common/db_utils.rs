// src/common/db_utils.rs

use crate::common::error::AppError;

/// Turns a unique-constraint violation into a 409 with `message`; other errors pass through.
pub(crate) fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(message.to_string());
        }
    }
    e.into()
}
