use sqlx::PgPool;

use crate::app_error::AppError;

pub mod account;
pub mod ledger;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // PostgreSQL unique violation
                if db_err.is_unique_violation() || msg.contains("duplicate key") {
                    AppError::InvalidInput("A record with this value already exists".into())
                } else {
                    tracing::error!(error = ?err, "Database error");
                    AppError::Persistence("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Persistence("Database operation failed".into())
            }
        }
    }
}
