use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database is at revision {found}, expected {expected}: {reason}")]
    Revision {
        found: i32,
        expected: i32,
        reason: &'static str,
    },

    #[error("migration {migration} failed at step `{step}`: {source}")]
    Migration {
        migration: i32,
        step: &'static str,
        source: tokio_postgres::Error,
    },
}

impl Error {
    /// True for postgres unique constraint violations (SQLSTATE 23505).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Postgres(err) => {
                err.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }
}
