use std::io;

use thiserror::Error;
use warp::http::StatusCode;

/// Failures while materializing the local Parquet file.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Status {0} al descargar parquet")]
    Status(u16),

    #[error("download failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("writing local parquet failed: {0}")]
    Io(#[from] io::Error),

    #[error("downloaded parquet is unreadable: {0}")]
    Corrupt(String),
}

/// Failures raised by the query engine.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    Engine(String),
}

impl From<duckdb::Error> for QueryError {
    fn from(e: duckdb::Error) -> Self {
        QueryError::Engine(e.to_string())
    }
}

/// Everything that can end a `/buscar` request early.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Número de identidad inválido")]
    InvalidInput,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("lookup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl LookupError {
    pub fn status(&self) -> StatusCode {
        match self {
            LookupError::InvalidInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_carries_code() {
        let e = LookupError::from(FetchError::Status(403));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(e.to_string().contains("403"));
    }

    #[test]
    fn invalid_input_is_client_error() {
        assert_eq!(LookupError::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            LookupError::InvalidInput.to_string(),
            "Número de identidad inválido"
        );
    }
}
