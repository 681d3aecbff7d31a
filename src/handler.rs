use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use warp::http::StatusCode;

use crate::duck::CitizenLookup;
use crate::error::LookupError;
use crate::fetch::RemoteFile;
use crate::record::CitizenRecord;

/// Fewest digits accepted as an identity number.
pub const MIN_IDENTITY_DIGITS: usize = 6;

pub const NOT_FOUND_MESSAGE: &str = "No encontrado";

/// JSON body of a `/buscar` response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LookupBody {
    Record(CitizenRecord),
    NotFound { mensaje: &'static str },
    Error { error: String },
}

/// Keep only the ASCII digits of `raw`.
pub fn sanitize_identity(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// The `/buscar` pipeline: validate, make sure the file is local, query.
pub struct Lookup {
    remote: RemoteFile,
    store: Arc<dyn CitizenLookup>,
}

impl Lookup {
    pub fn new(remote: RemoteFile, store: Arc<dyn CitizenLookup>) -> Self {
        Self { remote, store }
    }

    pub async fn handle_lookup(&self, raw: &str) -> (StatusCode, LookupBody) {
        match self.resolve(raw).await {
            Ok(Some(record)) => (StatusCode::OK, LookupBody::Record(record)),
            Ok(None) => (
                StatusCode::OK,
                LookupBody::NotFound {
                    mensaje: NOT_FOUND_MESSAGE,
                },
            ),
            Err(e) => {
                let status = e.status();
                if status.is_server_error() {
                    error!(error = ?e, "lookup failed");
                }
                (
                    status,
                    LookupBody::Error {
                        error: e.to_string(),
                    },
                )
            }
        }
    }

    async fn resolve(&self, raw: &str) -> Result<Option<CitizenRecord>, LookupError> {
        let identity = sanitize_identity(raw);
        if identity.len() < MIN_IDENTITY_DIGITS {
            return Err(LookupError::InvalidInput);
        }

        self.remote.ensure_local_file().await?;

        let store = Arc::clone(&self.store);
        let record = tokio::task::spawn_blocking(move || store.lookup(&identity)).await??;
        Ok(record)
    }
}
