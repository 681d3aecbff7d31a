// src/fetch.rs

use futures::StreamExt;
use parquet::file::reader::{FileReader, SerializedFileReader};
use reqwest::{Client, StatusCode};
use std::{
    io,
    path::{Path, PathBuf},
    time::Instant,
};
use tokio::{fs, io::AsyncWriteExt, sync::OnceCell};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::FetchError;

/// A local copy of a remote Parquet file, downloaded on first use.
///
/// The first call to [`RemoteFile::ensure_local_file`] checks the disk and
/// downloads if needed; concurrent callers wait on that same attempt. The
/// body is streamed into `<name>.part` and only renamed onto the final path
/// once it is complete and its footer parses, so the final path never holds
/// a partial file.
pub struct RemoteFile {
    client: Client,
    url: Url,
    path: PathBuf,
    ready: OnceCell<PathBuf>,
}

impl RemoteFile {
    pub fn new(client: Client, url: Url, path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            url,
            path: path.into(),
            ready: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Guarantee the file is on disk. Once this succeeds it never touches
    /// the disk or network again for the life of `self`.
    pub async fn ensure_local_file(&self) -> Result<&Path, FetchError> {
        let path = self.ready.get_or_try_init(|| self.materialize()).await?;
        Ok(path.as_path())
    }

    async fn materialize(&self) -> Result<PathBuf, FetchError> {
        if fs::try_exists(&self.path).await? {
            match parquet_row_count(self.path.clone()).await {
                Ok(rows) => {
                    debug!(path = %self.path.display(), rows, "local parquet present");
                    return Ok(self.path.clone());
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "discarding unreadable local parquet");
                    fs::remove_file(&self.path).await?;
                }
            }
        }

        self.download().await?;
        Ok(self.path.clone())
    }

    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    async fn download(&self) -> Result<(), FetchError> {
        info!("Descargando {} desde {}", self.path.display(), self.url);
        let start = Instant::now();

        let resp = self.client.get(self.url.clone()).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let part = part_path(&self.path);
        let bytes = match stream_to_file(resp, &part).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                return Err(e);
            }
        };

        let rows = match parquet_row_count(part.clone()).await {
            Ok(rows) => rows,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                return Err(e);
            }
        };

        fs::rename(&part, &self.path).await?;
        info!(bytes, rows, elapsed = ?start.elapsed(), "parquet downloaded");
        Ok(())
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Write the response body chunk by chunk; returns bytes written.
async fn stream_to_file(resp: reqwest::Response, dest: &Path) -> Result<u64, FetchError> {
    let mut file = fs::File::create(dest).await?;
    let mut body = resp.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// Parse the Parquet footer; fails on truncated or foreign files.
async fn parquet_row_count(path: PathBuf) -> Result<i64, FetchError> {
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&path)?;
        let reader =
            SerializedFileReader::new(file).map_err(|e| FetchError::Corrupt(e.to_string()))?;
        Ok(reader.metadata().file_metadata().num_rows())
    })
    .await
    .map_err(|e| FetchError::Io(io::Error::new(io::ErrorKind::Other, e)))?
}
