//! Transfer session over an opendal operator

use async_trait::async_trait;
use ferrosync_types::{ByteStream, Error, Result, TransferSession};
use futures::StreamExt;
use opendal::{ErrorKind, Operator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// [`TransferSession`] performing every call through one [`Operator`].
///
/// Paths are relative to the operator's root and use `/` separators.
/// Directory paths are passed to opendal with a trailing slash.
/// The operator's connections are released when the last clone of the
/// session is dropped; after [`TransferSession::close`] every call fails.
#[derive(Debug, Clone)]
pub struct OperatorSession {
    operator: Operator,
    endpoint: String,
    closed: Arc<AtomicBool>,
}

impl OperatorSession {
    /// Wrap an operator that has already been checked
    pub fn new(operator: Operator, endpoint: impl Into<String>) -> Self {
        Self {
            operator,
            endpoint: endpoint.into(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Destination this session writes to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether [`TransferSession::close`] was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::connection(&self.endpoint, "session is closed"));
        }
        Ok(())
    }
}

fn directory_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        format!("{}/", name)
    } else {
        format!("{}/{}/", parent, name)
    }
}

fn query_error(path: &str, error: &opendal::Error) -> Error {
    Error::transfer(
        path.trim_end_matches('/'),
        format!("cannot query directory: {}", error),
    )
}

#[async_trait]
impl TransferSession for OperatorSession {
    async fn directory_exists(&self, parent: &str, name: &str) -> Result<bool> {
        self.ensure_open()?;
        let path = directory_path(parent, name);
        trace!("Querying remote directory '{}'", path);

        match self.operator.stat(&path).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(query_error(&path, &e)),
        }
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        self.ensure_open()?;
        self.operator
            .create_dir(&format!("{}/", path))
            .await
            .map_err(|e| Error::directory_creation(path, e.to_string()))
    }

    async fn upload_file(&self, path: &str, mut content: ByteStream) -> Result<u64> {
        self.ensure_open()?;
        let mut writer = self
            .operator
            .writer(path)
            .await
            .map_err(|e| Error::transfer(path, e.to_string()))?;

        let mut written = 0u64;
        while let Some(chunk) = content.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(e);
                }
            };

            written += chunk.len() as u64;
            if let Err(e) = writer.write(chunk).await {
                let _ = writer.abort().await;
                return Err(Error::transfer(path, e.to_string()));
            }
        }

        writer
            .close()
            .await
            .map_err(|e| Error::transfer(path, e.to_string()))?;
        trace!("Wrote {} bytes to '{}'", written, path);
        Ok(written)
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        self.ensure_open()?;
        match self.operator.delete(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::transfer(path, e.to_string())),
        }
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Closing session to {}", self.endpoint);
        }
        Ok(())
    }
}
