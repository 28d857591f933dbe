//! Session establishment for parsed destinations

use crate::destination::{Credentials, Destination};
use crate::session::OperatorSession;
use async_trait::async_trait;
use ferrosync_config::TransferConfig;
use ferrosync_types::{Error, Result, SessionConnector, TransferSession};
use opendal::layers::TimeoutLayer;
use opendal::{services, Builder, Operator};
use tracing::{debug, info};

/// Opens [`OperatorSession`]s to a [`Destination`]
#[derive(Debug, Clone)]
pub struct OperatorConnector {
    destination: Destination,
    config: TransferConfig,
}

impl OperatorConnector {
    /// Create a connector for `destination`
    pub fn new(destination: Destination, config: TransferConfig) -> Self {
        Self {
            destination,
            config,
        }
    }

    /// Parse `address` and create a connector for it
    pub fn from_address(address: &str, config: TransferConfig) -> Result<Self> {
        Ok(Self::new(Destination::parse(address)?, config))
    }

    /// Destination sessions are opened to
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    fn finish<B: Builder>(&self, builder: B) -> Result<Operator> {
        let operator = Operator::new(builder)
            .map_err(|e| Error::connection(self.endpoint(), e.to_string()))?
            .layer(
                TimeoutLayer::default()
                    .with_timeout(self.config.operation_timeout())
                    .with_io_timeout(self.config.io_timeout()),
            )
            .finish();
        Ok(operator)
    }

    fn build_operator(&self) -> Result<Operator> {
        match &self.destination {
            Destination::Ftp {
                endpoint,
                root,
                credentials,
            } => {
                let mut builder = services::Ftp::default().endpoint(endpoint).root(root);
                if let Some(Credentials { user, password }) = credentials {
                    builder = builder.user(user);
                    if let Some(password) = password {
                        builder = builder.password(password);
                    }
                }
                self.finish(builder)
            }
            Destination::S3 {
                bucket,
                root,
                region,
                endpoint,
                credentials,
            } => {
                let mut builder = services::S3::default()
                    .bucket(bucket)
                    .region(region)
                    .root(root);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                if let Some(Credentials { user, password }) = credentials {
                    builder = builder.access_key_id(user);
                    if let Some(password) = password {
                        builder = builder.secret_access_key(password);
                    }
                }
                self.finish(builder)
            }
            Destination::Webdav {
                endpoint,
                root,
                credentials,
            } => {
                let mut builder = services::Webdav::default().endpoint(endpoint).root(root);
                if let Some(Credentials { user, password }) = credentials {
                    builder = builder.username(user);
                    if let Some(password) = password {
                        builder = builder.password(password);
                    }
                }
                self.finish(builder)
            }
            Destination::Fs { root } => {
                let builder = services::Fs::default().root(&root.to_string_lossy());
                self.finish(builder)
            }
        }
    }
}

#[async_trait]
impl SessionConnector for OperatorConnector {
    async fn connect(&self) -> Result<Box<dyn TransferSession>> {
        let operator = self.build_operator()?;
        let timeout = self.config.connect_timeout();
        debug!("Connecting to {} (timeout {:?})", self.endpoint(), timeout);

        match tokio::time::timeout(timeout, operator.check()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::connection(self.endpoint(), e.to_string())),
            Err(_) => {
                return Err(Error::Timeout {
                    endpoint: self.endpoint(),
                    seconds: timeout.as_secs(),
                })
            }
        }

        info!("Connected to {}", self.endpoint());
        Ok(Box::new(OperatorSession::new(operator, self.endpoint())))
    }

    fn endpoint(&self) -> String {
        self.destination.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrosync_types::ErrorKind;
    use futures::StreamExt;
    use tempfile::TempDir;

    fn file_connector(root: &TempDir) -> OperatorConnector {
        OperatorConnector::new(
            Destination::Fs {
                root: root.path().to_path_buf(),
            },
            TransferConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_connect_to_local_directory() {
        let root = TempDir::new().unwrap();
        let connector = file_connector(&root);

        let session = connector.connect().await.unwrap();
        session.create_directory("docs").await.unwrap();
        let content =
            futures::stream::iter(vec![Ok(bytes::Bytes::from_static(b"readme"))]).boxed();
        let written = session.upload_file("docs/README", content).await.unwrap();
        session.close().await.unwrap();

        assert_eq!(written, 6);
        assert_eq!(
            std::fs::read_to_string(root.path().join("docs/README")).unwrap(),
            "readme"
        );
    }

    #[test]
    fn test_endpoint_hides_password() {
        let connector = OperatorConnector::from_address(
            "deploy:hunter2@example.com/www",
            TransferConfig::default(),
        )
        .unwrap();

        assert_eq!(connector.endpoint(), "ftp://deploy@example.com:21/www");
        assert!(!connector.endpoint().contains("hunter2"));
    }

    #[test]
    fn test_invalid_address() {
        let error =
            OperatorConnector::from_address("gopher://example.com", TransferConfig::default())
                .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let config = TransferConfig {
            connect_timeout_secs: 2,
            ..TransferConfig::default()
        };
        let connector = OperatorConnector::from_address("ftp://127.0.0.1:1/", config).unwrap();

        let error = match connector.connect().await {
            Ok(_) => panic!("connecting to a closed port must fail"),
            Err(e) => e,
        };

        assert_eq!(error.kind(), ErrorKind::Connection);
    }
}
