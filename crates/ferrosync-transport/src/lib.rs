//! Remote destinations for ferrosync
//!
//! This crate turns a destination address into live transfer sessions:
//!
//! - **Address parsing**: `ftp://`, `ftps://`, `s3://`, `webdav://`, `webdavs://`
//!   and `file://` URLs, with FTP assumed when no scheme is given
//! - **Session establishment**: connection check bounded by a timeout
//! - **Transfer sessions**: directory queries, directory creation, streamed
//!   uploads and deletes through [opendal](https://docs.rs/opendal)
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferrosync_config::TransferConfig;
//! use ferrosync_transport::OperatorConnector;
//! use ferrosync_types::SessionConnector;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = OperatorConnector::from_address(
//!     "deploy:secret@example.com/www",
//!     TransferConfig::default(),
//! )?;
//! let session = connector.connect().await?;
//! session.delete_file("old.html").await?;
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod connector;
pub mod destination;
pub mod session;

pub use connector::OperatorConnector;
pub use destination::{Credentials, Destination};
pub use session::OperatorSession;
