//! # pagestream
//!
//! Streaming CSV export engine for paginated JSON APIs.
//!
//! pagestream walks a remote paged API one page at a time, forks each
//! response into a pagination control path and a record data path, and
//! streams the extracted records to the client as CSV rows — incrementally,
//! without ever materializing the result set.
//!
//! ## Design Philosophy
//!
//! - **Pull all the way down** - the sink's demand is the only scheduler;
//!   a slow client suspends the network fetches themselves
//! - **One page in flight** - the next fetch waits for the previous page's
//!   pagination decision, so memory stays bounded by a single page body
//! - **Fail fast, keep what was sent** - the first error terminates the
//!   stream; rows already flushed are never retracted
//! - **Library-first** - the axum delivery layer is a thin shell around a
//!   composable [`Stream`](futures::Stream) pipeline
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagestream::{Config, HttpPageFetcher, csv_stream, write_to};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let fetcher = Arc::new(HttpPageFetcher::new(&config.source)?);
//!
//!     let mut stdout = tokio::io::stdout();
//!     let written = write_to(csv_stream(fetcher, &config), &mut stdout).await?;
//!     eprintln!("exported {written} bytes");
//!
//!     Ok(())
//! }
//! ```
//!
//! Or serve the export over HTTP:
//!
//! ```no_run
//! use pagestream::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     pagestream::api::start_api_server(Arc::new(Config::default())).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// The paginated-fetch streaming pipeline
pub mod pipeline;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, CsvConfig, SourceConfig};
pub use error::{
    ApiError, Error, ErrorDetail, FetchError, MalformedPageError, ParseError, Result, SinkError,
    ToHttpStatus,
};
pub use pipeline::fetch::{HttpPageFetcher, PageBody, PageFetcher};
pub use pipeline::format::RowFormatter;
pub use pipeline::pagination::PaginationState;
pub use pipeline::sequence::{PageData, StreamSource};
pub use pipeline::{PagedSource, csv_stream, write_to};
pub use types::{PageNumber, Record};
