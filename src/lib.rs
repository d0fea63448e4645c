//! # Pipeline Monitor
//!
//! A point-in-time health probe for media-pipeline servers. One run:
//!
//! 1. Connects to the server's control WebSocket and resolves the server
//!    manager.
//! 2. Enumerates every active pipeline and its child endpoints, enabling
//!    latency instrumentation along the way.
//! 3. Queries each endpoint's transport direction, raw statistics, and
//!    connection state — all endpoints concurrently, each endpoint's
//!    queries as one joined group.
//! 4. Classifies endpoints per media type (inbound / outbound / duplex /
//!    stale) and folds everything into a single aggregate report line.
//!
//! A failed query degrades the affected endpoint to "incomplete" instead of
//! aborting the run; only a failed connection is fatal.
//!
//! ## Modules
//!
//! - **`config`**: run configuration assembled from CLI arguments
//! - **`collectors`**: pipeline/endpoint discovery and the concurrent
//!   per-endpoint stat collection
//! - **`metrics`**: classification, aggregation, and report rendering

pub mod collectors;
pub mod config;
pub mod metrics;

pub use collectors::Monitor;
pub use config::Config;
