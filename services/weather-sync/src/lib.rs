//! Weather sync service.
//!
//! Runs the launch site ingestion batch once a day and on demand over HTTP:
//! - `POST /sync` - Run a batch now
//! - `GET /status` - Whether a batch is running and the last result
//! - `GET /health` - Health check
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod logging;
pub mod scheduler;
pub mod server;
pub mod sites_file;
pub mod tracker;
