//! Prometheus exporter for the NGINX Unit status endpoint.
//!
//! [`StatusClient`] fetches and decodes the status document, [`UnitCollector`]
//! turns one fetch into the `up` signal plus the connection, request and
//! per-application families, and [`MetricsServer`] exposes a registry holding
//! the collector over HTTP.
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::time::Duration;
//! use unit_exporter::{StatusClient, UnitCollector};
//!
//! let client = StatusClient::with_timeout("http://127.0.0.1:8000/status", Duration::from_secs(5))?;
//! let collector = UnitCollector::new(client, "nginxunit", &HashMap::new())?;
//! collector.collect_with(|observation| println!("{observation:?}"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod client;
mod collector;
pub mod config;
mod error;
mod http_server;
mod metrics;

pub use client::{
    agent_with_timeout, Application, ApplicationRequests, Connections, Processes, Requests,
    StatusClient, StatusSnapshot, StatusSource,
};
pub use collector::UnitCollector;
pub use error::{BindError, FetchError};
pub use http_server::{register_build_info, MetricsServer};
pub use metrics::{Descriptors, MetricKind, Observation, UnitMetric, APPLICATION_LABEL};
