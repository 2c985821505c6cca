use prometheus::core::Desc;
use prometheus::proto::MetricType;
use std::collections::HashMap;

pub const APPLICATION_LABEL: &str = "application";

/// Whether a family is cumulative or instantaneous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn proto_type(self) -> MetricType {
        match self {
            MetricKind::Counter => MetricType::COUNTER,
            MetricKind::Gauge => MetricType::GAUGE,
        }
    }
}

/// Every metric family the exporter can publish.
///
/// The discriminant doubles as the index into [`Descriptors`], and `ALL` lists
/// the families in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitMetric {
    Up,
    ConnectionsAccepted,
    ConnectionsActive,
    ConnectionsIdle,
    ConnectionsClosed,
    HttpRequestsTotal,
    ProcessesRunning,
    ProcessesStarting,
    ProcessesIdle,
    RequestsActive,
}

impl UnitMetric {
    pub const ALL: [UnitMetric; 10] = [
        UnitMetric::Up,
        UnitMetric::ConnectionsAccepted,
        UnitMetric::ConnectionsActive,
        UnitMetric::ConnectionsIdle,
        UnitMetric::ConnectionsClosed,
        UnitMetric::HttpRequestsTotal,
        UnitMetric::ProcessesRunning,
        UnitMetric::ProcessesStarting,
        UnitMetric::ProcessesIdle,
        UnitMetric::RequestsActive,
    ];

    /// Subsystem, short name and help text.
    fn naming(self) -> (&'static str, &'static str, &'static str) {
        match self {
            UnitMetric::Up => ("", "up", "Status of the last metric scrape"),
            UnitMetric::ConnectionsAccepted => {
                ("", "connections_accepted", "Accepted client connections")
            }
            UnitMetric::ConnectionsActive => ("", "connections_active", "Active client connections"),
            UnitMetric::ConnectionsIdle => ("", "connections_idle", "Idle client connections"),
            UnitMetric::ConnectionsClosed => ("", "connections_closed", "Closed client connections"),
            UnitMetric::HttpRequestsTotal => ("", "http_requests_total", "Total http requests"),
            UnitMetric::ProcessesRunning => (
                "applications",
                "processes_running",
                "Application processes running",
            ),
            UnitMetric::ProcessesStarting => (
                "applications",
                "processes_starting",
                "Application processes starting",
            ),
            UnitMetric::ProcessesIdle => {
                ("applications", "processes_idle", "Application processes idle")
            }
            UnitMetric::RequestsActive => ("applications", "requests_active", "Active requests"),
        }
    }

    pub fn kind(self) -> MetricKind {
        match self {
            UnitMetric::ConnectionsAccepted
            | UnitMetric::ConnectionsClosed
            | UnitMetric::HttpRequestsTotal => MetricKind::Counter,
            _ => MetricKind::Gauge,
        }
    }

    pub fn is_per_application(self) -> bool {
        matches!(
            self,
            UnitMetric::ProcessesRunning
                | UnitMetric::ProcessesStarting
                | UnitMetric::ProcessesIdle
                | UnitMetric::RequestsActive
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Joins the non-empty name parts with `_`.
pub(crate) fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// The immutable descriptor table, built once per collector.
#[derive(Debug)]
pub struct Descriptors {
    descs: Vec<Desc>,
}

impl Descriptors {
    /// Fails if the namespace or a constant label produces an invalid name.
    pub fn new(namespace: &str, const_labels: &HashMap<String, String>) -> prometheus::Result<Self> {
        if const_labels.contains_key(APPLICATION_LABEL) {
            return Err(prometheus::Error::Msg(format!(
                "const label {APPLICATION_LABEL:?} clashes with the per-application label"
            )));
        }

        let descs = UnitMetric::ALL
            .iter()
            .map(|metric| {
                let (subsystem, name, help) = metric.naming();
                let variable_labels = if metric.is_per_application() {
                    vec![APPLICATION_LABEL.to_string()]
                } else {
                    Vec::new()
                };
                Desc::new(
                    fq_name(namespace, subsystem, name),
                    help.to_string(),
                    variable_labels,
                    const_labels.clone(),
                )
            })
            .collect::<prometheus::Result<Vec<_>>>()?;

        Ok(Self { descs })
    }

    pub fn get(&self, metric: UnitMetric) -> &Desc {
        &self.descs[metric.index()]
    }

    /// All descriptors in [`UnitMetric::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &Desc> {
        self.descs.iter()
    }
}

/// One value emitted during a collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub metric: UnitMetric,
    pub value: f64,
    /// Set for per-application families only.
    pub application: Option<String>,
}

impl Observation {
    pub fn global(metric: UnitMetric, value: i64) -> Self {
        Self {
            metric,
            value: value as f64,
            application: None,
        }
    }

    pub fn application(metric: UnitMetric, application: &str, value: i64) -> Self {
        Self {
            metric,
            value: value as f64,
            application: Some(application.to_string()),
        }
    }

    pub fn up(up: bool) -> Self {
        Self {
            metric: UnitMetric::Up,
            value: if up { 1.0 } else { 0.0 },
            application: None,
        }
    }
}
