use crate::client::{StatusClient, StatusSnapshot, StatusSource};
use crate::metrics::{Descriptors, MetricKind, Observation, UnitMetric, APPLICATION_LABEL};
use crossbeam_channel::Sender;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, LabelPair, MetricFamily};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error};

/// Translates Unit status snapshots into metric observations.
///
/// Collection cycles against one instance are serialised: a cycle holds the
/// lock from the fetch until its last observation has been emitted.
pub struct UnitCollector<S = StatusClient> {
    source: S,
    descriptors: Descriptors,
    cycle: Mutex<()>,
}

impl<S: StatusSource> UnitCollector<S> {
    pub fn new(
        source: S,
        namespace: &str,
        const_labels: &HashMap<String, String>,
    ) -> prometheus::Result<Self> {
        Ok(Self {
            source,
            descriptors: Descriptors::new(namespace, const_labels)?,
            cycle: Mutex::new(()),
        })
    }

    /// The full descriptor set, independent of what the last fetch returned.
    pub fn describe(&self) -> Vec<&Desc> {
        self.descriptors.iter().collect()
    }

    /// Runs one collection cycle, handing each observation to `emit` as soon as
    /// it is produced.
    ///
    /// A failed fetch emits a single `up = 0` and nothing else.
    pub fn collect_with<F>(&self, mut emit: F)
    where
        F: FnMut(Observation),
    {
        let _cycle = self.cycle.lock().unwrap_or_else(PoisonError::into_inner);

        let status = match self.source.fetch() {
            Ok(status) => status,
            Err(e) => {
                emit(Observation::up(false));
                error!(error = %e, "Error getting stats");
                return;
            }
        };

        emit(Observation::up(true));
        emit_snapshot(&status, &mut emit);
        debug!(
            applications = status.applications.len(),
            "Collected Unit status"
        );
    }

    /// Streams one cycle into a channel. Once the receiving side has hung up
    /// the rest of the cycle is discarded.
    pub fn collect_into(&self, tx: &Sender<Observation>) {
        let mut disconnected = false;
        self.collect_with(|observation| {
            if disconnected {
                return;
            }
            if tx.send(observation).is_err() {
                debug!("Observation receiver disconnected, dropping rest of cycle");
                disconnected = true;
            }
        });
    }

    /// Runs one cycle and gathers it into one metric family per descriptor.
    pub fn collect_families(&self) -> Vec<MetricFamily> {
        let mut by_metric: Vec<Vec<proto::Metric>> = vec![Vec::new(); UnitMetric::ALL.len()];
        self.collect_with(|observation| {
            let metric = self.to_proto(&observation);
            by_metric[observation.metric as usize].push(metric);
        });

        UnitMetric::ALL
            .iter()
            .zip(by_metric)
            .filter(|(_, metrics)| !metrics.is_empty())
            .map(|(&metric, metrics)| {
                let desc = self.descriptors.get(metric);
                let mut family = MetricFamily::default();
                family.set_name(desc.fq_name.clone());
                family.set_help(desc.help.clone());
                family.set_field_type(metric.kind().proto_type());
                for m in metrics {
                    family.mut_metric().push(m);
                }
                family
            })
            .collect()
    }

    fn to_proto(&self, observation: &Observation) -> proto::Metric {
        let desc = self.descriptors.get(observation.metric);

        let mut labels: Vec<LabelPair> = desc.const_label_pairs.clone();
        if let Some(application) = &observation.application {
            let mut pair = LabelPair::default();
            pair.set_name(APPLICATION_LABEL.to_string());
            pair.set_value(application.clone());
            labels.push(pair);
        }
        labels.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        let mut metric = proto::Metric::default();
        for pair in labels {
            metric.mut_label().push(pair);
        }
        match observation.metric.kind() {
            MetricKind::Counter => {
                let mut counter = proto::Counter::default();
                counter.set_value(observation.value);
                metric.set_counter(counter);
            }
            MetricKind::Gauge => {
                let mut gauge = proto::Gauge::default();
                gauge.set_value(observation.value);
                metric.set_gauge(gauge);
            }
        }
        metric
    }
}

fn emit_snapshot<F: FnMut(Observation)>(status: &StatusSnapshot, emit: &mut F) {
    let connections = &status.connections;
    emit(Observation::global(
        UnitMetric::ConnectionsAccepted,
        connections.accepted,
    ));
    emit(Observation::global(
        UnitMetric::ConnectionsActive,
        connections.active,
    ));
    emit(Observation::global(UnitMetric::ConnectionsIdle, connections.idle));
    emit(Observation::global(
        UnitMetric::ConnectionsClosed,
        connections.closed,
    ));
    emit(Observation::global(
        UnitMetric::HttpRequestsTotal,
        status.requests_total(),
    ));

    for (name, application) in &status.applications {
        let processes = &application.processes;
        emit(Observation::application(
            UnitMetric::ProcessesRunning,
            name,
            processes.running,
        ));
        emit(Observation::application(
            UnitMetric::ProcessesStarting,
            name,
            processes.starting,
        ));
        emit(Observation::application(
            UnitMetric::ProcessesIdle,
            name,
            processes.idle,
        ));
        emit(Observation::application(
            UnitMetric::RequestsActive,
            name,
            application.requests.active,
        ));
    }
}

impl<S: StatusSource> Collector for UnitCollector<S> {
    fn desc(&self) -> Vec<&Desc> {
        self.describe()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.collect_families()
    }
}
