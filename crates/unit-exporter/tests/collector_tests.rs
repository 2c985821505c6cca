mod common;

#[cfg(test)]
pub mod tests {
    use super::common::{closed_endpoint, serve_status, STATUS_BODY};
    use crossbeam_channel::unbounded;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use unit_exporter::{
        agent_with_timeout, FetchError, Observation, StatusClient, StatusSnapshot, StatusSource,
        UnitCollector, UnitMetric,
    };

    fn collector_for(endpoint: String) -> UnitCollector {
        let client =
            StatusClient::new_unchecked(agent_with_timeout(Duration::from_secs(2)), endpoint);
        UnitCollector::new(client, "nginxunit", &HashMap::new()).unwrap()
    }

    fn collect_all<S: StatusSource>(collector: &UnitCollector<S>) -> Vec<Observation> {
        let (tx, rx) = unbounded();
        collector.collect_into(&tx);
        drop(tx);
        rx.iter().collect()
    }

    #[test]
    fn test_round_trip_order_and_values() {
        let collector = collector_for(serve_status(200, STATUS_BODY));

        let observations = collect_all(&collector);
        let expected = vec![
            Observation::up(true),
            Observation::global(UnitMetric::ConnectionsAccepted, 10),
            Observation::global(UnitMetric::ConnectionsActive, 2),
            Observation::global(UnitMetric::ConnectionsIdle, 1),
            Observation::global(UnitMetric::ConnectionsClosed, 3),
            Observation::global(UnitMetric::HttpRequestsTotal, 100),
            Observation::application(UnitMetric::ProcessesRunning, "app1", 1),
            Observation::application(UnitMetric::ProcessesStarting, "app1", 0),
            Observation::application(UnitMetric::ProcessesIdle, "app1", 2),
            Observation::application(UnitMetric::RequestsActive, "app1", 5),
        ];
        assert_eq!(observations, expected);
    }

    #[test]
    fn test_fetch_failures_yield_single_down() {
        let endpoints = [
            serve_status(503, "unavailable"),
            serve_status(200, "not json"),
            closed_endpoint(),
        ];

        for endpoint in endpoints {
            let collector = collector_for(endpoint.clone());
            assert_eq!(
                collect_all(&collector),
                vec![Observation::up(false)],
                "Expected only a down signal for {endpoint}",
            );
        }
    }

    #[test]
    fn test_describe_is_fixed() {
        let collector = collector_for(closed_endpoint());
        let before: Vec<String> = collector.describe().iter().map(|d| d.fq_name.clone()).collect();

        collect_all(&collector);
        let after: Vec<String> = collector.describe().iter().map(|d| d.fq_name.clone()).collect();

        assert_eq!(before.len(), 10);
        assert_eq!(before, after);
        assert_eq!(before[0], "nginxunit_up");
    }

    struct SlowSource {
        delay: Duration,
    }

    impl StatusSource for SlowSource {
        fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
            thread::sleep(self.delay);
            Ok(serde_json::from_str(STATUS_BODY).unwrap())
        }
    }

    #[test]
    fn test_concurrent_cycles_do_not_interleave() {
        let collector = Arc::new(
            UnitCollector::new(
                SlowSource {
                    delay: Duration::from_millis(100),
                },
                "nginxunit",
                &HashMap::new(),
            )
            .unwrap(),
        );
        let (tx, rx) = unbounded();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let collector = Arc::clone(&collector);
                let tx = tx.clone();
                thread::spawn(move || collector.collect_into(&tx))
            })
            .collect();
        drop(tx);
        for handle in handles {
            handle.join().unwrap();
        }

        let observations: Vec<Observation> = rx.iter().collect();
        assert_eq!(observations.len(), 3 * 10);

        for cycle in observations.chunks(10) {
            assert_eq!(cycle[0], Observation::up(true));
            assert!(
                cycle[1..].iter().all(|o| o.metric != UnitMetric::Up),
                "Cycles interleaved: {observations:?}",
            );
            assert_eq!(cycle[9].metric, UnitMetric::RequestsActive);
        }
    }
}
