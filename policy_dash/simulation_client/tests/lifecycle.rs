use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use policy_simulation_client::{
    ClientConfig, ClientError, ClientState, ClientTelemetry, Phase, RacePolicy, RunOutcome,
    SimulationClient, SimulationTransport, TelemetrySettings, ViewHooks, RESULTS_ANCHOR,
};
use serde_json::{json, Value};
use shared_event_bus::MemoryEventBus;
use shared_logging::MemoryLogger;
use tempfile::tempdir;
use tokio::{runtime::Runtime, sync::oneshot};

type Reply = Result<Value, ClientError>;

/// Transport whose calls settle only when the test releases them.
#[derive(Default)]
struct GatedTransport {
    gates: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    calls: AtomicUsize,
}

impl GatedTransport {
    fn with_gates(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<Reply>>) {
        let transport = Arc::new(Self::default());
        let mut senders = Vec::new();
        for _ in 0..count {
            let (tx, rx) = oneshot::channel();
            transport.gates.lock().push_back(rx);
            senders.push(tx);
        }
        (transport, senders)
    }

    async fn wait_for_calls(&self, count: usize) {
        while self.calls.load(Ordering::SeqCst) < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl SimulationTransport for GatedTransport {
    async fn submit(&self, _body: Value) -> Result<Value, ClientError> {
        let gate = self.gates.lock().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ClientError::Transport("gate dropped".into()))),
            None => Err(ClientError::Transport("no gate".into())),
        }
    }
}

#[derive(Default)]
struct RecordingHooks {
    anchors: Mutex<Vec<String>>,
}

impl ViewHooks for RecordingHooks {
    fn scroll_into_view(&self, anchor: &str) {
        self.anchors.lock().push(anchor.to_string());
    }
}

fn payload(id: &str) -> Value {
    json!({
        "simulation_id": id,
        "results": {
            "metrics": { "congestion_score": 0.55 },
            "impact_predictions": { "energy_stress": 0.3 }
        }
    })
}

fn client(transport: Arc<GatedTransport>, policy: RacePolicy) -> SimulationClient {
    SimulationClient::builder()
        .transport(transport)
        .race_policy(policy)
        .build()
        .unwrap()
}

#[tokio::test]
async fn subscribers_see_loading_then_result() {
    let (transport, mut gates) = GatedTransport::with_gates(1);
    let client = client(transport.clone(), RacePolicy::LatestRequest);
    let mut rx = client.subscribe();

    let runner = client.clone();
    let task = tokio::spawn(async move { runner.run("Odd-even scheme", false, None).await });
    transport.wait_for_calls(1).await;

    let loading = rx.recv().await.unwrap();
    assert!(loading.is_loading);
    assert!(loading.error.is_none());
    assert_eq!(client.state().phase(), Phase::Loading);

    gates.remove(0).send(Ok(payload("sim-7"))).unwrap();
    assert!(task.await.unwrap().is_success());

    let settled = rx.recv().await.unwrap();
    assert_eq!(settled.phase(), Phase::Ready);
    assert_eq!(settled.result.unwrap().simulation_id, "sim-7");
}

#[tokio::test]
async fn failure_sets_error_and_clears_loading() {
    let (transport, mut gates) = GatedTransport::with_gates(1);
    let client = client(transport.clone(), RacePolicy::LatestRequest);
    let runner = client.clone();
    let task = tokio::spawn(async move { runner.run("Fuel tax", true, None).await });
    transport.wait_for_calls(1).await;
    gates
        .remove(0)
        .send(Err(ClientError::Transport("connection refused".into())))
        .unwrap();
    assert_eq!(
        task.await.unwrap(),
        RunOutcome::Failed("network error: connection refused".into())
    );
    let state = client.state();
    assert!(!state.is_loading);
    assert!(state.result.is_none());
    assert_eq!(
        state.error.as_deref(),
        Some("network error: connection refused")
    );
}

#[tokio::test]
async fn latest_request_discards_superseded_response() {
    let (transport, mut gates) = GatedTransport::with_gates(2);
    let client = client(transport.clone(), RacePolicy::LatestRequest);

    let first = client.clone();
    let a = tokio::spawn(async move { first.run("A", false, None).await });
    transport.wait_for_calls(1).await;
    let second = client.clone();
    let b = tokio::spawn(async move { second.run("B", false, None).await });
    transport.wait_for_calls(2).await;

    let gate_b = gates.pop().unwrap();
    let gate_a = gates.pop().unwrap();
    gate_b.send(Ok(payload("sim-b"))).unwrap();
    assert!(b.await.unwrap().is_success());
    gate_a.send(Ok(payload("sim-a"))).unwrap();
    assert_eq!(a.await.unwrap(), RunOutcome::Superseded);

    let state = client.state();
    assert_eq!(state.result.unwrap().simulation_id, "sim-b");
    assert!(!state.is_loading);
}

#[tokio::test]
async fn last_write_wins_lets_late_response_overwrite() {
    let (transport, mut gates) = GatedTransport::with_gates(2);
    let client = client(transport.clone(), RacePolicy::LastWriteWins);

    let first = client.clone();
    let a = tokio::spawn(async move { first.run("A", false, None).await });
    transport.wait_for_calls(1).await;
    let second = client.clone();
    let b = tokio::spawn(async move { second.run("B", false, None).await });
    transport.wait_for_calls(2).await;

    let gate_b = gates.pop().unwrap();
    let gate_a = gates.pop().unwrap();
    gate_b.send(Ok(payload("sim-b"))).unwrap();
    assert!(b.await.unwrap().is_success());
    gate_a.send(Ok(payload("sim-a"))).unwrap();
    assert!(a.await.unwrap().is_success());

    assert_eq!(client.state().result.unwrap().simulation_id, "sim-a");
}

#[tokio::test]
async fn reset_does_not_cancel_in_flight_run() {
    let (transport, mut gates) = GatedTransport::with_gates(1);
    let client = client(transport.clone(), RacePolicy::LatestRequest);
    let runner = client.clone();
    let task = tokio::spawn(async move { runner.run("Metro fares", false, None).await });
    transport.wait_for_calls(1).await;

    client.reset();
    assert_eq!(client.state(), ClientState::default());

    gates.remove(0).send(Ok(payload("sim-late"))).unwrap();
    assert!(task.await.unwrap().is_success());
    assert_eq!(client.state().result.unwrap().simulation_id, "sim-late");
}

#[tokio::test]
async fn scroll_hook_fires_after_success_only() {
    let hooks = Arc::new(RecordingHooks::default());
    let (transport, mut gates) = GatedTransport::with_gates(2);
    let client = SimulationClient::builder()
        .transport(transport.clone())
        .hooks(hooks.clone())
        .scroll_delay(Duration::from_millis(5))
        .build()
        .unwrap();

    gates.remove(0).send(Err(ClientError::Malformed("bad".into()))).unwrap();
    assert!(!client.run("Tolls", false, None).await.is_success());
    gates.remove(0).send(Ok(payload("sim-9"))).unwrap();
    assert!(client.run("Tolls", false, None).await.is_success());

    assert!(hooks.anchors.lock().is_empty());
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(*hooks.anchors.lock(), vec![RESULTS_ANCHOR.to_string()]);
}

#[tokio::test]
async fn telemetry_records_lifecycle() {
    let bus = Arc::new(MemoryEventBus::new(16));
    let sink = Arc::new(MemoryLogger::new());
    let telemetry = ClientTelemetry::builder("simulation-client")
        .log_sink(sink.clone())
        .event_publisher(bus.clone())
        .build();
    let (transport, mut gates) = GatedTransport::with_gates(1);
    let client = SimulationClient::builder()
        .transport(transport)
        .telemetry(telemetry)
        .build()
        .unwrap();

    gates.remove(0).send(Ok(payload("sim-1"))).unwrap();
    client.run("Parking caps", false, None).await;
    client.reset();

    assert_eq!(
        sink.messages(),
        vec![
            "simulation.run.started".to_string(),
            "simulation.run.succeeded".to_string(),
            "simulation.reset".to_string(),
        ]
    );
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(bus.snapshot().len(), 3);
}

#[test]
fn failed_run_events_survive_runtime_shutdown() {
    let dir = tempdir().unwrap();
    let event_log = dir.path().join("dash.events");
    let config = ClientConfig {
        telemetry: TelemetrySettings {
            event_log: Some(event_log.clone()),
            ..TelemetrySettings::default()
        },
        ..ClientConfig::default()
    };
    let (transport, _gates) = GatedTransport::with_gates(0);

    let runtime = Runtime::new().unwrap();
    let outcome = runtime.block_on(async {
        let client = SimulationClient::builder()
            .config(config)
            .transport(transport)
            .build()
            .unwrap();
        client.run("Night curfew on trucks", false, None).await
    });
    drop(runtime);

    assert!(matches!(outcome, RunOutcome::Failed(_)));
    let events: Vec<String> = std::fs::read_to_string(&event_log)
        .unwrap()
        .lines()
        .map(|line| {
            let record: Value = serde_json::from_str(line).unwrap();
            record["event_type"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        events,
        vec![
            "simulation.run.started".to_string(),
            "simulation.run.failed".to_string(),
        ]
    );
}
