//! Client tests against a scripted transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use benchlink::client::Simulation;
use benchlink::shared::protocol::{ErrorCode, Reply, Request, ServerError};
use benchlink::shared::Transport;
use benchlink::types::{Duration, ElementType, MonotonicTime};
use benchlink::{dumps, Error, SimulationError, TransportError, Value};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_bytes::ByteBuf;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A transport that replays scripted replies and records sent requests.
struct ScriptedTransport {
    replies: VecDeque<Vec<u8>>,
    sent: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedTransport {
    fn new(replies: impl IntoIterator<Item = Reply>) -> (Self, Arc<Mutex<Vec<Request>>>) {
        let replies = replies
            .into_iter()
            .map(|reply| {
                let mut frame = Vec::new();
                ciborium::ser::into_writer(&reply, &mut frame).unwrap();
                frame
            })
            .collect();
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                replies,
                sent: sent.clone(),
            },
            sent,
        )
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let request: Request = ciborium::de::from_reader(frame).unwrap();
        self.sent.lock().unwrap().push(request);
        Ok(())
    }

    async fn receive(&mut self) -> Result<Bytes, TransportError> {
        match self.replies.pop_front() {
            Some(frame) => Ok(Bytes::from(frame)),
            None => Err(TransportError::ConnectionClosed),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[tokio::test]
async fn start_sends_the_encoded_configuration() {
    init_tracing();
    let (transport, sent) = ScriptedTransport::new([Reply::Empty]);
    let sim = Simulation::with_transport(transport);

    sim.start(42i64).await.unwrap();

    let sent = sent.lock().unwrap();
    match &sent[0] {
        Request::Init { cfg } => {
            assert_eq!(cfg.as_ref(), dumps(&Value::Int(42)).unwrap());
        },
        other => panic!("wrong request: {other:?}"),
    }
}

#[tokio::test]
async fn stepping_returns_the_reported_time() {
    let t = MonotonicTime::new(3, 500_000_000);
    let (transport, _) = ScriptedTransport::new([Reply::Time(t), Reply::Time(t)]);
    let sim = Simulation::with_transport(transport);

    assert_eq!(sim.step().await.unwrap(), t);
    assert_eq!(sim.step_until(Duration::from_secs(3)).await.unwrap(), t);
}

#[tokio::test]
async fn keyed_scheduling_round_trips_the_event_key() {
    let key_bytes = vec![0x01, 0x02, 0x03];
    let (transport, sent) = ScriptedTransport::new([
        Reply::Key(scripted_key(&key_bytes)),
        Reply::Empty,
    ]);
    let sim = Simulation::with_transport(transport);

    let key = sim
        .schedule_keyed_event(Duration::from_secs(1), "input", 17i64, None)
        .await
        .unwrap();
    sim.cancel_event(key).await.unwrap();

    let sent = sent.lock().unwrap();
    match &sent[0] {
        Request::ScheduleEvent {
            source_name,
            with_key,
            period,
            ..
        } => {
            assert_eq!(source_name, "input");
            assert!(*with_key);
            assert_eq!(*period, None);
        },
        other => panic!("wrong request: {other:?}"),
    }
    match &sent[1] {
        Request::CancelEvent { key } => assert_eq!(*key, scripted_key(&key_bytes)),
        other => panic!("wrong request: {other:?}"),
    }
}

#[tokio::test]
async fn engine_errors_map_to_simulation_errors() {
    let (transport, _) = ScriptedTransport::new([Reply::Error(ServerError {
        code: ErrorCode::SourceNotFound,
        message: "no source `input`".to_string(),
    })]);
    let sim = Simulation::with_transport(transport);

    let err = sim.process_event("input", ()).await.unwrap_err();
    match err {
        Error::Simulation(SimulationError::SourceNotFound(message)) => {
            assert_eq!(message, "no source `input`");
        },
        other => panic!("wrong error: {other:?}"),
    }
}

#[tokio::test]
async fn events_decode_against_the_requested_type() {
    let samples = [4.5e-6f64, 0.0];
    let reply = Reply::Events(
        samples
            .iter()
            .map(|x| ByteBuf::from(dumps(&Value::Float(*x)).unwrap()))
            .collect(),
    );
    let (transport, _) = ScriptedTransport::new([reply]);
    let sim = Simulation::with_transport(transport);

    let events = sim.read_events("flow_rate", &ElementType::Float).await.unwrap();
    assert_eq!(events, vec![Value::Float(4.5e-6), Value::Float(0.0)]);
}

#[tokio::test]
async fn query_replies_decode_untyped_by_request() {
    let reply = Reply::Replies(vec![ByteBuf::from(
        dumps(&Value::Text("ready".to_string())).unwrap(),
    )]);
    let (transport, sent) = ScriptedTransport::new([reply]);
    let sim = Simulation::with_transport(transport);

    let replies = sim
        .process_query("status", (), &ElementType::Untyped)
        .await
        .unwrap();
    assert_eq!(replies, vec![Value::Text("ready".to_string())]);

    let sent = sent.lock().unwrap();
    match &sent[0] {
        Request::ProcessQuery { request, .. } => {
            // `()` encodes as an explicit wire null.
            assert_eq!(request.as_ref(), dumps(&Value::Null).unwrap());
        },
        other => panic!("wrong request: {other:?}"),
    }
}

#[tokio::test]
async fn awaiting_an_event_yields_a_single_value() {
    let reply = Reply::Event(ByteBuf::from(dumps(&Value::Bool(true)).unwrap()));
    let (transport, _) = ScriptedTransport::new([reply]);
    let sim = Simulation::with_transport(transport);

    let event = sim
        .await_event("done", Duration::from_secs(5), &ElementType::Bool)
        .await
        .unwrap();
    assert_eq!(event, Value::Bool(true));
}

#[tokio::test]
async fn saved_state_restores_verbatim() {
    let blob = vec![0xde, 0xad, 0xbe, 0xef];
    let (transport, sent) = ScriptedTransport::new([
        Reply::State(ByteBuf::from(blob.clone())),
        Reply::Empty,
    ]);
    let sim = Simulation::with_transport(transport);

    let state = sim.save().await.unwrap();
    assert_eq!(state, blob);
    sim.restore(&state).await.unwrap();

    let sent = sent.lock().unwrap();
    match &sent[1] {
        Request::Restore { state } => assert_eq!(state.as_ref(), blob),
        other => panic!("wrong request: {other:?}"),
    }
}

#[tokio::test]
async fn an_off_protocol_reply_is_reported_as_unexpected() {
    let (transport, _) = ScriptedTransport::new([Reply::Time(MonotonicTime::EPOCH)]);
    let sim = Simulation::with_transport(transport);

    let err = sim.halt().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Simulation(SimulationError::UnexpectedReply(_))
    ));
}

#[test]
fn blocking_facade_covers_the_same_surface() {
    let (transport, sent) = ScriptedTransport::new([
        Reply::Empty,
        Reply::Time(MonotonicTime::new(6, 0)),
        Reply::Empty,
    ]);
    let sim = benchlink::client::blocking::Simulation::with_transport(transport).unwrap();

    sim.start(()).unwrap();
    assert_eq!(sim.step().unwrap(), MonotonicTime::new(6, 0));
    sim.terminate().unwrap();

    assert_eq!(sent.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn connects_over_tcp_loopback() {
    use benchlink::shared::FramedTransport;

    init_tracing();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut transport = FramedTransport::new(stream);

        let frame = transport.receive().await.unwrap();
        let request: Request = ciborium::de::from_reader(frame.as_ref()).unwrap();
        assert!(matches!(request, Request::Time));

        let mut reply = Vec::new();
        ciborium::ser::into_writer(&Reply::Time(MonotonicTime::new(9, 0)), &mut reply).unwrap();
        transport.send(&reply).await.unwrap();
    });

    let sim = Simulation::connect(&address).await.unwrap();
    assert_eq!(sim.time().await.unwrap(), MonotonicTime::new(9, 0));
    sim.close().await.unwrap();

    server.await.unwrap();
}

fn scripted_key(bytes: &[u8]) -> benchlink::EventKey {
    // Keys are engine-issued; in tests we forge one through the serde
    // surface the engine uses.
    let mut frame = Vec::new();
    ciborium::ser::into_writer(&ByteBuf::from(bytes.to_vec()), &mut frame).unwrap();
    ciborium::de::from_reader(frame.as_slice()).unwrap()
}
