//! The request/reply envelope of the bench protocol.
//!
//! Every operation is one request frame followed by one reply frame, both
//! CBOR-encoded externally tagged enums. Application payloads (bench
//! configurations, events, queries, replies, persisted state) travel as
//! opaque byte strings produced by [`dumps`](crate::codec::dumps) and
//! consumed by [`loads`](crate::codec::loads); the envelope itself never
//! interprets them.

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

use crate::error::SimulationError;
use crate::types::key::EventKey;
use crate::types::time::{Deadline, Duration, MonotonicTime};

/// A request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Creates a simulation bench, replacing any bench already running.
    Init {
        /// `dumps`-encoded bench configuration.
        cfg: ByteBuf,
    },
    /// Terminates the simulation.
    Terminate,
    /// Requests a stop at the earliest opportunity.
    Halt,
    /// Reads the current simulation time.
    Time,
    /// Advances to the next scheduled event.
    Step,
    /// Advances until all scheduled events are processed.
    StepUnbounded,
    /// Advances until the given deadline.
    StepUntil {
        /// Absolute or relative target time.
        deadline: Deadline,
    },
    /// Schedules an event at a future time.
    ScheduleEvent {
        /// Absolute or relative target time.
        deadline: Deadline,
        /// Name of the event source.
        source_name: String,
        /// `dumps`-encoded event payload.
        event: ByteBuf,
        /// Optional repetition period.
        period: Option<Duration>,
        /// Whether a cancellation key should be returned.
        with_key: bool,
    },
    /// Cancels a previously scheduled event.
    CancelEvent {
        /// Key returned when the event was scheduled.
        key: EventKey,
    },
    /// Broadcasts an event immediately.
    ProcessEvent {
        /// Name of the event source.
        source_name: String,
        /// `dumps`-encoded event payload.
        event: ByteBuf,
    },
    /// Broadcasts a query immediately.
    ProcessQuery {
        /// Name of the query source.
        source_name: String,
        /// `dumps`-encoded request payload.
        request: ByteBuf,
    },
    /// Reads all pending events from a sink.
    ReadEvents {
        /// Name of the event sink.
        sink_name: String,
    },
    /// Waits for the next event from a sink.
    AwaitEvent {
        /// Name of the event sink.
        sink_name: String,
        /// How long the server may block before giving up.
        timeout: Duration,
    },
    /// Enables event reception on a sink.
    OpenSink {
        /// Name of the event sink.
        sink_name: String,
    },
    /// Disables event reception on a sink.
    CloseSink {
        /// Name of the event sink.
        sink_name: String,
    },
    /// Captures the bench state as an opaque blob.
    Save,
    /// Restores a previously saved bench state.
    Restore {
        /// Blob returned by a previous `Save`.
        state: ByteBuf,
    },
}

/// A reply frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Reply {
    /// The operation succeeded and carries no result.
    Empty,
    /// The current or final simulation time.
    Time(MonotonicTime),
    /// A key for a scheduled event.
    Key(EventKey),
    /// Events read from a sink, in arrival order.
    Events(Vec<ByteBuf>),
    /// A single awaited event.
    Event(ByteBuf),
    /// Replies to a query, one per responding model.
    Replies(Vec<ByteBuf>),
    /// A persisted bench state blob.
    State(ByteBuf),
    /// The operation failed.
    Error(ServerError),
}

/// An error reported by the engine: a machine-readable code plus the
/// engine's own description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// The engine error code.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

/// The engine's error code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Catch-all for engine-internal failures.
    InternalError,
    /// No bench has been started.
    SimulationNotStarted,
    /// The simulation was terminated.
    SimulationTerminated,
    /// The simulation deadlocked.
    SimulationDeadlock,
    /// A message was lost between models.
    SimulationMessageLoss,
    /// An event had no recipient.
    SimulationNoRecipient,
    /// A model panicked.
    SimulationPanic,
    /// The simulation timed out.
    SimulationTimeout,
    /// The simulation clock went out of sync.
    SimulationOutOfSync,
    /// A query could not be answered.
    SimulationBadQuery,
    /// The simulation was halted by request.
    SimulationHalted,
    /// A required argument was missing from the request.
    MissingArgument,
    /// The supplied time is not valid.
    InvalidTime,
    /// The supplied period is not strictly positive.
    InvalidPeriod,
    /// The supplied deadline lies in the past.
    InvalidDeadline,
    /// A payload could not be deserialized by the engine.
    InvalidMessage,
    /// The event key does not refer to a scheduled event.
    InvalidKey,
    /// The named source does not exist.
    SourceNotFound,
    /// The named sink does not exist.
    SinkNotFound,
}

impl From<ServerError> for SimulationError {
    fn from(err: ServerError) -> Self {
        let ServerError { code, message } = err;
        match code {
            ErrorCode::InternalError => SimulationError::Internal(message),
            ErrorCode::SimulationNotStarted => SimulationError::NotStarted(message),
            ErrorCode::SimulationTerminated => SimulationError::Terminated(message),
            ErrorCode::SimulationDeadlock => SimulationError::Deadlock(message),
            ErrorCode::SimulationMessageLoss => SimulationError::MessageLoss(message),
            ErrorCode::SimulationNoRecipient => SimulationError::NoRecipient(message),
            ErrorCode::SimulationPanic => SimulationError::Panic(message),
            ErrorCode::SimulationTimeout => SimulationError::Timeout(message),
            ErrorCode::SimulationOutOfSync => SimulationError::OutOfSync(message),
            ErrorCode::SimulationBadQuery => SimulationError::BadQuery(message),
            ErrorCode::SimulationHalted => SimulationError::Halted(message),
            ErrorCode::MissingArgument => SimulationError::MissingArgument(message),
            ErrorCode::InvalidTime => SimulationError::InvalidTime(message),
            ErrorCode::InvalidPeriod => SimulationError::InvalidPeriod(message),
            ErrorCode::InvalidDeadline => SimulationError::InvalidDeadline(message),
            ErrorCode::InvalidMessage => SimulationError::InvalidMessage(message),
            ErrorCode::InvalidKey => SimulationError::InvalidKey(message),
            ErrorCode::SourceNotFound => SimulationError::SourceNotFound(message),
            ErrorCode::SinkNotFound => SimulationError::SinkNotFound(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(request: &Request) -> Request {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(request, &mut bytes).unwrap();
        ciborium::de::from_reader(bytes.as_slice()).unwrap()
    }

    #[test]
    fn requests_survive_the_envelope() {
        let request = Request::ScheduleEvent {
            deadline: Deadline::Time(MonotonicTime::new(3, 0)),
            source_name: "input".to_string(),
            event: ByteBuf::from(vec![0x11]),
            period: Some(Duration::from_secs(1)),
            with_key: true,
        };

        match round_trip(&request) {
            Request::ScheduleEvent {
                deadline,
                source_name,
                event,
                period,
                with_key,
            } => {
                assert_eq!(deadline, Deadline::Time(MonotonicTime::new(3, 0)));
                assert_eq!(source_name, "input");
                assert_eq!(event.as_ref(), [0x11]);
                assert_eq!(period, Some(Duration::from_secs(1)));
                assert!(with_key);
            },
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn error_codes_map_to_simulation_errors() {
        let err = ServerError {
            code: ErrorCode::SourceNotFound,
            message: "no source `input`".to_string(),
        };
        assert_eq!(
            SimulationError::from(err),
            SimulationError::SourceNotFound("no source `input`".to_string())
        );
    }
}
