//! The asynchronous client.
//!
//! [`Simulation`] is a handle to a remote simulation bench. Every method is
//! one request/reply exchange; request frames are serialized on a single
//! connection, so concurrent calls queue rather than interleave.
//!
//! # Example
//!
//! ```rust,no_run
//! use benchlink::client::Simulation;
//! use benchlink::types::{Duration, ElementType};
//!
//! # async fn example() -> benchlink::Result<()> {
//! let sim = Simulation::connect("localhost:41633").await?;
//! sim.start(()).await?;
//!
//! sim.process_event("brew_cmd", ()).await?;
//! let t = sim.step_until(Duration::from_secs(3)).await?;
//! println!("simulation time is now {t}");
//!
//! let flow = sim.read_events("flow_rate", &ElementType::Float).await?;
//! println!("flow rate samples: {flow:?}");
//! # Ok(())
//! # }
//! ```

pub mod blocking;

use serde_bytes::ByteBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::codec::{dumps, loads};
use crate::error::{CodecError, Error, Result, SimulationError};
use crate::shared::endpoint::Endpoint;
use crate::shared::protocol::{Reply, Request};
use crate::shared::transport::Transport;
use crate::types::key::EventKey;
use crate::types::time::{Deadline, Duration, MonotonicTime};
use crate::types::union::ElementType;
use crate::types::value::Value;

/// An asynchronous handle to a remote simulation bench.
pub struct Simulation {
    transport: Mutex<Box<dyn Transport>>,
}

impl Simulation {
    /// Connects to a bench server.
    ///
    /// The address is either a `host:port` pair for a networked connection
    /// or a `unix:`-prefixed socket path for a local one.
    pub async fn connect(address: &str) -> Result<Self> {
        let endpoint = Endpoint::parse(address)?;
        let transport = endpoint.connect().await?;
        info!(%address, "connected to simulation bench");
        Ok(Self {
            transport: Mutex::new(transport),
        })
    }

    /// Wraps an already-established transport.
    ///
    /// Mainly useful for tests and custom channels.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Mutex::new(Box::new(transport)),
        }
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<()> {
        debug!("closing connection");
        self.transport.lock().await.close().await?;
        Ok(())
    }

    async fn request(&self, request: &Request) -> Result<Reply> {
        let mut frame = Vec::new();
        ciborium::ser::into_writer(request, &mut frame)
            .map_err(|e| CodecError::UnsupportedValue(e.to_string()))?;

        let mut transport = self.transport.lock().await;
        transport.send(&frame).await?;
        let reply = transport.receive().await?;
        drop(transport);

        let reply: Reply = ciborium::de::from_reader(reply.as_ref())
            .map_err(|e| CodecError::Malformed(e.to_string()))?;
        match reply {
            Reply::Error(err) => Err(SimulationError::from(err).into()),
            other => Ok(other),
        }
    }

    async fn request_empty(&self, request: &Request) -> Result<()> {
        match self.request(request).await? {
            Reply::Empty => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    async fn request_time(&self, request: &Request) -> Result<MonotonicTime> {
        match self.request(request).await? {
            Reply::Time(time) => Ok(time),
            other => Err(unexpected(&other)),
        }
    }

    /// Creates a simulation bench.
    ///
    /// If a bench is already running it is replaced; events not yet
    /// retrieved from the sinks are lost. Pass `()` when the bench
    /// initializer takes no configuration.
    pub async fn start(&self, cfg: impl Into<Value>) -> Result<()> {
        debug!("starting bench");
        let cfg = ByteBuf::from(dumps(&cfg.into())?);
        self.request_empty(&Request::Init { cfg }).await
    }

    /// Terminates the simulation.
    pub async fn terminate(&self) -> Result<()> {
        debug!("terminating simulation");
        self.request_empty(&Request::Terminate).await
    }

    /// Requests the simulation to stop at the earliest opportunity.
    ///
    /// Takes effect on the simulator's next attempt to advance time.
    pub async fn halt(&self) -> Result<()> {
        debug!("requesting halt");
        self.request_empty(&Request::Halt).await
    }

    /// Returns the current simulation time.
    pub async fn time(&self) -> Result<MonotonicTime> {
        self.request_time(&Request::Time).await
    }

    /// Advances simulation time to that of the next scheduled event,
    /// processing that event and all others scheduled for the same time, and
    /// returns the final simulation time.
    pub async fn step(&self) -> Result<MonotonicTime> {
        debug!("stepping");
        self.request_time(&Request::Step).await
    }

    /// Iteratively advances simulation time until all scheduled events are
    /// processed or the simulation is halted.
    pub async fn step_unbounded(&self) -> Result<MonotonicTime> {
        debug!("stepping unbounded");
        self.request_time(&Request::StepUnbounded).await
    }

    /// Iteratively advances simulation time until the specified deadline.
    ///
    /// The returned time always equals the target time, whether or not an
    /// event was scheduled for it.
    pub async fn step_until(&self, deadline: impl Into<Deadline>) -> Result<MonotonicTime> {
        let deadline = deadline.into();
        debug!(?deadline, "stepping until deadline");
        self.request_time(&Request::StepUntil { deadline }).await
    }

    /// Schedules an event at a future time.
    ///
    /// Events scheduled for the same time and targeting the same model are
    /// processed in scheduling order. A `period` repeats the event until
    /// cancellation, but an event scheduled here cannot be cancelled; use
    /// [`Simulation::schedule_keyed_event`] to obtain a cancellation key.
    pub async fn schedule_event(
        &self,
        deadline: impl Into<Deadline>,
        source_name: &str,
        event: impl Into<Value>,
        period: Option<Duration>,
    ) -> Result<()> {
        let deadline = deadline.into();
        debug!(source = %source_name, ?deadline, "scheduling event");
        self.request_empty(&Request::ScheduleEvent {
            deadline,
            source_name: source_name.to_string(),
            event: ByteBuf::from(dumps(&event.into())?),
            period,
            with_key: false,
        })
        .await
    }

    /// Schedules an event and returns a key that can cancel it.
    pub async fn schedule_keyed_event(
        &self,
        deadline: impl Into<Deadline>,
        source_name: &str,
        event: impl Into<Value>,
        period: Option<Duration>,
    ) -> Result<EventKey> {
        let deadline = deadline.into();
        debug!(source = %source_name, ?deadline, "scheduling keyed event");
        let reply = self
            .request(&Request::ScheduleEvent {
                deadline,
                source_name: source_name.to_string(),
                event: ByteBuf::from(dumps(&event.into())?),
                period,
                with_key: true,
            })
            .await?;
        match reply {
            Reply::Key(key) => Ok(key),
            other => Err(unexpected(&other)),
        }
    }

    /// Cancels a previously scheduled event.
    ///
    /// Consumes the key: the engine invalidates it whether or not the
    /// cancellation succeeds.
    pub async fn cancel_event(&self, key: EventKey) -> Result<()> {
        debug!("cancelling event");
        self.request_empty(&Request::CancelEvent { key }).await
    }

    /// Broadcasts an event from an event source immediately.
    ///
    /// Simulation time remains unchanged.
    pub async fn process_event(&self, source_name: &str, event: impl Into<Value>) -> Result<()> {
        debug!(source = %source_name, "processing event");
        self.request_empty(&Request::ProcessEvent {
            source_name: source_name.to_string(),
            event: ByteBuf::from(dumps(&event.into())?),
        })
        .await
    }

    /// Broadcasts a query from a query source immediately and collects the
    /// replies, in responding-model order.
    ///
    /// Replies are decoded against `reply_type`; pass
    /// [`ElementType::Untyped`] to get the canonical built-in
    /// representation.
    pub async fn process_query(
        &self,
        source_name: &str,
        request: impl Into<Value>,
        reply_type: &ElementType,
    ) -> Result<Vec<Value>> {
        debug!(source = %source_name, "processing query");
        let reply = self
            .request(&Request::ProcessQuery {
                source_name: source_name.to_string(),
                request: ByteBuf::from(dumps(&request.into())?),
            })
            .await?;
        match reply {
            Reply::Replies(raw) => raw
                .iter()
                .map(|bytes| loads(bytes, reply_type).map_err(Error::from))
                .collect(),
            other => Err(unexpected(&other)),
        }
    }

    /// Reads all pending events from an event sink, in arrival order.
    ///
    /// Events are decoded against `event_type`; pass
    /// [`ElementType::Untyped`] to get the canonical built-in
    /// representation.
    pub async fn read_events(
        &self,
        sink_name: &str,
        event_type: &ElementType,
    ) -> Result<Vec<Value>> {
        debug!(sink = %sink_name, "reading events");
        let reply = self
            .request(&Request::ReadEvents {
                sink_name: sink_name.to_string(),
            })
            .await?;
        match reply {
            Reply::Events(raw) => raw
                .iter()
                .map(|bytes| loads(bytes, event_type).map_err(Error::from))
                .collect(),
            other => Err(unexpected(&other)),
        }
    }

    /// Waits for the next event from an event sink.
    pub async fn await_event(
        &self,
        sink_name: &str,
        timeout: Duration,
        event_type: &ElementType,
    ) -> Result<Value> {
        debug!(sink = %sink_name, "awaiting event");
        let reply = self
            .request(&Request::AwaitEvent {
                sink_name: sink_name.to_string(),
                timeout,
            })
            .await?;
        match reply {
            Reply::Event(bytes) => Ok(loads(&bytes, event_type)?),
            other => Err(unexpected(&other)),
        }
    }

    /// Enables the reception of new events by the specified sink.
    pub async fn open_sink(&self, sink_name: &str) -> Result<()> {
        debug!(sink = %sink_name, "opening sink");
        self.request_empty(&Request::OpenSink {
            sink_name: sink_name.to_string(),
        })
        .await
    }

    /// Disables the reception of new events by the specified sink.
    pub async fn close_sink(&self, sink_name: &str) -> Result<()> {
        debug!(sink = %sink_name, "closing sink");
        self.request_empty(&Request::CloseSink {
            sink_name: sink_name.to_string(),
        })
        .await
    }

    /// Captures the bench state as an opaque blob that
    /// [`Simulation::restore`] accepts.
    pub async fn save(&self) -> Result<Vec<u8>> {
        debug!("saving bench state");
        match self.request(&Request::Save).await? {
            Reply::State(state) => Ok(state.into_vec()),
            other => Err(unexpected(&other)),
        }
    }

    /// Restores a previously saved bench state.
    pub async fn restore(&self, state: &[u8]) -> Result<()> {
        debug!("restoring bench state");
        self.request_empty(&Request::Restore {
            state: ByteBuf::from(state.to_vec()),
        })
        .await
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation").finish_non_exhaustive()
    }
}

fn unexpected(reply: &Reply) -> Error {
    SimulationError::UnexpectedReply(format!("{reply:?}")).into()
}
