//! A blocking façade over the asynchronous client.
//!
//! Each handle owns a current-thread runtime and drives the async client to
//! completion on every call. Use this from synchronous code such as test
//! harnesses and scripts; inside an async context, use
//! [`client::Simulation`](crate::client::Simulation) directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use benchlink::client::blocking::Simulation;
//! use benchlink::types::Duration;
//!
//! # fn example() -> benchlink::Result<()> {
//! let sim = Simulation::connect("unix:/tmp/bench.sock")?;
//! sim.start(())?;
//! sim.schedule_event(Duration::from_secs(3), "input", 17i64, None)?;
//! let t = sim.step()?;
//! println!("stepped to {t}");
//! # Ok(())
//! # }
//! ```

use crate::client;
use crate::error::{Result, TransportError};
use crate::types::key::EventKey;
use crate::types::time::{Deadline, Duration, MonotonicTime};
use crate::types::union::ElementType;
use crate::types::value::Value;

/// A blocking handle to a remote simulation bench.
#[derive(Debug)]
pub struct Simulation {
    inner: client::Simulation,
    runtime: tokio::runtime::Runtime,
}

impl Simulation {
    /// Connects to a bench server. See
    /// [`client::Simulation::connect`] for the accepted address forms.
    pub fn connect(address: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Io)?;
        let inner = runtime.block_on(client::Simulation::connect(address))?;
        Ok(Self { inner, runtime })
    }

    /// Wraps an already-established transport.
    ///
    /// Mainly useful for tests and custom channels.
    pub fn with_transport(transport: impl crate::shared::Transport + 'static) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Io)?;
        Ok(Self {
            inner: client::Simulation::with_transport(transport),
            runtime,
        })
    }

    /// Closes the connection.
    pub fn close(&self) -> Result<()> {
        self.runtime.block_on(self.inner.close())
    }

    /// Creates a simulation bench. See [`client::Simulation::start`].
    pub fn start(&self, cfg: impl Into<Value>) -> Result<()> {
        self.runtime.block_on(self.inner.start(cfg))
    }

    /// Terminates the simulation.
    pub fn terminate(&self) -> Result<()> {
        self.runtime.block_on(self.inner.terminate())
    }

    /// Requests the simulation to stop at the earliest opportunity.
    pub fn halt(&self) -> Result<()> {
        self.runtime.block_on(self.inner.halt())
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> Result<MonotonicTime> {
        self.runtime.block_on(self.inner.time())
    }

    /// Advances simulation time to that of the next scheduled event.
    pub fn step(&self) -> Result<MonotonicTime> {
        self.runtime.block_on(self.inner.step())
    }

    /// Advances simulation time until all scheduled events are processed.
    pub fn step_unbounded(&self) -> Result<MonotonicTime> {
        self.runtime.block_on(self.inner.step_unbounded())
    }

    /// Advances simulation time until the specified deadline.
    pub fn step_until(&self, deadline: impl Into<Deadline>) -> Result<MonotonicTime> {
        self.runtime.block_on(self.inner.step_until(deadline))
    }

    /// Schedules an event at a future time.
    pub fn schedule_event(
        &self,
        deadline: impl Into<Deadline>,
        source_name: &str,
        event: impl Into<Value>,
        period: Option<Duration>,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.schedule_event(deadline, source_name, event, period))
    }

    /// Schedules an event and returns a key that can cancel it.
    pub fn schedule_keyed_event(
        &self,
        deadline: impl Into<Deadline>,
        source_name: &str,
        event: impl Into<Value>,
        period: Option<Duration>,
    ) -> Result<EventKey> {
        self.runtime.block_on(
            self.inner
                .schedule_keyed_event(deadline, source_name, event, period),
        )
    }

    /// Cancels a previously scheduled event.
    pub fn cancel_event(&self, key: EventKey) -> Result<()> {
        self.runtime.block_on(self.inner.cancel_event(key))
    }

    /// Broadcasts an event from an event source immediately.
    pub fn process_event(&self, source_name: &str, event: impl Into<Value>) -> Result<()> {
        self.runtime
            .block_on(self.inner.process_event(source_name, event))
    }

    /// Broadcasts a query immediately and collects the replies.
    pub fn process_query(
        &self,
        source_name: &str,
        request: impl Into<Value>,
        reply_type: &ElementType,
    ) -> Result<Vec<Value>> {
        self.runtime
            .block_on(self.inner.process_query(source_name, request, reply_type))
    }

    /// Reads all pending events from an event sink.
    pub fn read_events(&self, sink_name: &str, event_type: &ElementType) -> Result<Vec<Value>> {
        self.runtime
            .block_on(self.inner.read_events(sink_name, event_type))
    }

    /// Waits for the next event from an event sink.
    pub fn await_event(
        &self,
        sink_name: &str,
        timeout: Duration,
        event_type: &ElementType,
    ) -> Result<Value> {
        self.runtime
            .block_on(self.inner.await_event(sink_name, timeout, event_type))
    }

    /// Enables the reception of new events by the specified sink.
    pub fn open_sink(&self, sink_name: &str) -> Result<()> {
        self.runtime.block_on(self.inner.open_sink(sink_name))
    }

    /// Disables the reception of new events by the specified sink.
    pub fn close_sink(&self, sink_name: &str) -> Result<()> {
        self.runtime.block_on(self.inner.close_sink(sink_name))
    }

    /// Captures the bench state as an opaque blob.
    pub fn save(&self) -> Result<Vec<u8>> {
        self.runtime.block_on(self.inner.save())
    }

    /// Restores a previously saved bench state.
    pub fn restore(&self, state: &[u8]) -> Result<()> {
        self.runtime.block_on(self.inner.restore(state))
    }
}
