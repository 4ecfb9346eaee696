//! # benchlink
//!
//! A Rust client SDK for remote discrete-event simulation benches.
//!
//! The remote engine models application data — event payloads, query
//! replies, persisted state — as tagged sum types carried over a compact
//! CBOR wire format. This crate provides:
//!
//! - a declarative [union builder](types::UnionDefinition) for mirroring the
//!   engine's enums at runtime, with unit, positional, and named-field
//!   variants nested to any depth;
//! - a type-directed [codec](codec) converting between host
//!   [`Value`]s and wire bytes, byte-exact against the engine's
//!   representation;
//! - an async [client](client::Simulation) (plus a
//!   [blocking façade](client::blocking::Simulation)) covering the full
//!   bench protocol: clock control, event scheduling and cancellation, sink
//!   I/O, queries, and state save/restore.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use benchlink::client::Simulation;
//! use benchlink::types::{ElementType, UnionDefinition};
//!
//! # async fn example() -> benchlink::Result<()> {
//! // Mirror the engine-side enum:
//! //     enum BrewCommand { Espresso, Custom(f64), Fill { volume: f64 } }
//! let command = UnionDefinition::builder("BrewCommand")
//!     .unit("Espresso")
//!     .tuple("Custom", [ElementType::Float])
//!     .record("Fill", [("volume", ElementType::Float)])
//!     .build()?;
//!
//! let sim = Simulation::connect("localhost:41633").await?;
//! sim.start(()).await?;
//!
//! sim.process_event("brew_cmd", command.tuple_value("Custom", [30.0.into()])?)
//!     .await?;
//! let t = sim.step().await?;
//! println!("brewed until {t}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod codec;
pub mod error;
pub mod shared;
pub mod types;

pub use client::Simulation;
pub use codec::{dumps, loads, loads_into};
pub use error::{CodecError, Error, Result, SimulationError, TransportError};
pub use types::{
    Deadline, Duration, ElementType, EventKey, MonotonicTime, UnionDefinition, UnionRef,
    UnionValue, Value,
};
