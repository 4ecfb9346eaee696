//! Error types for the benchlink SDK.
//!
//! Errors are grouped by the layer that produces them: [`CodecError`] for the
//! sum-type wire codec, [`TransportError`] for connection and framing
//! failures, and [`SimulationError`] for errors reported by the remote engine.
//! The crate-level [`Error`] wraps all three.

use thiserror::Error;

/// Result type alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for all SDK operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Encoding or decoding of a wire payload failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The connection to the bench failed or the frame stream is corrupt.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The remote engine reported an error.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Errors produced by the union builder and the wire codec.
///
/// All of these are deterministic functions of their inputs: no partial state
/// is mutated on failure, so a caller may retry with corrected inputs.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Two sibling variants in a union declaration share a name.
    #[error("duplicate variant name `{0}`")]
    DuplicateVariantName(String),

    /// A union declaration contains no variants.
    #[error("union `{0}` declares no variants")]
    EmptyUnion(String),

    /// A union contains itself directly as a variant element, with no
    /// intervening container type.
    #[error("union `{union}` contains itself directly through variant `{variant}`")]
    CyclicUnion {
        /// The union being bound.
        union: String,
        /// The offending variant.
        variant: String,
    },

    /// A forward reference was bound twice.
    #[error("forward reference is already bound to union `{0}`")]
    RefAlreadyBound(String),

    /// A forward reference was used before being bound to a union.
    #[error("forward reference used before being bound")]
    UnboundRef,

    /// A wire discriminant does not name any variant of the expected union.
    ///
    /// Indicates a schema mismatch between the client and the engine.
    #[error("unknown variant `{variant}` for union `{union}`")]
    UnknownVariant {
        /// The expected union.
        union: String,
        /// The discriminant found on the wire.
        variant: String,
    },

    /// The number of fields disagrees with the variant's declared arity.
    #[error("variant `{variant}` expects {expected} field(s), got {actual}")]
    ArityMismatch {
        /// The variant being constructed or decoded.
        variant: String,
        /// Declared field count.
        expected: usize,
        /// Field count actually supplied.
        actual: usize,
    },

    /// A named-field payload carries a field the variant does not declare.
    #[error("variant `{variant}` has no field `{field}`")]
    UnknownField {
        /// The variant being constructed or decoded.
        variant: String,
        /// The undeclared field name.
        field: String,
    },

    /// A value was constructed against a variant of a different shape.
    #[error("variant `{variant}` is not {expected}-shaped")]
    ShapeMismatch {
        /// The variant being constructed.
        variant: String,
        /// The shape the constructor requires.
        expected: &'static str,
    },

    /// The value has no defined wire mapping.
    #[error("value has no wire mapping: {0}")]
    UnsupportedValue(String),

    /// The wire bytes are structurally corrupt.
    ///
    /// Distinct from the schema-mismatch errors above: the data is not valid
    /// for any schema.
    #[error("malformed wire data: {0}")]
    Malformed(String),
}

/// Errors produced by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint address is neither a `host:port` pair nor a `unix:` path.
    #[error("invalid endpoint address `{0}`")]
    InvalidAddress(String),

    /// The connection was closed by either side.
    #[error("connection closed")]
    ConnectionClosed,

    /// An incoming or outgoing frame exceeds the frame size limit.
    #[error("frame of {actual} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Size of the offending frame.
        actual: usize,
        /// Configured limit.
        max: usize,
    },

    /// An underlying I/O operation failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the remote simulation engine.
///
/// Each variant corresponds to one engine error code; the message carries the
/// engine's own description.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// The engine hit an internal error.
    #[error("internal simulation error: {0}")]
    Internal(String),

    /// No simulation bench has been started.
    #[error("simulation not started: {0}")]
    NotStarted(String),

    /// The simulation was terminated.
    #[error("simulation terminated: {0}")]
    Terminated(String),

    /// The simulation deadlocked.
    #[error("simulation deadlock: {0}")]
    Deadlock(String),

    /// A message was lost between models.
    #[error("simulation message loss: {0}")]
    MessageLoss(String),

    /// An event had no recipient.
    #[error("no recipient for message: {0}")]
    NoRecipient(String),

    /// A model panicked.
    #[error("model panic: {0}")]
    Panic(String),

    /// The simulation timed out.
    #[error("simulation timeout: {0}")]
    Timeout(String),

    /// The simulation clock went out of sync.
    #[error("simulation out of sync: {0}")]
    OutOfSync(String),

    /// A query could not be answered.
    #[error("bad query: {0}")]
    BadQuery(String),

    /// The simulation was halted by request.
    #[error("simulation halted: {0}")]
    Halted(String),

    /// A required request argument was missing.
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// The supplied time is not valid.
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// The supplied period is not strictly positive.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// The supplied deadline lies in the past.
    #[error("invalid deadline: {0}")]
    InvalidDeadline(String),

    /// A payload could not be deserialized by the engine.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The event key does not refer to a scheduled event.
    #[error("invalid event key: {0}")]
    InvalidKey(String),

    /// The named event or query source does not exist.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// The named event sink does not exist.
    #[error("sink not found: {0}")]
    SinkNotFound(String),

    /// The engine sent a reply of an unexpected kind.
    #[error("unexpected reply from server: {0}")]
    UnexpectedReply(String),
}
