//! Shared plumbing between the client and the wire: endpoint addressing, the
//! frame transport, and the request/reply envelope.

pub mod endpoint;
pub mod protocol;
pub mod transport;

pub use endpoint::Endpoint;
pub use transport::{FramedTransport, Transport, MAX_FRAME_LEN};
