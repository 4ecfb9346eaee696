//! Frame transport.
//!
//! The bench protocol exchanges CBOR payloads inside length-prefixed frames:
//! a 4-byte big-endian length followed by the frame body. [`Transport`] is
//! the seam the client talks through; [`FramedTransport`] implements it over
//! any byte stream (TCP, Unix domain socket, or an in-memory duplex in
//! tests).

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

/// Upper bound on a single frame body.
///
/// Guards against memory exhaustion from a corrupt or hostile length prefix.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// A bidirectional, frame-oriented connection to the bench.
#[async_trait]
pub trait Transport: Send {
    /// Sends one frame.
    async fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Receives the next frame.
    async fn receive(&mut self) -> Result<Bytes, TransportError>;

    /// Closes the connection.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Length-prefixed framing over an async byte stream.
pub struct FramedTransport<S> {
    stream: S,
    closed: bool,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl<S> Transport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::ConnectionClosed);
        }
        if frame.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge {
                actual: frame.len(),
                max: MAX_FRAME_LEN,
            });
        }

        self.stream.write_u32(frame.len() as u32).await?;
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Bytes, TransportError> {
        if self.closed {
            return Err(TransportError::ConnectionClosed);
        }

        let len = match self.stream.read_u32().await {
            Ok(len) => len as usize,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(TransportError::ConnectionClosed)
            },
            Err(e) => return Err(e.into()),
        };
        if len > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge {
                actual: len,
                max: MAX_FRAME_LEN,
            });
        }

        let mut body = BytesMut::zeroed(len);
        self.stream.read_exact(&mut body).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                TransportError::ConnectionClosed
            } else {
                TransportError::Io(e)
            }
        })?;
        Ok(body.freeze())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if !self.closed {
            self.closed = true;
            self.stream.shutdown().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_round_trip_over_a_duplex_stream() {
        let (a, b) = tokio::io::duplex(1024);
        let mut alice = FramedTransport::new(a);
        let mut bob = FramedTransport::new(b);

        alice.send(b"step").await.unwrap();
        alice.send(b"").await.unwrap();

        assert_eq!(bob.receive().await.unwrap().as_ref(), b"step");
        assert_eq!(bob.receive().await.unwrap().as_ref(), b"");
    }

    #[tokio::test]
    async fn oversized_outgoing_frames_are_rejected() {
        let (a, _b) = tokio::io::duplex(64);
        let mut transport = FramedTransport::new(a);
        let frame = vec![0u8; MAX_FRAME_LEN + 1];

        let err = transport.send(&frame).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected_before_allocation() {
        let (a, mut b) = tokio::io::duplex(64);
        let mut transport = FramedTransport::new(a);

        b.write_u32(u32::MAX).await.unwrap();
        let err = transport.receive().await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn eof_maps_to_connection_closed() {
        let (a, b) = tokio::io::duplex(64);
        let mut transport = FramedTransport::new(a);
        drop(b);

        let err = transport.receive().await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
    }

    #[tokio::test]
    async fn closed_transport_refuses_further_traffic() {
        let (a, _b) = tokio::io::duplex(64);
        let mut transport = FramedTransport::new(a);

        transport.close().await.unwrap();
        assert!(matches!(
            transport.send(b"x").await.unwrap_err(),
            TransportError::ConnectionClosed
        ));
        assert!(matches!(
            transport.receive().await.unwrap_err(),
            TransportError::ConnectionClosed
        ));
    }
}
