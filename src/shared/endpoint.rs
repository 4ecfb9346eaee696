//! Endpoint addressing.
//!
//! Two address forms are recognized: a `host:port` pair for a TCP connection,
//! and a `unix:`-prefixed filesystem path for a local Unix domain socket.
//! The socket path may be relative (`unix:relative/path`), absolute
//! (`unix:/absolute/path`) or in URL form (`unix:///absolute/path`).

use std::path::PathBuf;

use crate::error::TransportError;
use crate::shared::transport::{FramedTransport, Transport};

/// A parsed bench address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A networked `host:port` endpoint.
    Tcp(String),
    /// A local Unix domain socket endpoint.
    Unix(PathBuf),
}

impl Endpoint {
    /// Parses an address string into an endpoint.
    pub fn parse(address: &str) -> Result<Self, TransportError> {
        let trimmed = address.trim();
        if let Some(rest) = trimmed.strip_prefix("unix:") {
            let path = match rest.strip_prefix("//") {
                // `unix://host/path` would name a remote authority, which
                // Unix sockets cannot express; only the empty-authority
                // `unix:///...` form is meaningful.
                Some(absolute) if absolute.starts_with('/') => absolute,
                Some(_) => return Err(TransportError::InvalidAddress(address.to_string())),
                None => rest,
            };
            if path.is_empty() {
                return Err(TransportError::InvalidAddress(address.to_string()));
            }
            return Ok(Endpoint::Unix(PathBuf::from(path)));
        }

        match trimmed.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Endpoint::Tcp(trimmed.to_string()))
            },
            _ => Err(TransportError::InvalidAddress(address.to_string())),
        }
    }

    /// Opens a framed connection to this endpoint.
    pub async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        match self {
            Endpoint::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr.as_str()).await?;
                Ok(Box::new(FramedTransport::new(stream)))
            },
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path).await?;
                Ok(Box::new(FramedTransport::new(stream)))
            },
            #[cfg(not(unix))]
            Endpoint::Unix(_) => Err(TransportError::InvalidAddress(
                "unix domain sockets are not supported on this platform".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_port_parses_as_tcp() {
        assert_eq!(
            Endpoint::parse("localhost:41633").unwrap(),
            Endpoint::Tcp("localhost:41633".to_string())
        );
        assert_eq!(
            Endpoint::parse("0.0.0.0:3700").unwrap(),
            Endpoint::Tcp("0.0.0.0:3700".to_string())
        );
    }

    #[test]
    fn unix_scheme_parses_all_three_forms() {
        assert_eq!(
            Endpoint::parse("unix:relative/path/to/socket").unwrap(),
            Endpoint::Unix(PathBuf::from("relative/path/to/socket"))
        );
        assert_eq!(
            Endpoint::parse("unix:/tmp/bench.sock").unwrap(),
            Endpoint::Unix(PathBuf::from("/tmp/bench.sock"))
        );
        assert_eq!(
            Endpoint::parse("unix:///tmp/bench.sock").unwrap(),
            Endpoint::Unix(PathBuf::from("/tmp/bench.sock"))
        );
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(
            Endpoint::parse("  unix:/tmp/bench.sock ").unwrap(),
            Endpoint::Unix(PathBuf::from("/tmp/bench.sock"))
        );
    }

    #[test]
    fn invalid_addresses_are_rejected() {
        for bad in ["", "unix:", "unix://host/path", "no-port", "host:notaport", ":41633"] {
            assert!(
                matches!(Endpoint::parse(bad), Err(TransportError::InvalidAddress(_))),
                "{bad:?} should be invalid"
            );
        }
    }
}
