//! Error taxonomy for the transport core.
//!
//! Every public operation of the core reports failure through
//! [`TransportError`] rather than panicking.  The variants map one-to-one to
//! the four failure classes callers need to tell apart:
//!
//! | Variant          | Cause                                          | Retry? |
//! |------------------|------------------------------------------------|--------|
//! | `Configuration`  | bad host, port, TTL, or mode/protocol combo    | no     |
//! | `NotInitialized` | endpoint never opened, or already closed       | no     |
//! | `Resource`       | socket create / bind / connect failed          | no     |
//! | `SendFailed`     | transient I/O failure while sending            | caller |
//!
//! The fast send path collapses all of these into the `-1` sentinel of
//! [`SendStamp`](crate::SendStamp); use `try_send_fast` on the client when
//! the structured error is needed.

use thiserror::Error;

use crate::domain::endpoint::ConfigError;

/// Errors returned by endpoint, client, and dispatcher operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint configuration is invalid or the host cannot be resolved.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The operation needs an open endpoint but none is open.
    #[error("endpoint is not initialized")]
    NotInitialized,

    /// The OS refused to create, bind, or connect the socket.
    #[error("socket resource error while {context}: {source}")]
    Resource {
        /// What the core was doing, e.g. `"binding 0.0.0.0:5001"`.
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The send call itself failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Builds a [`TransportError::Resource`] with a short context string.
    pub fn resource(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Resource {
            context: context.into(),
            source,
        }
    }

    /// Returns `true` when the error is [`TransportError::NotInitialized`].
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_converts_from_config_error() {
        // Arrange
        let cfg_err = ConfigError::InvalidPort(0);

        // Act
        let err: TransportError = cfg_err.into();

        // Assert
        assert!(matches!(
            err,
            TransportError::Configuration(ConfigError::InvalidPort(0))
        ));
    }

    #[test]
    fn test_resource_helper_keeps_context_in_message() {
        // Arrange
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");

        // Act
        let err = TransportError::resource("binding 0.0.0.0:5001", io);

        // Assert
        let msg = err.to_string();
        assert!(msg.contains("binding 0.0.0.0:5001"), "got: {msg}");
        assert!(msg.contains("in use"), "got: {msg}");
    }

    #[test]
    fn test_is_not_initialized_only_matches_that_variant() {
        assert!(TransportError::NotInitialized.is_not_initialized());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(!TransportError::SendFailed(io).is_not_initialized());
    }
}
