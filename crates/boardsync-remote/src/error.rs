//! Error types for the remote boundary
//!
//! - [`TransportError`]: a gateway call failed (network, auth, remote refusal)
//! - [`ParseError`]: a payload arrived but did not validate

use std::fmt;

/// Cause of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Connection, DNS, timeout
    Network,
    /// Missing, expired or rejected credential
    Auth,
    /// Remote API answered with an error
    Remote,
    /// Remote API throttled the request
    RateLimited,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Remote => "remote",
            Self::RateLimited => "rate limited",
        };
        f.write_str(s)
    }
}

/// A remote gateway call failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    /// Failure cause
    pub kind: TransportErrorKind,
    /// Message reported by the transport
    pub message: String,
}

impl TransportError {
    /// Create transport error
    #[inline]
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Network failure
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    /// Auth failure
    #[inline]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Auth, message)
    }

    /// Remote API error
    #[inline]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Remote, message)
    }

    /// Whether retrying the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Network | TransportErrorKind::RateLimited
        )
    }
}

/// A remote payload failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Required field absent
    #[error("{entity} {id}: missing field `{field}`")]
    MissingField {
        /// Entity kind (board, group, item, sub-item)
        entity: &'static str,
        /// Identifier of the entity, or `?` if that is what is missing
        id: String,
        /// Missing field name
        field: &'static str,
    },

    /// Identifier present but blank
    #[error("{entity} has an empty identifier")]
    EmptyIdentifier {
        /// Entity kind
        entity: &'static str,
    },

    /// Board state not recognised
    #[error("board {board}: unknown state `{state}`")]
    UnknownBoardState {
        /// Board identifier
        board: String,
        /// Raw state
        state: String,
    },

    /// Item references a group not present on its board
    #[error("item {item}: unknown group `{group}`")]
    UnknownGroup {
        /// Item identifier
        item: String,
        /// Referenced group identifier
        group: String,
    },

    /// Date column text is not `YYYY-MM-DD`
    #[error("{entity} {id}: invalid date `{value}`")]
    InvalidDate {
        /// Entity kind
        entity: &'static str,
        /// Entity identifier
        id: String,
        /// Raw value
        value: String,
    },
}
