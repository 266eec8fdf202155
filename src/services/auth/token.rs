//! Token extraction from the gateway event and shape validation.
//!
//! The event is read through `serde_json::Value` so that any shape the gateway
//! sends can be classified instead of failing deserialization.

use serde_json::Value;
use tracing::warn;

use crate::error::AuthorizeError;

/// Header key the bearer token is carried under.
pub const AUTHORIZATION_KEY: &str = "authorization";

/// What was found where the token should be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCandidate {
    /// No headers, headers not an object, no `authorization` key, or JSON `null`.
    Absent,
    /// Number, boolean, array or object.
    NotAString,
    Empty,
    Present(String),
}

impl TokenCandidate {
    /// Read `headers.authorization` from a gateway event.
    ///
    /// A `null` event is not a request at all and is reported as malformed;
    /// every other shape yields a candidate.
    pub fn from_event(event: &Value) -> Result<Self, AuthorizeError> {
        if event.is_null() {
            return Err(AuthorizeError::MalformedRequest);
        }

        let value = event
            .get("headers")
            .and_then(|headers| headers.get(AUTHORIZATION_KEY));

        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(s)) if s.is_empty() => Self::Empty,
            Some(Value::String(s)) => Self::Present(s.clone()),
            Some(_) => Self::NotAString,
        }
    }

    /// Accept only a non-empty string token.
    pub fn validate(self) -> Result<String, AuthorizeError> {
        match self {
            Self::Present(token) => Ok(token),
            Self::Absent => {
                warn!("no token provided");
                Err(AuthorizeError::InvalidToken)
            }
            Self::NotAString => {
                warn!("token is not a string");
                Err(AuthorizeError::InvalidToken)
            }
            Self::Empty => {
                warn!("token is an empty string");
                Err(AuthorizeError::InvalidToken)
            }
        }
    }
}
