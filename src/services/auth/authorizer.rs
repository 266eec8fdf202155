use std::{fmt, sync::Arc};

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::AuthorizeError;
use crate::repos::totem_repo::TotemStore;
use crate::services::auth::decision::{Decision, TOTEM_ID_KEY};
use crate::services::auth::token::TokenCandidate;

enum Strategy {
    SharedSecret { key: String },
    Totem { store: Arc<dyn TotemStore> },
}

/// Turns a gateway event into an allow/deny [`Decision`].
///
/// - Stateless between calls; the only shared state is the secret or the store handle.
/// - `authorize` never fails: every error path ends in a denial.
pub struct Authorizer {
    strategy: Strategy,
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the secret
        f.debug_struct("Authorizer")
            .field("mode", &self.mode())
            .finish()
    }
}

impl Authorizer {
    pub fn shared_secret(key: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::SharedSecret { key: key.into() },
        }
    }

    pub fn totem(store: Arc<dyn TotemStore>) -> Self {
        Self {
            strategy: Strategy::Totem { store },
        }
    }

    pub fn mode(&self) -> &'static str {
        match self.strategy {
            Strategy::SharedSecret { .. } => "shared_secret",
            Strategy::Totem { .. } => "totem",
        }
    }

    /// Authorize a raw gateway event (`{"headers": {"authorization": ..}}`).
    pub async fn authorize(&self, event: &Value) -> Decision {
        let result = match TokenCandidate::from_event(event) {
            Ok(candidate) => self.decide(candidate).await,
            Err(err) => Err(err),
        };

        Self::finish(result)
    }

    /// Authorize an already extracted token candidate.
    pub async fn authorize_candidate(&self, candidate: TokenCandidate) -> Decision {
        Self::finish(self.decide(candidate).await)
    }

    async fn decide(&self, candidate: TokenCandidate) -> Result<Decision, AuthorizeError> {
        let token = candidate.validate()?;

        match &self.strategy {
            Strategy::SharedSecret { key } => {
                verify_shared_secret(&token, key)?;
                Ok(Decision::allow())
            }
            Strategy::Totem { store } => {
                let totem_id = resolve_totem(store.as_ref(), &token).await?;
                Ok(Decision::allow_with(TOTEM_ID_KEY, totem_id))
            }
        }
    }

    fn finish(result: Result<Decision, AuthorizeError>) -> Decision {
        match result {
            Ok(decision) => decision,
            Err(err) => {
                // Client errors were already logged where they were detected.
                if !err.is_client_error() {
                    error!(error = ?err, "unexpected error during authorization");
                }
                Decision::from(err)
            }
        }
    }
}

/// Exact, case-sensitive comparison against the configured secret.
pub fn verify_shared_secret(token: &str, key: &str) -> Result<(), AuthorizeError> {
    if token != key {
        warn!("token is not valid");
        return Err(AuthorizeError::InvalidToken);
    }

    debug!("token matches configured secret");
    Ok(())
}

/// Map a validated token to its totem id with a single store lookup.
///
/// When several rows share the token, the first row returned wins.
pub async fn resolve_totem(store: &dyn TotemStore, token: &str) -> Result<String, AuthorizeError> {
    let rows = store.find_by_token_access(token).await?;

    match rows.into_iter().next() {
        Some(row) => {
            debug!(totem_id = %row.id, "totem resolved");
            Ok(row.id)
        }
        None => {
            warn!("totem not found for token");
            Err(AuthorizeError::InvalidToken)
        }
    }
}
