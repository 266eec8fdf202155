/*
 * Responsibility
 * - gateway に返す認可判定 (Decision) の型
 * - 許可時は identity、拒否時は reason だけを context に載せる
 */
use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::AuthorizeError;

/// Context key carrying the resolved totem id.
pub const TOTEM_ID_KEY: &str = "totemId";
/// Context key carrying the denial reason.
pub const REASON_KEY: &str = "reason";

/// Allow/deny result forwarded to the gateway.
///
/// Serialized as `{"isAuthorized": bool, "context": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub is_authorized: bool,
    pub context: BTreeMap<String, String>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            is_authorized: true,
            context: BTreeMap::new(),
        }
    }

    pub fn allow_with(key: &str, value: impl Into<String>) -> Self {
        let mut decision = Self::allow();
        decision.context.insert(key.to_string(), value.into());
        decision
    }

    pub fn deny(reason: &str) -> Self {
        Self {
            is_authorized: false,
            context: BTreeMap::from([(REASON_KEY.to_string(), reason.to_string())]),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.context.get(REASON_KEY).map(String::as_str)
    }
}

impl From<AuthorizeError> for Decision {
    fn from(e: AuthorizeError) -> Self {
        Decision::deny(e.reason())
    }
}
