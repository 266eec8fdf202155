/*
 * Responsibility
 * - 認可判定の失敗理由 (AuthorizeError) の定義
 * - Decision (拒否理由つき) への変換
 * - RepoError を統一的に変換 (store の詳細は外に出さない)
 */
use thiserror::Error;

use crate::repos::error::RepoError;

/// Reason returned for any client-caused failure.
pub const REASON_TOTEM_INVALID: &str = "Totem invalid or not found";
/// Reason returned for every infrastructure or unexpected failure.
pub const REASON_INTERNAL: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AuthorizeError {
    #[error("totem invalid or not found")]
    InvalidToken,
    #[error("database error")]
    Database(#[source] RepoError),
    #[error("malformed request descriptor")]
    MalformedRequest,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthorizeError {
    /// The coarse reason a caller is allowed to see.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthorizeError::InvalidToken => REASON_TOTEM_INVALID,
            AuthorizeError::Database(_)
            | AuthorizeError::MalformedRequest
            | AuthorizeError::Internal(_) => REASON_INTERNAL,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthorizeError::InvalidToken)
    }
}

impl From<RepoError> for AuthorizeError {
    fn from(e: RepoError) -> Self {
        AuthorizeError::Database(e)
    }
}
