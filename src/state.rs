/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: authorizer: Arc<Authorizer> (secret か totem store を内包)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::Authorizer;

#[derive(Clone, Debug)]
pub struct AppState {
    pub authorizer: Arc<Authorizer>,
}

impl AppState {
    pub fn new(authorizer: Arc<Authorizer>) -> Self {
        Self { authorizer }
    }
}
