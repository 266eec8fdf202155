/*
 * Responsibility
 * - totems テーブル向け SQLx 操作 (token_access → id の参照のみ)
 * - 呼び出しごとに pool から接続を取得してクエリを 1 回だけ実行する
 * - DB エラーは RepoError に変換して返す
 */
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::DbConfig;
use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TotemRow {
    pub id: String,
    pub token_access: String,
}

/// Read-only lookup of issued totems.
///
/// Rows come back in whatever order the store returns them.
#[async_trait]
pub trait TotemStore: Send + Sync + 'static {
    async fn find_by_token_access(&self, token: &str) -> RepoResult<Vec<TotemRow>>;
}

#[derive(Clone, Debug)]
pub struct PgTotemStore {
    pool: PgPool,
}

impl PgTotemStore {
    /// Build a lazily connecting pool; nothing touches the network until the first lookup.
    pub fn connect(config: &DbConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(config.connect_options.clone());

        Self { pool }
    }
}

#[async_trait]
impl TotemStore for PgTotemStore {
    async fn find_by_token_access(&self, token: &str) -> RepoResult<Vec<TotemRow>> {
        let mut conn = self.pool.acquire().await.map_err(RepoError::Connection)?;

        let rows = sqlx::query_as::<_, TotemRow>(
            r#"
            SELECT id::text AS id, token_access
            FROM totems
            WHERE token_access = $1
            "#,
        )
        .bind(token)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }
}
