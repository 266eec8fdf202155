/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - 接続取得の失敗とクエリの失敗を区別する (ログ用、呼び出し側には同じ扱い)
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db connection error")]
    Connection(#[source] sqlx::Error),
    #[error("db error")]
    Db(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
