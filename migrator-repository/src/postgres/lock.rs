//! Per-configuration run lock.
use migrator_shared::types::ConfigId;
use sqlx::Postgres;
use sqlx::pool::PoolConnection;
use tracing::debug;

use crate::RepositoryError;

/// Session-level advisory lock held for the duration of a migration run.
///
/// The lock lives on a dedicated connection. That connection is closed
/// instead of being returned to the pool when the guard is dropped, so a
/// run that dies without calling [`ConfigurationLock::release`] still frees
/// the lock.
pub struct ConfigurationLock {
    conn: PoolConnection<Postgres>,
    config_id: ConfigId,
}

impl ConfigurationLock {
    /// Takes the lock for `config_id` without waiting.
    ///
    /// # Returns
    ///
    /// * `Ok(ConfigurationLock)` - If the lock was free
    /// * `Err(RepositoryError::Locked)` - If another session holds it
    pub async fn try_acquire(pool: &sqlx::PgPool, config_id: ConfigId) -> Result<Self, RepositoryError> {
        let mut conn = pool.acquire().await?;
        conn.close_on_drop();

        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(config_id)
            .fetch_one(&mut *conn)
            .await?;
        if !acquired {
            return Err(RepositoryError::Locked(config_id));
        }

        debug!(config_id, "configuration lock acquired");
        Ok(Self { conn, config_id })
    }

    pub fn config_id(&self) -> ConfigId {
        self.config_id
    }

    pub async fn release(mut self) -> Result<(), RepositoryError> {
        sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
            .bind(self.config_id)
            .fetch_one(&mut *self.conn)
            .await?;
        debug!(config_id = self.config_id, "configuration lock released");
        Ok(())
    }
}
