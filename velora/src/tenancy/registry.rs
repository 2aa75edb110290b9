//! Process-wide cache of tenant database connections.
//!
//! Each tenant database gets one small [`PgPool`], opened on first use and shared by every
//! request that targets that tenant until it is evicted or the process shuts down. The cache is
//! a [`moka::future::Cache`]; its `try_get_with` runs a single initialiser per key and hands
//! the result to every concurrent caller, so a name never ends up with two pools.

use std::{ops::Deref, sync::Arc};

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use url::Url;

use super::{error::TenantError, name::TenantDbName};
use crate::config::PoolSettings;

/// An open connection target for one tenant database.
#[derive(Debug)]
pub struct TenantConnection {
    db_name: TenantDbName,
    pool: PgPool,
}

impl TenantConnection {
    pub fn db_name(&self) -> &TenantDbName {
        &self.db_name
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Deref for TenantConnection {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

pub type TenantHandle = Arc<TenantConnection>;

#[derive(Clone, Debug)]
pub struct TenantRegistry {
    base_url: Url,
    pool_settings: PoolSettings,
    handles: Cache<TenantDbName, TenantHandle>,
}

impl TenantRegistry {
    /// `base_url` is any connection URL for the server hosting the tenant databases; its path
    /// is replaced with the tenant database name on every open.
    pub fn new(base_url: Url, pool_settings: PoolSettings) -> Self {
        Self {
            base_url,
            pool_settings,
            // No capacity bound and no idle expiry: handles live until evicted.
            handles: Cache::builder().build(),
        }
    }

    /// Connection URL for a tenant database.
    pub fn connection_url(&self, db_name: &TenantDbName) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("/{db_name}"));
        url
    }

    /// Return the cached handle for `db_name`, opening it if this is the first request.
    ///
    /// Concurrent callers for an uncached name share one open attempt. A failed open is not
    /// cached, so the next call tries again.
    #[instrument(skip(self, db_name), fields(db_name = %db_name), err)]
    pub async fn get(&self, db_name: &TenantDbName) -> Result<TenantHandle, TenantError> {
        self.handles
            .try_get_with(db_name.clone(), self.open(db_name))
            .await
            .map_err(|source| TenantError::Connect {
                db_name: db_name.to_string(),
                source,
            })
    }

    async fn open(&self, db_name: &TenantDbName) -> Result<TenantHandle, sqlx::Error> {
        let url = self.connection_url(db_name);
        let pool = self.pool_settings.options().connect(url.as_str()).await?;
        info!(db_name = %db_name, "Opened tenant connection");
        Ok(Arc::new(TenantConnection {
            db_name: db_name.clone(),
            pool,
        }))
    }

    pub fn contains(&self, db_name: &TenantDbName) -> bool {
        self.handles.contains_key(db_name)
    }

    /// Close and forget the handle for `db_name`. Returns whether one was cached.
    #[instrument(skip(self, db_name), fields(db_name = %db_name))]
    pub async fn evict(&self, db_name: &TenantDbName) -> bool {
        match self.handles.remove(db_name).await {
            Some(handle) => {
                handle.pool.close().await;
                debug!("Evicted tenant connection");
                true
            }
            None => false,
        }
    }

    /// Close every cached handle. Called on shutdown.
    pub async fn close_all(&self) {
        let handles: Vec<TenantHandle> = self.handles.iter().map(|(_, handle)| handle).collect();
        self.handles.invalidate_all();
        let count = handles.len();
        futures::future::join_all(handles.iter().map(|handle| handle.pool.close())).await;
        info!(count, "Closed tenant connections");
    }

    /// Number of cached handles.
    pub fn len(&self) -> u64 {
        self.handles.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
