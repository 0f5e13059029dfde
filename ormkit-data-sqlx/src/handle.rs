use std::sync::Arc;

use ormkit_data::{
    Callbacks, ConnectionDescriptor, DataError, DatabaseConfig, Plugin, ValidationPlugin,
};
use sqlx::pool::PoolOptions;
use sqlx::Pool;

use crate::backend::Backend;
use crate::decode::ErrorDecoder;
use crate::error::SqlxResultExt;

/// An open connection pool with its descriptor, error decoder and write
/// callbacks.
///
/// Cloning is cheap; clones share the pool and the callback registry.
///
/// # Example
///
/// ```ignore
/// let handle = Handle::<Sqlite>::open("sqlite:///var/lib/app/app.db").await?;
/// let post = ops::save(&handle, Post::new("hello")).await?;
/// ```
pub struct Handle<DB: Backend> {
    pool: Pool<DB>,
    descriptor: Arc<ConnectionDescriptor>,
    decoder: &'static dyn ErrorDecoder,
    callbacks: Callbacks,
    returning: bool,
}

impl<DB: Backend> Handle<DB> {
    /// Open a handle with default pool settings.
    pub async fn open(url: &str) -> Result<Self, DataError> {
        Self::open_with(&DatabaseConfig::new(url)).await
    }

    /// Parse the configured URL, connect the pool and install the
    /// validation plugin.
    pub async fn open_with(config: &DatabaseConfig) -> Result<Self, DataError> {
        let descriptor = ConnectionDescriptor::parse(&config.url)?;
        if descriptor.kind() != DB::KIND {
            return Err(DataError::BackendMismatch {
                expected: DB::KIND.to_string(),
                found: descriptor.kind().to_string(),
            });
        }

        let connect = DB::connect_options(&descriptor)?;
        let pool_options = PoolOptions::<DB>::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout());
        let pool_options = DB::tune_pool(&descriptor, pool_options);

        let decoder = DB::decoder();
        let pool = pool_options
            .connect_with(connect)
            .await
            .classified(decoder)?;

        let handle = Self {
            pool,
            returning: DB::returning(&descriptor),
            descriptor: Arc::new(descriptor),
            decoder,
            callbacks: Callbacks::new(),
        };
        handle.use_plugin(ValidationPlugin::new())?;
        tracing::info!(
            backend = %DB::KIND,
            url = %handle.descriptor.redacted(),
            max_connections = config.max_connections,
            "Database handle opened"
        );
        Ok(handle)
    }

    /// Install a plugin's callbacks on this handle.
    pub fn use_plugin<P: Plugin>(&self, plugin: P) -> Result<(), DataError> {
        plugin.initialize(&self.callbacks)?;
        tracing::debug!(plugin = plugin.name(), "Plugin installed");
        Ok(())
    }

    /// Close every pooled connection. Clones of this handle are closed too.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(backend = %DB::KIND, url = %self.descriptor.redacted(), "Database handle closed");
    }

    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn decoder(&self) -> &'static dyn ErrorDecoder {
        self.decoder
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub(crate) fn returning(&self) -> bool {
        self.returning
    }
}

impl<DB: Backend> Clone for Handle<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            descriptor: self.descriptor.clone(),
            decoder: self.decoder,
            callbacks: self.callbacks.clone(),
            returning: self.returning,
        }
    }
}

impl<DB: Backend> std::fmt::Debug for Handle<DB> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("backend", &DB::KIND)
            .field("descriptor", &self.descriptor)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
