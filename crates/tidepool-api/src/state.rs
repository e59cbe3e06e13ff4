use std::sync::Arc;
use std::time::Duration;

use tidepool_db::{Database, StoreCall, StoreError};
use tracing::{error, warn};

use crate::error::ApiError;
use crate::uploads::UploadTargetIssuer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Upper bound for a single store call, including time spent queued.
    pub store_timeout: Duration,
    pub uploads: Box<dyn UploadTargetIssuer>,
}

impl AppStateInner {
    /// Run a blocking store call off the async runtime, bounded by `store_timeout`.
    ///
    /// On expiry the call is cancelled and then awaited, so the reply always
    /// matches what reached the database: a mutation that committed before the
    /// cancel landed is reported as a success, anything else as `Timeout`.
    pub async fn store<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> tidepool_db::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let call = StoreCall::new();
        let db = self.db.for_call(&call);
        let mut task = tokio::task::spawn_blocking(move || f(&db));

        let joined = match tokio::time::timeout(self.store_timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!("Store call exceeded {:?}, cancelling", self.store_timeout);
                call.cancel();
                task.await
            }
        };

        match joined {
            Ok(result) => result.map_err(ApiError::from),
            Err(e) => {
                error!("spawn_blocking join error: {}", e);
                Err(StoreError::Unavailable("store task failed".into()).into())
            }
        }
    }
}
