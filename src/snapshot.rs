//! Cached view of a remote collection.
//!
//! A [`Snapshot`] is filled lazily on the first lookup and reused until it is
//! invalidated. Mutations go through [`Snapshot::mutate`], which invalidates
//! the cache once the remote call has returned, whatever its outcome: a
//! failed or timed-out call may still have landed on the store.

use crate::remote::RemoteError;
use std::future::Future;
use tracing::debug;

#[derive(Debug)]
pub struct Snapshot<T> {
    label: &'static str,
    entries: Option<Vec<T>>,
}

impl<T> Snapshot<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: None,
        }
    }

    /// Return the cached entries, loading them first when the cache is empty
    /// or `force_refresh` is set.
    pub async fn get<F, Fut>(&mut self, force_refresh: bool, load: F) -> Result<&[T], RemoteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, RemoteError>>,
    {
        if force_refresh || self.entries.is_none() {
            debug!(collection = self.label, force_refresh, "Refreshing snapshot");
            // Drop the stale view before loading so a failed load never leaves it behind
            self.entries = None;
            let loaded = load().await?;
            self.entries = Some(loaded);
        }
        Ok(self.entries.as_deref().unwrap_or_default())
    }

    pub fn invalidate(&mut self) {
        if self.entries.take().is_some() {
            debug!(collection = self.label, "Snapshot invalidated");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.entries.is_some()
    }

    /// Run a remote mutation and invalidate the snapshot afterwards.
    pub async fn mutate<R, Fut>(&mut self, op: Fut) -> Result<R, RemoteError>
    where
        Fut: Future<Output = Result<R, RemoteError>>,
    {
        let result = op.await;
        self.invalidate();
        result
    }
}
