//! Remote sync controller.
//!
//! Keeps one entity collection's paged state in step with a [`RemoteApi`].
//! List requests are sequenced so that only the most recently issued one may
//! replace the visible state; superseded responses are counted and dropped.
//! Mutations go to the server first and are followed by a re-fetch of the
//! current page, so local state only ever reflects what the server returned.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::{DarshanError, ErrorKind, Result};
use crate::query::paginate::total_pages;
use crate::query::{Page, PaginationState};
use crate::remote::{ListParams, Paginated, RemoteApi};
use crate::types::{ItemId, Resource};

/// Observable state of a remote collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteCollectionState<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u32,
    pub page: u32,
    pub page_size: u32,
    pub loading: bool,
    /// Classified message for the last failed call, if any
    pub error: Option<String>,
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
    /// Sequence number of the list response currently shown
    pub applied_seq: u64,
    /// Number of list responses dropped because a newer request was issued
    pub discarded: u64,
}

impl<T> Default for RemoteCollectionState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            total_pages: 0,
            page: 1,
            page_size: ListParams::default().page_size,
            loading: false,
            error: None,
            error_kind: None,
            applied_seq: 0,
            discarded: 0,
        }
    }
}

impl<T: Clone> RemoteCollectionState<T> {
    /// The shown items as a page with pagination metadata
    pub fn to_page(&self) -> Result<Page<T>> {
        Ok(Page {
            items: self.items.clone(),
            pagination: PaginationState::new(self.page, self.page_size, self.total_count)?,
        })
    }
}

/// What happened to a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    /// The response replaced the collection state
    Applied { count: usize },
    /// The request failed and the error was recorded
    Failed(ErrorKind),
    /// A newer request was issued first, or the controller was disposed
    Discarded,
}

impl ListOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ListOutcome::Applied { .. })
    }
}

/// Sole writer of one collection's [`RemoteCollectionState`].
pub struct SyncController<T: Resource, A: RemoteApi<T>> {
    api: A,
    seq: AtomicU64,
    state: watch::Sender<RemoteCollectionState<T>>,
    params: Mutex<ListParams>,
    item_locks: DashMap<ItemId, Arc<tokio::sync::Mutex<()>>>,
    disposed: AtomicBool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource, A: RemoteApi<T>> SyncController<T, A> {
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(RemoteCollectionState::default());
        Self {
            api,
            seq: AtomicU64::new(0),
            state,
            params: Mutex::new(ListParams::default()),
            item_locks: DashMap::new(),
            disposed: AtomicBool::new(false),
            _marker: PhantomData,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn subscribe(&self) -> watch::Receiver<RemoteCollectionState<T>> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn state(&self) -> RemoteCollectionState<T> {
        self.state.borrow().clone()
    }

    /// Parameters of the most recently issued list request
    pub fn params(&self) -> ListParams {
        self.params.lock().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Fetch a page and make it the visible state unless superseded.
    pub async fn list(&self, params: ListParams) -> ListOutcome {
        if self.is_disposed() {
            return ListOutcome::Discarded;
        }

        // Stored params always belong to the latest sequence number
        let seq = {
            let mut current = self.params.lock();
            *current = params.clone();
            self.seq.fetch_add(1, Ordering::SeqCst) + 1
        };
        self.state.send_modify(|s| s.loading = true);

        let result = self.api.list(&params).await;
        self.apply(seq, &params, result)
    }

    /// Re-fetch the current page.
    pub async fn refresh(&self) -> ListOutcome {
        let params = self.params();
        self.list(params).await
    }

    fn apply(&self, seq: u64, params: &ListParams, result: Result<Paginated<T>>) -> ListOutcome {
        let mut outcome = ListOutcome::Discarded;
        self.state.send_if_modified(|s| {
            if self.is_disposed() {
                return false;
            }
            let latest = self.seq.load(Ordering::SeqCst);
            if seq != latest {
                tracing::debug!(
                    collection = T::NAME,
                    seq,
                    latest,
                    "discarding superseded list response"
                );
                s.discarded += 1;
                return true;
            }

            s.loading = false;
            match &result {
                Ok(page) => {
                    s.items = page.results.clone();
                    s.total_count = page.count;
                    s.total_pages = total_pages(page.count, params.page_size);
                    s.page = params.page.max(1);
                    s.page_size = params.page_size;
                    s.error = None;
                    s.error_kind = None;
                    s.applied_seq = seq;
                    tracing::debug!(
                        collection = T::NAME,
                        seq,
                        count = page.count,
                        page = s.page,
                        "applied list response"
                    );
                    outcome = ListOutcome::Applied {
                        count: page.results.len(),
                    };
                }
                Err(err) => {
                    tracing::warn!(collection = T::NAME, seq, error = %err, "list request failed");
                    s.error = Some(err.user_message());
                    s.error_kind = Some(err.kind());
                    outcome = ListOutcome::Failed(err.kind());
                }
            }
            true
        });
        outcome
    }

    fn record_error(&self, err: &DarshanError) {
        if self.is_disposed() {
            return;
        }
        self.state.send_modify(|s| {
            s.error = Some(err.user_message());
            s.error_kind = Some(err.kind());
        });
    }

    /// Re-fetch after a successful mutation, stepping back if the current
    /// page no longer exists.
    async fn resync(&self) {
        let mut params = self.params();
        tracing::debug!(collection = T::NAME, page = params.page, "re-syncing after mutation");
        loop {
            match self.list(params.clone()).await {
                ListOutcome::Applied { .. } => break,
                // Paginating backends may answer a page past the end with 404
                ListOutcome::Failed(ErrorKind::NotFound) if params.page > 1 => {
                    let previous = params.page - 1;
                    tracing::debug!(
                        collection = T::NAME,
                        page = previous,
                        "page gone, stepping back"
                    );
                    params = params.page(previous);
                }
                _ => return,
            }
        }
        let state = self.state();
        if state.items.is_empty() && state.total_pages > 0 && params.page > state.total_pages {
            let last = state.total_pages;
            self.list(params.page(last)).await;
        }
    }

    fn item_lock(&self, id: ItemId) -> Arc<tokio::sync::Mutex<()>> {
        self.item_locks.entry(id).or_default().clone()
    }

    fn release_item_lock(&self, id: ItemId) {
        self.item_locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Create a record on the server, then re-fetch the current page.
    pub async fn create(&self, draft: &T::Draft) -> Result<T> {
        match self.api.create(draft).await {
            Ok(created) => {
                tracing::debug!(collection = T::NAME, id = %created.id(), "created");
                self.resync().await;
                Ok(created)
            }
            Err(err) => {
                tracing::warn!(collection = T::NAME, error = %err, "create failed");
                self.record_error(&err);
                Err(err)
            }
        }
    }

    /// Update a record on the server, then re-fetch the current page.
    ///
    /// Updates and deletes for the same id run one at a time in call order.
    pub async fn update(&self, id: ItemId, patch: &T::Patch) -> Result<T> {
        let lock = self.item_lock(id);
        let result = {
            let _guard = lock.lock().await;
            self.api.update(id, patch).await
        };
        drop(lock);
        self.release_item_lock(id);

        match result {
            Ok(updated) => {
                tracing::debug!(collection = T::NAME, %id, "updated");
                self.resync().await;
                Ok(updated)
            }
            Err(err) => {
                tracing::warn!(collection = T::NAME, %id, error = %err, "update failed");
                self.record_error(&err);
                Err(err)
            }
        }
    }

    /// Delete a record on the server, then re-fetch the current page.
    pub async fn delete(&self, id: ItemId) -> Result<()> {
        let lock = self.item_lock(id);
        let result = {
            let _guard = lock.lock().await;
            self.api.delete(id).await
        };
        drop(lock);
        self.release_item_lock(id);

        match result {
            Ok(()) => {
                tracing::debug!(collection = T::NAME, %id, "deleted");
                self.resync().await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(collection = T::NAME, %id, error = %err, "delete failed");
                self.record_error(&err);
                Err(err)
            }
        }
    }

    /// Stop publishing and reset the state; in-flight responses are ignored.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.item_locks.clear();
        self.state.send_replace(RemoteCollectionState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset;
    use crate::query::SortKey;
    use crate::remote::MemoryApi;
    use crate::types::{PujaService, PujaServiceDraft, PujaServicePatch};

    fn controller() -> SyncController<PujaService, MemoryApi<PujaService>> {
        SyncController::new(MemoryApi::new(dataset::puja_services()))
    }

    fn draft(title: &str) -> PujaServiceDraft {
        PujaServiceDraft {
            title: title.to_string(),
            description: String::new(),
            category: ItemId(1),
            service_type: "home".to_string(),
            price: 2100.0,
            duration: 90,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_list_applies_page() {
        let sync = controller();
        let outcome = sync.list(ListParams::default().page_size(3)).await;
        assert_eq!(outcome, ListOutcome::Applied { count: 3 });

        let state = sync.state();
        assert_eq!(state.total_count, 8);
        assert_eq!(state.total_pages, 3);
        assert_eq!(state.page, 1);
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.applied_seq, 1);
    }

    #[tokio::test]
    async fn test_failed_list_keeps_items() {
        let sync = controller();
        sync.list(ListParams::default()).await;
        let before = sync.state().items;

        let outcome = sync.list(ListParams::default().page_size(0)).await;
        assert_eq!(outcome, ListOutcome::Failed(ErrorKind::Validation));

        let state = sync.state();
        assert_eq!(state.items, before);
        assert!(state.error.is_some());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_create_resyncs_with_server_entity() {
        let sync = controller();
        sync.list(ListParams::default().ordering(SortKey::Newest)).await;

        let created = sync.create(&draft("Mundan Sanskar")).await.unwrap();
        let state = sync.state();
        assert_eq!(state.total_count, 9);
        assert_eq!(state.items[0], created);
    }

    #[tokio::test]
    async fn test_failed_create_records_error_without_local_change() {
        let sync = controller();
        sync.list(ListParams::default()).await;
        let before = sync.state();

        let err = sync.create(&draft("")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let after = sync.state();
        assert_eq!(after.items, before.items);
        assert_eq!(after.total_count, before.total_count);
        assert_eq!(after.error.as_deref(), Some("title: This field may not be blank."));
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let sync = controller();
        sync.list(ListParams::default()).await;
        let before = sync.state().items;

        let err = sync
            .update(ItemId(404), &PujaServicePatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(sync.state().items, before);
        assert_eq!(sync.state().error_kind, Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_successful_call_clears_error() {
        let sync = controller();
        sync.delete(ItemId(404)).await.unwrap_err();
        assert!(sync.state().error.is_some());

        sync.refresh().await;
        assert!(sync.state().error.is_none());
    }

    #[tokio::test]
    async fn test_delete_last_item_on_last_page_steps_back() {
        let sync = controller();
        // 8 services at 7 per page: page 2 holds one item
        sync.list(
            ListParams::default()
                .ordering(SortKey::Oldest)
                .page_size(7)
                .page(2),
        )
        .await;
        let last = sync.state().items[0].id;

        sync.delete(last).await.unwrap();
        let state = sync.state();
        assert_eq!(state.page, 1);
        assert_eq!(state.total_count, 7);
        assert_eq!(state.items.len(), 7);
    }

    #[tokio::test]
    async fn test_item_locks_are_released() {
        let sync = controller();
        let patch = PujaServicePatch {
            duration: Some(100),
            ..Default::default()
        };
        sync.update(ItemId(1), &patch).await.unwrap();
        assert!(sync.item_locks.is_empty());
    }

    #[tokio::test]
    async fn test_dispose_resets_and_ignores_lists() {
        let sync = controller();
        sync.list(ListParams::default()).await;
        sync.dispose();

        assert_eq!(sync.state(), RemoteCollectionState::default());
        assert_eq!(sync.list(ListParams::default()).await, ListOutcome::Discarded);
        assert!(sync.state().items.is_empty());
    }
}
