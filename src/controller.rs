//! Debounced query controller.
//!
//! Owns the transient listing input (search text, filter selections, sort) for
//! one collection snapshot. Input changes arm a timer; only when it fires does
//! the filter/sort/page pipeline re-run, so a burst of keystrokes yields a
//! single recomputation from the last value. Page changes apply immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::Config;
use crate::error::{DarshanError, Result};
use crate::query::{
    CollectionQuery, FilterSpec, Page, PaginationState, SortSpec, filter, paginate, sort_in_place,
};
use crate::sync::RemoteCollectionState;
use crate::types::Record;

/// Delay between the last input change and the recomputation
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Whether a recomputation is waiting on the debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    #[default]
    Idle,
    PendingPropagate,
}

/// Raw listing input as entered by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryInput {
    pub search: String,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub kind: Option<String>,
    pub featured: Option<bool>,
    pub is_active: Option<bool>,
    pub sort: SortSpec,
}

/// A single edit to the listing input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputChange {
    Search(String),
    Category(Option<String>),
    Tag(Option<String>),
    Author(Option<String>),
    Kind(Option<String>),
    Featured(Option<bool>),
    Active(Option<bool>),
    Sort(SortSpec),
    /// Drop every filter and the search text, keeping the sort
    Clear,
}

impl QueryInput {
    pub fn apply(&mut self, change: InputChange) {
        match change {
            InputChange::Search(text) => self.search = text,
            InputChange::Category(category) => self.category = category,
            InputChange::Tag(tag) => self.tag = tag,
            InputChange::Author(author) => self.author = author,
            InputChange::Kind(kind) => self.kind = kind,
            InputChange::Featured(featured) => self.featured = featured,
            InputChange::Active(active) => self.is_active = active,
            InputChange::Sort(sort) => self.sort = sort,
            InputChange::Clear => {
                *self = QueryInput {
                    sort: self.sort,
                    ..Default::default()
                }
            }
        }
    }

    pub fn filter_spec(&self) -> FilterSpec {
        let search = self.search.trim();
        FilterSpec {
            search: (!search.is_empty()).then(|| search.to_string()),
            category: self.category.clone(),
            tag: self.tag.clone(),
            author: self.author.clone(),
            kind: self.kind.clone(),
            featured: self.featured,
            is_active: self.is_active,
        }
    }
}

/// The page currently shown, with the query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryView<T> {
    pub page: Page<T>,
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub phase: QueryPhase,
    /// Incremented on every recomputation
    pub generation: u64,
}

/// Construction options for a [`QueryController`].
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub debounce: Duration,
    pub page_size: u32,
    pub sort: SortSpec,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            page_size: crate::query::DEFAULT_PAGE_SIZE,
            sort: SortSpec::default(),
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: Duration::from_millis(config.listing.debounce_ms),
            page_size: config.listing.page_size,
            ..Default::default()
        }
    }
}

enum Command<T> {
    Input(InputChange),
    SetPage(u32),
    ReplaceItems(Vec<T>),
}

/// Debounces listing input for one collection snapshot.
///
/// Must be created inside a tokio runtime. Dropping the controller has the
/// same effect as [`dispose`](Self::dispose).
pub struct QueryController<T: Record> {
    commands: mpsc::UnboundedSender<Command<T>>,
    view: watch::Receiver<QueryView<T>>,
    disposed: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Record> QueryController<T> {
    pub fn new(items: Vec<T>, options: ControllerOptions) -> Result<Self> {
        if options.page_size == 0 {
            return Err(DarshanError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }

        let query = CollectionQuery::default()
            .sort(options.sort)
            .page_size(options.page_size);
        let initial = QueryView {
            page: compute(&items, &query)?,
            filter: query.filter.clone(),
            sort: query.sort,
            phase: QueryPhase::Idle,
            generation: 0,
        };
        let (view_tx, view) = watch::channel(initial);
        let (commands, rx) = mpsc::unbounded_channel();
        let disposed = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            items,
            input: QueryInput {
                sort: options.sort,
                ..Default::default()
            },
            query,
            debounce: options.debounce,
            view: view_tx,
            disposed: Arc::clone(&disposed),
        };
        let handle = tokio::spawn(worker.run(rx));

        Ok(Self {
            commands,
            view,
            disposed,
            tasks: Mutex::new(vec![handle]),
        })
    }

    /// Record an input change and (re)arm the debounce timer.
    pub fn input(&self, change: InputChange) {
        self.send(Command::Input(change));
    }

    /// Show page `page` of the current result, clamped to the valid range.
    pub fn set_page(&self, page: u32) {
        self.send(Command::SetPage(page));
    }

    /// Swap in a new collection snapshot, keeping the current page if it still exists.
    pub fn replace_items(&self, items: Vec<T>) {
        self.send(Command::ReplaceItems(items));
    }

    /// Follow a sync controller's state, feeding each applied response in as the snapshot.
    pub fn attach(&self, mut remote: watch::Receiver<RemoteCollectionState<T>>) {
        let commands = self.commands.clone();
        let handle = tokio::spawn(async move {
            let mut last_seq = None;
            loop {
                let snapshot = {
                    let state = remote.borrow_and_update();
                    (last_seq != Some(state.applied_seq))
                        .then(|| (state.applied_seq, state.items.clone()))
                };
                if let Some((seq, items)) = snapshot {
                    last_seq = Some(seq);
                    if commands.send(Command::ReplaceItems(items)).is_err() {
                        break;
                    }
                }
                if remote.changed().await.is_err() {
                    break;
                }
            }
        });
        self.tasks.lock().push(handle);
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryView<T>> {
        self.view.clone()
    }

    /// Copy of the most recently published view
    pub fn view(&self) -> QueryView<T> {
        self.view.borrow().clone()
    }

    /// Cancel the pending timer and stop publishing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }

    fn send(&self, command: Command<T>) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        // The worker only stops after dispose
        let _ = self.commands.send(command);
    }
}

impl<T: Record> Drop for QueryController<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Filter and sort `items`, then slice the requested page clamped into range.
fn compute<T: Record>(items: &[T], query: &CollectionQuery) -> Result<Page<T>> {
    let mut matched = filter(items, &query.filter);
    sort_in_place(&mut matched, query.sort);
    let bounds = PaginationState::new(1, query.page_size, matched.len() as u64)?;
    paginate(&matched, bounds.clamp_page(query.page), query.page_size)
}

struct Worker<T> {
    items: Vec<T>,
    input: QueryInput,
    query: CollectionQuery,
    debounce: Duration,
    view: watch::Sender<QueryView<T>>,
    disposed: Arc<AtomicBool>,
}

impl<T: Record> Worker<T> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command<T>>) {
        let timer = tokio::time::sleep(self.debounce);
        tokio::pin!(timer);
        let mut armed = false;

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    match command {
                        Command::Input(change) => {
                            self.input.apply(change);
                            timer.as_mut().reset(Instant::now() + self.debounce);
                            armed = true;
                            self.view.send_if_modified(|view| {
                                let changed = view.phase != QueryPhase::PendingPropagate;
                                view.phase = QueryPhase::PendingPropagate;
                                changed
                            });
                        }
                        Command::SetPage(page) => {
                            self.query.page = page;
                            self.publish(armed);
                        }
                        Command::ReplaceItems(items) => {
                            self.items = items;
                            self.publish(armed);
                        }
                    }
                }
                () = &mut timer, if armed => {
                    armed = false;
                    self.query.filter = self.input.filter_spec();
                    self.query.sort = self.input.sort;
                    self.query.page = 1;
                    tracing::debug!(filter = ?self.query.filter, sort = %self.query.sort, "propagating query input");
                    self.publish(false);
                }
            }
        }
    }

    fn publish(&mut self, pending: bool) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let page = match compute(&self.items, &self.query) {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(error = %err, "query recomputation failed");
                return;
            }
        };
        self.query.page = page.pagination.current_page;
        self.view.send_modify(|view| {
            view.page = page;
            view.filter = self.query.filter.clone();
            view.sort = self.query.sort;
            view.phase = if pending {
                QueryPhase::PendingPropagate
            } else {
                QueryPhase::Idle
            };
            view.generation += 1;
        });
    }
}
