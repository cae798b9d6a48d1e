//! Server-driven list view: query state, debounced search, and the epoch check
//! that keeps late responses from overwriting newer ones.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

use crate::{
    debounce::Debouncer,
    epoch::{Epoch, EpochGuard},
    error::FetchError,
    query::{QueryAction, QueryState, DEFAULT_PAGE_SIZE},
    settings::DashboardSettings,
    source::{PageSource, ResultPage},
};

const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub page_size: u32,
    pub search_debounce: Duration,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

impl From<&DashboardSettings> for ListOptions {
    fn from(settings: &DashboardSettings) -> Self {
        Self {
            page_size: settings.page_size,
            search_debounce: settings.search_debounce(),
        }
    }
}

/// What happened to a fetch once its response came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch was issued meanwhile; the response was dropped.
    Stale,
    Failed(FetchError),
    /// The action did not change the query, so nothing was requested.
    Unchanged,
    Closed,
}

/// Notifications for the toast layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// Carries the retry affordance: when `retryable`, `ListController::retry`
    /// re-issues `query`.
    FetchFailed {
        message: String,
        query: QueryState,
        retryable: bool,
    },
    MutationSucceeded { label: String },
    MutationFailed { label: String, message: String },
}

/// Everything the table renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView<T> {
    pub query: QueryState,
    pub search_input: String,
    pub rows: Vec<T>,
    pub total_count: u64,
    pub loading: bool,
    pub error: Option<FetchError>,
}

impl<T> ListView<T> {
    pub fn range_label(&self) -> String {
        self.query.range_label(self.total_count)
    }

    pub fn page_count(&self) -> u64 {
        self.query.page_count(self.total_count)
    }

    pub fn can_previous_page(&self) -> bool {
        self.query.can_previous_page()
    }

    pub fn can_next_page(&self) -> bool {
        self.query.can_next_page(self.total_count)
    }

    /// Rows paired with their "No" column value.
    pub fn numbered_rows(&self) -> impl Iterator<Item = (u64, &T)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| (self.query.row_number(index), row))
    }
}

struct ListState<T> {
    query: QueryState,
    search_input: String,
    page: ResultPage<T>,
    loading: bool,
    error: Option<FetchError>,
}

impl<T: Clone> ListState<T> {
    fn view(&self) -> ListView<T> {
        ListView {
            query: self.query.clone(),
            search_input: self.search_input.clone(),
            rows: self.page.rows.clone(),
            total_count: self.page.total_count,
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

pub struct ListController<T> {
    source: Arc<dyn PageSource<T>>,
    epochs: EpochGuard,
    state: Mutex<ListState<T>>,
    view: watch::Sender<ListView<T>>,
    events: broadcast::Sender<ListEvent>,
    search: Debouncer<String>,
    closed: AtomicBool,
}

impl<T> ListController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(source: Arc<dyn PageSource<T>>, options: ListOptions) -> Arc<Self> {
        let state = ListState {
            query: QueryState::with_page_size(options.page_size),
            search_input: String::new(),
            page: ResultPage::empty(),
            loading: false,
            error: None,
        };
        let (view, _) = watch::channel(state.view());
        let (events, _) = broadcast::channel(64);

        Arc::new_cyclic(|controller: &Weak<Self>| {
            let controller = controller.clone();
            let search = Debouncer::new(options.search_debounce, move |text: String| {
                let controller = controller.clone();
                async move {
                    if let Some(controller) = controller.upgrade() {
                        controller.set_search_text(text).await;
                    }
                }
            });
            Self {
                source,
                epochs: EpochGuard::new(),
                state: Mutex::new(state),
                view,
                events,
                search,
                closed: AtomicBool::new(false),
            }
        })
    }

    pub async fn snapshot(&self) -> ListView<T> {
        self.state.lock().await.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListView<T>> {
        self.view.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ListEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Raw keystroke input. The query only changes once the debounce window
    /// passes without further input.
    pub async fn type_search(&self, text: impl Into<String>) {
        let text = text.into();
        if self.is_closed() {
            return;
        }
        {
            let mut state = self.state.lock().await;
            state.search_input = text.clone();
            self.publish(&state);
        }
        self.search.call(text);
    }

    pub async fn clear_search(&self) {
        self.type_search(String::new()).await;
    }

    /// Applies an already debounced search value.
    pub async fn set_search_text(&self, text: impl Into<String>) -> FetchOutcome {
        self.dispatch(QueryAction::SetSearchText(text.into())).await
    }

    pub async fn set_sort(&self, field: impl Into<String>) -> FetchOutcome {
        self.dispatch(QueryAction::ToggleSort(field.into())).await
    }

    pub async fn set_page_index(&self, page_index: u32) -> FetchOutcome {
        self.dispatch(QueryAction::SetPageIndex(page_index)).await
    }

    pub async fn set_page_size(&self, page_size: u32) -> FetchOutcome {
        if page_size == 0 {
            warn!("ignoring zero page size");
        }
        self.dispatch(QueryAction::SetPageSize(page_size)).await
    }

    pub async fn first_page(&self) -> FetchOutcome {
        self.set_page_index(0).await
    }

    pub async fn previous_page(&self) -> FetchOutcome {
        let index = self.state.lock().await.query.page_index.saturating_sub(1);
        self.set_page_index(index).await
    }

    pub async fn next_page(&self) -> FetchOutcome {
        let index = {
            let state = self.state.lock().await;
            if !state.query.can_next_page(state.page.total_count) {
                return FetchOutcome::Unchanged;
            }
            state.query.page_index + 1
        };
        self.set_page_index(index).await
    }

    pub async fn last_page(&self) -> FetchOutcome {
        let index = {
            let state = self.state.lock().await;
            state.query.last_page_index(state.page.total_count)
        };
        self.set_page_index(index).await
    }

    /// Re-fetches the current query. Used on mount and after mutations.
    pub async fn refresh(&self) -> FetchOutcome {
        let (epoch, query) = {
            let mut state = self.state.lock().await;
            let query = state.query.clone();
            match self.begin_fetch(&mut state, query.clone()) {
                Some(epoch) => (epoch, query),
                None => return FetchOutcome::Closed,
            }
        };
        self.complete_fetch(epoch, query).await
    }

    /// Retry action offered with `ListEvent::FetchFailed`.
    pub async fn retry(&self) -> FetchOutcome {
        debug!("retrying list fetch");
        self.refresh().await
    }

    /// Fetches `query` and makes it the query in effect.
    pub async fn fetch_page(&self, query: QueryState) -> FetchOutcome {
        let epoch = {
            let mut state = self.state.lock().await;
            match self.begin_fetch(&mut state, query.clone()) {
                Some(epoch) => epoch,
                None => return FetchOutcome::Closed,
            }
        };
        self.complete_fetch(epoch, query).await
    }

    /// Runs a create/update/delete call and refreshes the list when it succeeds.
    pub async fn apply_mutation<F>(&self, label: &str, mutation: F) -> Result<(), FetchError>
    where
        F: Future<Output = Result<(), FetchError>>,
    {
        match mutation.await {
            Ok(()) => {
                info!(label, "mutation succeeded; refreshing list");
                let _ = self.events.send(ListEvent::MutationSucceeded {
                    label: label.to_string(),
                });
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                warn!(label, error = %err, "mutation failed");
                let _ = self.events.send(ListEvent::MutationFailed {
                    label: label.to_string(),
                    message: err.user_message(),
                });
                Err(err)
            }
        }
    }

    /// Stops the view: pending search input is dropped and in-flight responses
    /// are discarded when they arrive.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.search.cancel();
        let mut state = self.state.lock().await;
        self.epochs.invalidate();
        state.loading = false;
        self.publish(&state);
        debug!("list view closed");
    }

    async fn dispatch(&self, action: QueryAction) -> FetchOutcome {
        let (epoch, query) = {
            let mut state = self.state.lock().await;
            let next = state.query.reduce(action);
            if next == state.query {
                return FetchOutcome::Unchanged;
            }
            match self.begin_fetch(&mut state, next.clone()) {
                Some(epoch) => (epoch, next),
                None => return FetchOutcome::Closed,
            }
        };
        self.complete_fetch(epoch, query).await
    }

    /// Query update and epoch issue happen under one lock so the epoch order
    /// always matches the order in which queries took effect.
    fn begin_fetch(&self, state: &mut ListState<T>, query: QueryState) -> Option<Epoch> {
        if self.is_closed() {
            return None;
        }
        let epoch = self.epochs.issue();
        state.query = query;
        state.loading = true;
        state.error = None;
        self.publish(state);
        debug!(
            epoch = epoch.value(),
            page_index = state.query.page_index,
            page_size = state.query.page_size,
            "issuing list fetch"
        );
        Some(epoch)
    }

    async fn complete_fetch(&self, epoch: Epoch, query: QueryState) -> FetchOutcome {
        let result = self.source.fetch_page(&query).await;

        let mut state = self.state.lock().await;
        if self.is_closed() {
            debug!(epoch = epoch.value(), "dropping response for closed list view");
            return FetchOutcome::Closed;
        }
        if !self.epochs.is_current(epoch) {
            debug!(
                epoch = epoch.value(),
                current = self.epochs.current().value(),
                "discarding stale list response"
            );
            return FetchOutcome::Stale;
        }

        state.loading = false;
        match result {
            Ok(page) => {
                state.page = page;
                state.error = None;
                self.publish(&state);
                FetchOutcome::Applied
            }
            Err(err) => {
                warn!(epoch = epoch.value(), error = %err, "list fetch failed");
                state.page = ResultPage::empty();
                state.error = Some(err.clone());
                self.publish(&state);
                let _ = self.events.send(ListEvent::FetchFailed {
                    message: err.user_message(),
                    query,
                    retryable: err.is_retryable(),
                });
                FetchOutcome::Failed(err)
            }
        }
    }

    fn publish(&self, state: &ListState<T>) {
        self.view.send_replace(state.view());
    }
}
