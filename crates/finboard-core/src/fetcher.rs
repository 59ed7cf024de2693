//! Filtered, paged fetching with last-request-wins ordering
//!
//! A `PagedFetcher` belongs to one view. Every filter, sort or page change
//! aborts the request still in flight and issues a new one tagged with a
//! fresh generation number. A response is committed only if its generation
//! is still the latest one, so a slow stale response can never overwrite
//! the rows of a newer request.

use crate::error::{DefaultErrorLogger, ErrorCode, ErrorContext, ErrorLogger, ErrorSeverity, FetchError};
use crate::models::{FetchResult, PageResponse};
use crate::query::{FilterState, FilterUpdate, PageQuery, SortSpec};
use async_trait::async_trait;
use finboard_config::SortDirection;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Anything that can answer a paged list query
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, FetchError>;
}

/// Adapter turning an async closure into a `PageSource`
pub struct FnSource<F>(pub F);

#[async_trait]
impl<F, Fut> PageSource for FnSource<F>
where
    F: Fn(PageQuery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<PageResponse, FetchError>> + Send + 'static,
{
    async fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, FetchError> {
        (self.0)(query.clone()).await
    }
}

/// Where the view is in its request lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Failure(FetchError),
}

/// Transient error banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub code: ErrorCode,
    pub severity: ErrorSeverity,
    pub message: String,
}

impl From<&FetchError> for Notice {
    fn from(error: &FetchError) -> Self {
        Self {
            code: error.code(),
            severity: error.severity(),
            message: error.user_message(),
        }
    }
}

/// What a view renders
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub status: FetchStatus,
    /// Last committed page; kept while loading or on error
    pub result: FetchResult,
    pub notice: Option<Notice>,
    /// Query the committed rows answer
    pub query: Option<PageQuery>,
    /// Generation of the committed rows, `None` before the first success
    pub committed_generation: Option<u64>,
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

struct Shared {
    state: watch::Sender<ViewState>,
    latest: AtomicU64,
    logger: Arc<dyn ErrorLogger>,
}

impl Shared {
    /// Start a new request and return its generation
    fn begin(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            s.status = FetchStatus::Loading;
            s.notice = None;
        });
        generation
    }

    /// Apply an outcome; returns false when it was dropped as stale.
    ///
    /// The generation check runs under the state lock, the same lock
    /// `begin` takes, so a newer request cannot start between the check
    /// and the write.
    fn commit(
        &self,
        generation: u64,
        query: PageQuery,
        outcome: Result<PageResponse, FetchError>,
    ) -> bool {
        let mut committed = false;
        self.state.send_if_modified(|s| {
            let latest = self.latest.load(Ordering::SeqCst);
            if generation != latest {
                log::debug!(
                    "dropping response for generation {} (latest is {})",
                    generation,
                    latest
                );
                return false;
            }
            committed = true;

            match outcome {
                Ok(response) => {
                    log::debug!(
                        "generation {}: {} rows, page {} of {} items",
                        generation,
                        response.data.len(),
                        response.pagination.current_page,
                        response.pagination.total_items
                    );
                    s.status = FetchStatus::Success;
                    s.result = FetchResult::from(response);
                    s.notice = None;
                    s.query = Some(query);
                    s.committed_generation = Some(generation);
                    true
                }
                Err(error) if error.is_cancellation() => {
                    if s.status != FetchStatus::Loading {
                        return false;
                    }
                    s.status = if s.committed_generation.is_some() {
                        FetchStatus::Success
                    } else {
                        FetchStatus::Idle
                    };
                    true
                }
                Err(error) => {
                    let context = ErrorContext::new("fetch_page")
                        .with_generation(generation)
                        .with_data("page", serde_json::json!(query.page));
                    self.logger.log_fetch_error(&error, &context);
                    s.notice = Some(Notice::from(&error));
                    s.status = FetchStatus::Failure(error);
                    true
                }
            }
        });
        committed
    }
}

/// Per-view single-flight fetcher.
///
/// Methods that change filters spawn the request on the current tokio
/// runtime and return immediately; observe results with `subscribe` or
/// `snapshot`.
///
/// # Panics
///
/// `load`, `refresh` and the `set_*` methods call `tokio::spawn` and panic
/// when called outside a tokio runtime.
pub struct PagedFetcher<S: PageSource> {
    source: Arc<S>,
    filters: FilterState,
    shared: Arc<Shared>,
    in_flight: Option<JoinHandle<()>>,
}

impl<S: PageSource> PagedFetcher<S> {
    pub fn new(source: Arc<S>, filters: FilterState) -> Self {
        Self::with_logger(source, filters, Arc::new(DefaultErrorLogger))
    }

    pub fn with_logger(source: Arc<S>, filters: FilterState, logger: Arc<dyn ErrorLogger>) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            source,
            filters,
            shared: Arc::new(Shared {
                state,
                latest: AtomicU64::new(0),
                logger,
            }),
            in_flight: None,
        }
    }

    /// Current filter/sort/page state
    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.shared.state.borrow().clone()
    }

    /// Initial load with the current filters
    pub fn load(&mut self) -> u64 {
        self.issue()
    }

    /// Re-issue the current query
    pub fn refresh(&mut self) -> u64 {
        self.issue()
    }

    pub fn set_filter(&mut self, update: FilterUpdate) -> u64 {
        self.filters.apply(update);
        self.issue()
    }

    /// Change ordering; the page is kept
    pub fn set_sort(&mut self, field: impl Into<String>, direction: SortDirection) -> u64 {
        self.filters.sort = SortSpec::new(field, direction);
        self.issue()
    }

    pub fn set_page(&mut self, page: u32) -> u64 {
        self.filters.current_page = page.max(1);
        self.issue()
    }

    pub fn set_page_size(&mut self, page_size: u32) -> u64 {
        self.filters.page_size = page_size.max(1);
        self.filters.current_page = 1;
        self.issue()
    }

    /// Clear the error banner without touching rows
    pub fn dismiss_notice(&self) {
        self.shared.state.send_if_modified(|s| s.notice.take().is_some());
    }

    /// Wait for the request in flight, if any, to finish
    pub async fn settle(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    log::error!("fetch task panicked: {}", e);
                }
            }
        }
    }

    fn issue(&mut self) -> u64 {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }

        let generation = self.shared.begin();
        let query = self.filters.to_query();
        log::debug!("generation {}: fetching {:?}", generation, query.to_params());

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = source.fetch_page(&query).await;
            shared.commit(generation, query, outcome);
        }));

        generation
    }
}

impl<S: PageSource> Drop for PagedFetcher<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
