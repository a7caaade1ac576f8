//! Single-page navigation over a cursor-linked collection.
//!
//! The navigator holds the current page's items and the three cursors the
//! backend returned with it. Every navigation call takes a fresh generation
//! number; a response that arrives after a newer call was issued is dropped
//! without touching state, so a slow "next" can never overwrite a faster
//! "first" issued after it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use metrics::counter;
use tracing::{debug, warn};

use crate::browse::ActiveFilters;
use crate::client::{PageRequest, PageSource};
use crate::error::ClientError;
use crate::models::{Page, PageRef};

/// Result of one navigation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// A page was fetched and is now current
    Loaded { page_number: usize, item_count: usize },
    /// Nothing to fetch in that direction
    NoOp,
    /// A newer call was issued while this one was in flight; its response was dropped
    Superseded,
}

impl NavOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, NavOutcome::Loaded { .. })
    }
}

/// Cursor state without the items, cheap to hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSnapshot {
    pub page_number: usize,
    pub item_count: usize,
    pub first: Option<PageRef>,
    pub next: Option<PageRef>,
    pub prev: Option<PageRef>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    First,
    Forward,
    Back,
}

struct CursorState<T> {
    items: Vec<T>,
    page_number: usize,
    first: Option<PageRef>,
    next: Option<PageRef>,
    prev: Option<PageRef>,
    last_error: Option<String>,
}

impl<T> Default for CursorState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page_number: 1,
            first: None,
            next: None,
            prev: None,
            last_error: None,
        }
    }
}

impl<T> CursorState<T> {
    fn replace(&mut self, page: Page<T>, page_number: usize) {
        self.first = Some(page.first_ref().clone()).filter(|r| !r.is_empty());
        self.next = page.next_ref().cloned();
        self.prev = page.prev_ref().cloned();
        self.items = page.items;
        self.page_number = page_number;
        self.last_error = None;
    }
}

/// Page-at-a-time walker for one collection.
pub struct PageNavigator<T> {
    label: &'static str,
    source: Arc<dyn PageSource<T>>,
    state: Mutex<CursorState<T>>,
    generation: AtomicU64,
}

impl<T> PageNavigator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(label: &'static str, source: Arc<dyn PageSource<T>>) -> Self {
        Self {
            label,
            source,
            state: Mutex::new(CursorState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn source(&self) -> Arc<dyn PageSource<T>> {
        Arc::clone(&self.source)
    }

    /// Fetch the first page of a (re)filtered collection.
    ///
    /// On success the cursor set is replaced and the page number reset to 1.
    /// On failure the cursors are left alone, the item list is emptied and the
    /// error is returned to the caller for reporting.
    pub async fn load_first_page(
        &self,
        parent_id: Option<i64>,
        filters: ActiveFilters,
    ) -> Result<NavOutcome, ClientError> {
        self.fetch(PageRequest::query(parent_id, filters), Direction::First)
            .await
    }

    pub async fn go_to_next(&self) -> Result<NavOutcome, ClientError> {
        let Some(next) = self.lock_state().next.clone() else {
            return Ok(NavOutcome::NoOp);
        };
        self.fetch(PageRequest::Ref(next), Direction::Forward).await
    }

    pub async fn go_to_prev(&self) -> Result<NavOutcome, ClientError> {
        let Some(prev) = self.lock_state().prev.clone() else {
            return Ok(NavOutcome::NoOp);
        };
        self.fetch(PageRequest::Ref(prev), Direction::Back).await
    }

    pub async fn go_to_first(&self) -> Result<NavOutcome, ClientError> {
        let Some(first) = self.lock_state().first.clone() else {
            return Ok(NavOutcome::NoOp);
        };
        self.fetch(PageRequest::Ref(first), Direction::First).await
    }

    /// Forget the current cursor set, e.g. when the parent entity changes.
    ///
    /// Any request still in flight is superseded.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.lock_state() = CursorState::default();
    }

    pub fn items(&self) -> Vec<T> {
        self.lock_state().items.clone()
    }

    pub fn item(&self, index: usize) -> Option<T> {
        self.lock_state().items.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().items.is_empty()
    }

    pub fn page_number(&self) -> usize {
        self.lock_state().page_number
    }

    pub fn has_next(&self) -> bool {
        self.lock_state().next.is_some()
    }

    pub fn has_prev(&self) -> bool {
        self.lock_state().prev.is_some()
    }

    pub fn first_ref(&self) -> Option<PageRef> {
        self.lock_state().first.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    pub fn snapshot(&self) -> CursorSnapshot {
        let state = self.lock_state();
        CursorSnapshot {
            page_number: state.page_number,
            item_count: state.items.len(),
            first: state.first.clone(),
            next: state.next.clone(),
            prev: state.prev.clone(),
            last_error: state.last_error.clone(),
        }
    }

    /// Edit the displayed items in place without refetching.
    pub fn modify_items<R>(&self, edit: impl FnOnce(&mut Vec<T>) -> R) -> R {
        edit(&mut self.lock_state().items)
    }

    async fn fetch(
        &self,
        request: PageRequest,
        direction: Direction,
    ) -> Result<NavOutcome, ClientError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(collection = self.label, generation, ?direction, "Fetching page");

        let result = self.source.fetch_page(&request).await;

        let mut state = self.lock_state();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(collection = self.label, generation, "Dropping superseded page response");
            counter!("nomina_navigation_superseded_total", "collection" => self.label)
                .increment(1);
            return Ok(NavOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let page_number = match direction {
                    Direction::First => 1,
                    Direction::Forward => state.page_number + 1,
                    Direction::Back => state.page_number.saturating_sub(1).max(1),
                };
                state.replace(page, page_number);
                debug!(
                    collection = self.label,
                    page_number,
                    items = state.items.len(),
                    has_next = state.next.is_some(),
                    "Page loaded"
                );
                Ok(NavOutcome::Loaded {
                    page_number,
                    item_count: state.items.len(),
                })
            }
            Err(err) => {
                warn!(collection = self.label, error = %err, "Page fetch failed; clearing items");
                state.items.clear();
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CursorState<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
