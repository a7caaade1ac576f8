//! In-memory page chain.
//!
//! Serves a fixed sequence of pages through the [`PageSource`] trait. Queries
//! always answer with the first page; references are resolved by exact match.
//! Individual references can be made to fail or to answer late, which makes it
//! the fixture of choice for navigator and exporter tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::trait_::{PageRequest, PageSource};
use crate::error::ClientError;
use crate::models::{Page, PageLink, PageRef};

/// Pages addressed as `mem://page/<n>`, numbered from 1.
pub struct StaticPages<T> {
    pages: HashMap<PageRef, Page<T>>,
    first: Option<PageRef>,
    failing: HashSet<PageRef>,
    delays: HashMap<PageRef, Duration>,
    requests: Mutex<Vec<PageRequest>>,
}

impl<T: Clone> StaticPages<T> {
    /// Build a linked chain from consecutive item groups.
    pub fn chain(groups: Vec<Vec<T>>) -> Self {
        let refs: Vec<PageRef> = (1..=groups.len()).map(Self::page_ref).collect();
        let first = refs.first().cloned();
        let mut pages = HashMap::new();

        for (index, items) in groups.into_iter().enumerate() {
            let link = |r: &PageRef| PageLink { href: r.clone() };
            let page = Page {
                items,
                first: link(&refs[0]),
                next: refs.get(index + 1).map(link),
                prev: index.checked_sub(1).map(|prev| link(&refs[prev])),
            };
            pages.insert(refs[index].clone(), page);
        }

        Self {
            pages,
            first,
            failing: HashSet::new(),
            delays: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reference of the `n`-th page (1-based).
    pub fn page_ref(n: usize) -> PageRef {
        PageRef::new(format!("mem://page/{}", n))
    }

    /// Make every fetch of the `n`-th page fail with a 500.
    pub fn failing_page(mut self, n: usize) -> Self {
        self.failing.insert(Self::page_ref(n));
        self
    }

    /// Make the `n`-th page answer after `delay`.
    pub fn delayed_page(mut self, n: usize, delay: Duration) -> Self {
        self.delays.insert(Self::page_ref(n), delay);
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.lock_requests().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.lock_requests().len()
    }

    fn lock_requests(&self) -> MutexGuard<'_, Vec<PageRequest>> {
        self.requests
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> PageSource<T> for StaticPages<T> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, ClientError> {
        self.lock_requests().push(request.clone());

        let target = match request {
            PageRequest::Query { .. } => self.first.clone(),
            PageRequest::Ref(page_ref) => Some(page_ref.clone()),
        };
        let Some(target) = target else {
            return Err(ClientError::Http {
                status: 404,
                message: Some("empty collection".to_string()),
            });
        };

        if let Some(delay) = self.delays.get(&target) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&target) {
            return Err(ClientError::Http {
                status: 500,
                message: Some(format!("page {} unavailable", target)),
            });
        }

        self.pages
            .get(&target)
            .cloned()
            .ok_or_else(|| ClientError::Http {
                status: 404,
                message: Some(format!("unknown page {}", target)),
            })
    }
}
