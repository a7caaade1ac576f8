//! One filtered, paginated collection scoped to an optional parent entity.

use std::sync::Arc;

use tracing::info;

use crate::browse::{ActiveFilters, FilterCoordinator, FilterOutcome, NavOutcome, PageNavigator};
use crate::client::PageSource;
use crate::error::ClientError;

/// Binds a [`PageNavigator`] to a [`FilterCoordinator`].
///
/// Every significant filter edit restarts the collection from page one with
/// the full active filter set. Scoped collections (lotes and comprobantes of a
/// company) stay empty until a parent is selected; filter edits made before
/// that are remembered and applied on the first load.
pub struct Collection<T> {
    navigator: PageNavigator<T>,
    filters: FilterCoordinator,
    parent_id: Option<i64>,
    scoped: bool,
}

impl<T> Collection<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Top-level collection that needs no parent.
    pub fn root(label: &'static str, source: Arc<dyn PageSource<T>>) -> Self {
        Self {
            navigator: PageNavigator::new(label, source),
            filters: FilterCoordinator::new(),
            parent_id: None,
            scoped: false,
        }
    }

    /// Collection that only loads once a parent entity is selected.
    pub fn scoped(label: &'static str, source: Arc<dyn PageSource<T>>) -> Self {
        Self {
            scoped: true,
            ..Self::root(label, source)
        }
    }

    pub fn navigator(&self) -> &PageNavigator<T> {
        &self.navigator
    }

    pub fn filters(&self) -> &FilterCoordinator {
        &self.filters
    }

    pub fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    /// Switch to a new parent: the old cursor set is discarded and, when a
    /// parent is given, page one is loaded with the current filters.
    pub async fn set_parent(&mut self, parent_id: Option<i64>) -> Result<NavOutcome, ClientError> {
        info!(
            collection = self.navigator.label(),
            parent_id = ?parent_id,
            "Parent entity changed"
        );
        self.parent_id = parent_id;
        self.navigator.reset();
        if self.can_load() {
            self.reload().await
        } else {
            Ok(NavOutcome::NoOp)
        }
    }

    /// Reload page one with the current parent and active filters.
    pub async fn reload(&self) -> Result<NavOutcome, ClientError> {
        if !self.can_load() {
            return Ok(NavOutcome::NoOp);
        }
        self.navigator
            .load_first_page(self.parent_id, self.filters.active())
            .await
    }

    /// `Ok(None)` when the edit was kept for display only.
    pub async fn set_text_filter(
        &mut self,
        name: &str,
        raw: &str,
    ) -> Result<Option<NavOutcome>, ClientError> {
        let outcome = self.filters.set_text_filter(name, raw);
        self.apply(outcome).await
    }

    pub async fn set_exact_digit_filter(
        &mut self,
        name: &str,
        raw: &str,
        required_digits: usize,
    ) -> Result<Option<NavOutcome>, ClientError> {
        let outcome = self
            .filters
            .set_exact_digit_filter(name, raw, required_digits);
        self.apply(outcome).await
    }

    pub async fn set_choice_filter(
        &mut self,
        name: &str,
        value: Option<&str>,
    ) -> Result<Option<NavOutcome>, ClientError> {
        let outcome = self.filters.set_choice_filter(name, value);
        self.apply(outcome).await
    }

    pub async fn clear_filters(&mut self) -> Result<Option<NavOutcome>, ClientError> {
        let outcome = self.filters.clear_all();
        self.apply(outcome).await
    }

    fn can_load(&self) -> bool {
        !self.scoped || self.parent_id.is_some()
    }

    async fn apply(&self, outcome: FilterOutcome) -> Result<Option<NavOutcome>, ClientError> {
        match outcome {
            FilterOutcome::Retained => Ok(None),
            FilterOutcome::Reload(_) if !self.can_load() => Ok(Some(NavOutcome::NoOp)),
            FilterOutcome::Reload(active) => self.load(active).await.map(Some),
        }
    }

    async fn load(&self, active: ActiveFilters) -> Result<NavOutcome, ClientError> {
        self.navigator.load_first_page(self.parent_id, active).await
    }
}
