//! Client trait definitions
//!
//! Defines the interface the browsing and export controllers use to reach the
//! backend. Page references are opaque: implementations fetch them verbatim.

use async_trait::async_trait;

use crate::browse::ActiveFilters;
use crate::error::ClientError;
use crate::models::{Candado, MutationResponse, Page, PageRef};
use crate::models::lote::NuevoLote;

/// What to fetch: a fresh query or a server-issued page reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page of a collection for a parent entity and filter set
    Query {
        parent_id: Option<i64>,
        filters: ActiveFilters,
    },
    /// A page address previously returned by the backend
    Ref(PageRef),
}

impl PageRequest {
    pub fn query(parent_id: Option<i64>, filters: ActiveFilters) -> Self {
        PageRequest::Query { parent_id, filters }
    }
}

/// Provider of cursor-linked pages of `T`.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Fetch one page.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, ClientError>;
}

/// Endpoint toggling a batch's lock flag.
#[async_trait]
pub trait LockUpdater: Send + Sync {
    async fn update_candado(
        &self,
        secuencia: i64,
        candado: Candado,
    ) -> Result<MutationResponse, ClientError>;
}

/// Endpoint validating and creating a new batch.
#[async_trait]
pub trait BatchCreator: Send + Sync {
    async fn create_lote(&self, lote: &NuevoLote) -> Result<MutationResponse, ClientError>;
}
