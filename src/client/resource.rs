//! Route table for the paginated collections.

use serde::de::DeserializeOwned;

use crate::models::{Comprobante, Empresa, Lote};

/// A collection served by the backend under a fixed route.
pub trait Resource: DeserializeOwned + Send + Sync + 'static {
    /// Short name used in logs and metrics
    const NAME: &'static str;
    /// Query route relative to the API base URL
    const ROUTE: &'static str;
    /// Query parameter carrying the parent entity id, if the collection has one
    const PARENT_PARAM: Option<&'static str>;
}

impl Resource for Empresa {
    const NAME: &'static str = "empresas";
    const ROUTE: &'static str = "empresas/v1/lista/";
    const PARENT_PARAM: Option<&'static str> = None;
}

impl Resource for Lote {
    const NAME: &'static str = "lotes";
    const ROUTE: &'static str = "lotes/v1/empresa/";
    const PARENT_PARAM: Option<&'static str> = Some("secuencia");
}

impl Resource for Comprobante {
    const NAME: &'static str = "comprobantes";
    const ROUTE: &'static str = "comprobantesdian/v1/empresa/";
    const PARENT_PARAM: Option<&'static str> = Some("empresa_id");
}

/// Route of the lock-flag update for one batch.
pub fn candado_route(secuencia: i64) -> String {
    format!("lotes/v1/lote/{}/candado/", secuencia)
}

/// Route of batch validation and creation.
pub const CREATE_LOTE_ROUTE: &str = "lotes/v1/empresa/validar/";
