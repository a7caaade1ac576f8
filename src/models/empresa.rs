//! Company record.

use serde::{Deserialize, Serialize};

/// A company whose payroll batches and vouchers are administered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empresa {
    pub secuencia: i64,
    #[serde(default)]
    pub codigo: i64,
    #[serde(default)]
    pub nit: i64,
    #[serde(default)]
    pub nombre: String,
}

impl Empresa {
    /// Name used in export files and sheet cells.
    pub fn display_name(&self) -> &str {
        let trimmed = self.nombre.trim();
        if trimmed.is_empty() { "Empresa" } else { trimmed }
    }
}
