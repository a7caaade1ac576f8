//! # Data Models
//!
//! Records served by the payroll backend plus the page envelope that wraps
//! every collection response.

pub mod comprobante;
pub mod empresa;
pub mod lote;
pub mod page;

pub use comprobante::Comprobante;
pub use empresa::Empresa;
pub use lote::{Accion, Candado, Lote};
pub use page::{Page, PageLink, PageRef};

/// Response body returned by mutating endpoints (`candado`, `validar`).
///
/// The backend reports business failures inside a 2xx body through
/// `status: "error"`; a missing status is treated as success.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MutationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome classification of a [`MutationResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Success,
    Error,
    Info,
}

impl MutationResponse {
    /// Classify the response status the way the console reacts to it.
    pub fn classify(&self) -> MutationStatus {
        match self.status.as_deref() {
            Some("error") => MutationStatus::Error,
            Some("success") | None => MutationStatus::Success,
            Some(_) => MutationStatus::Info,
        }
    }

    /// Whether the mutation should be treated as applied.
    pub fn is_success(&self) -> bool {
        self.classify() != MutationStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_status_counts_as_success() {
        let response: MutationResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.classify(), MutationStatus::Success);
        assert!(response.is_success());
    }

    #[test]
    fn info_status_is_not_an_error() {
        let response: MutationResponse =
            serde_json::from_str(r#"{"status":"info","message":"pendiente"}"#).unwrap();
        assert_eq!(response.classify(), MutationStatus::Info);
        assert!(response.is_success());
    }

    #[test]
    fn error_status_is_failure() {
        let response: MutationResponse =
            serde_json::from_str(r#"{"status":"error","message":"bloqueado"}"#).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.message.as_deref(), Some("bloqueado"));
    }
}
