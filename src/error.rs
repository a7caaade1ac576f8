//! # Error Handling
//!
//! Error types shared by the backend client and the console controllers.

use thiserror::Error;

/// Failure while talking to the payroll backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-success HTTP status, with the server-provided message when present
    #[error("HTTP error {status}: {}", message.as_deref().unwrap_or("no message"))]
    Http {
        status: u16,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Http { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// HTTP status of the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Input rejected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("El año debe estar entre {min} y {max}")]
    YearOutOfRange { value: i32, min: i32, max: i32 },
    #[error("El año debe tener 4 dígitos, se recibió '{value}'")]
    YearFormat { value: String },
    #[error("El mes debe estar entre 1 y 12, se recibió {value}")]
    MonthOutOfRange { value: u32 },
    #[error("Acción desconocida '{value}'")]
    UnknownAccion { value: String },
    #[error("No hay empresa seleccionada")]
    NoEmpresaSelected,
}

/// Failure of a full-collection export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A page of the walk failed; whatever was accumulated is dropped
    #[error("Export aborted: {0}")]
    Client(#[from] ClientError),

    #[error("Nothing to export")]
    Empty,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Misuse of the lock confirmation sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("No lock change is awaiting confirmation")]
    NothingPending,

    /// A confirmation arrived for a prompt other than the open one
    #[error("Confirmation for the {expected} prompt requested while the {actual} prompt is open")]
    WrongStage {
        expected: &'static str,
        actual: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_only_for_http_errors() {
        let err = ClientError::Http {
            status: 409,
            message: Some("Lote bloqueado".to_string()),
        };
        assert_eq!(err.server_message(), Some("Lote bloqueado"));
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "HTTP error 409: Lote bloqueado");

        let blank = ClientError::Http {
            status: 500,
            message: Some(String::new()),
        };
        assert_eq!(blank.server_message(), None);

        let malformed = ClientError::MalformedResponse("bad json".to_string());
        assert_eq!(malformed.server_message(), None);
        assert_eq!(malformed.status(), None);
    }

    #[test]
    fn http_error_without_message_displays_placeholder() {
        let err = ClientError::Http {
            status: 502,
            message: None,
        };
        assert_eq!(err.to_string(), "HTTP error 502: no message");
    }

    #[test]
    fn export_error_wraps_client_failure() {
        let err: ExportError = ClientError::MalformedResponse("truncated".to_string()).into();
        assert!(matches!(err, ExportError::Client(_)));
        assert_eq!(err.to_string(), "Export aborted: Malformed response: truncated");
    }
}
