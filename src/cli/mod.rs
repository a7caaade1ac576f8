//! Subcommand implementations and the helpers they share.

pub mod browse;
pub mod candado;
pub mod export;
pub mod lote;
pub mod render;
pub mod shell;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use nomina::client::HttpBackend;
use nomina::config::AppConfig;
use nomina::console::{ConsoleDeps, ConsoleSettings, PayrollConsole};
use nomina::export::{JsonLinesSink, TabularSink, XlsxSink};
use nomina::models::Empresa;
use nomina::notify::{Notifier, Severity, TracingNotifier};

/// Company selection shared by every company-scoped subcommand.
#[derive(Args, Debug, Clone)]
pub struct EmpresaArg {
    /// Company NIT (digits) or part of its name; the first match is used.
    /// Without it the first listed company is selected.
    #[clap(short = 'e', long)]
    pub empresa: Option<String>,
}

/// Spreadsheet format written by exports.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SinkFormat {
    #[default]
    Xlsx,
    Jsonl,
}

/// Prints notifications to stderr and records them as tracing events.
pub struct PrintNotifier;

impl Notifier for PrintNotifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration) {
        eprintln!("[{}] {}", severity.as_str(), message);
        TracingNotifier.notify(message, severity, duration);
    }
}

pub fn build_console(
    config: &AppConfig,
    format: SinkFormat,
    export_dir: Option<PathBuf>,
) -> Result<PayrollConsole> {
    let backend = Arc::new(HttpBackend::from_config(config)?);
    let dir = export_dir.unwrap_or_else(|| config.export_dir.clone());
    let sink: Arc<dyn TabularSink> = match format {
        SinkFormat::Xlsx => Arc::new(XlsxSink::new(dir)),
        SinkFormat::Jsonl => Arc::new(JsonLinesSink::new(dir)),
    };
    let deps = ConsoleDeps::http(backend, sink, Arc::new(PrintNotifier));
    Ok(PayrollConsole::new(deps, ConsoleSettings::from(config)))
}

/// Select the company named by `arg`, loading its batches and vouchers.
pub async fn select_empresa(console: &mut PayrollConsole, arg: &EmpresaArg) -> Result<Empresa> {
    let selected = match arg.empresa.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => {
            console.search_empresas(term).await?;
            console.select_empresa(0).await
        }
        _ => console.load_empresas().await?,
    };
    match selected {
        Some(empresa) => Ok(empresa),
        None => bail!("No se encontró ninguna empresa"),
    }
}
