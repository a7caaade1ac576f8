use anyhow::Result;
use clap::Args;
use nomina::config::AppConfig;
use nomina::models::{Accion, MutationResponse};

use crate::cli::{EmpresaArg, SinkFormat, build_console, select_empresa};

/// Arguments for the CrearLote command
#[derive(Args, Debug)]
pub struct CrearLoteArgs {
    #[clap(flatten)]
    pub empresa: EmpresaArg,

    /// Four-digit year between 1990 and 2050
    #[clap(long)]
    pub ano: String,

    /// Month number, 1 to 12
    #[clap(long)]
    pub mes: u32,

    /// Action code, e.g. NINM (default) or NIAM
    #[clap(long, default_value = "")]
    pub accion: String,
}

pub async fn run(config: &AppConfig, args: CrearLoteArgs) -> Result<()> {
    let mut console = build_console(config, SinkFormat::default(), None)?;
    select_empresa(&mut console, &args.empresa).await?;

    let response = console.create_lote(&args.ano, args.mes, &args.accion).await?;
    print_response(&response);
    Ok(())
}

pub fn print_response(response: &MutationResponse) {
    println!(
        "{}: {}",
        response.status.as_deref().unwrap_or("ok"),
        response.message.as_deref().unwrap_or("-")
    );
}

/// Known action codes with their labels, for help output.
pub fn accion_help() -> String {
    Accion::ALL
        .iter()
        .map(|a| format!("{} {}", a.code(), a.label()))
        .collect::<Vec<_>>()
        .join(", ")
}
