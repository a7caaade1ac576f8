use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use nomina::config::AppConfig;

use crate::cli::browse::{apply_comprobantes_filters, apply_lotes_filters};
use crate::cli::{EmpresaArg, SinkFormat, build_console, select_empresa};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Lotes,
    Comprobantes,
}

/// Arguments for the Export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// What to export
    #[clap(value_enum)]
    pub target: ExportTarget,

    #[clap(flatten)]
    pub empresa: EmpresaArg,

    /// Batch year filter
    #[clap(long)]
    pub ano: Option<String>,

    /// Batch month filter
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub mes: Option<u32>,

    /// Voucher employee code filter
    #[clap(long)]
    pub codigo: Option<String>,

    /// Voucher employee name filter
    #[clap(long)]
    pub nombre: Option<String>,

    #[clap(short, long, value_enum, default_value_t = SinkFormat::Xlsx)]
    pub formato: SinkFormat,

    /// Output directory, overrides NOMINA_EXPORT_DIR
    #[clap(short, long)]
    pub dir: Option<PathBuf>,
}

pub async fn run(config: &AppConfig, args: ExportArgs) -> Result<()> {
    let mut console = build_console(config, args.formato, args.dir.clone())?;

    let report = match args.target {
        ExportTarget::Lotes => {
            apply_lotes_filters(&mut console, args.ano.as_deref(), args.mes).await?;
            select_empresa(&mut console, &args.empresa).await?;
            console.export_lotes().await?
        }
        ExportTarget::Comprobantes => {
            apply_comprobantes_filters(
                &mut console,
                args.codigo.as_deref(),
                args.nombre.as_deref(),
            )
            .await?;
            select_empresa(&mut console, &args.empresa).await?;
            console.export_comprobantes().await?
        }
    };

    println!("{}", report.path.display());
    Ok(())
}
