//! # nomina
//!
//! Command-line entry point of the payroll console.

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nomina::config::ConfigLoader;
use nomina::telemetry::init_tracing;
use tracing::debug;

use crate::cli::{
    browse::{ComprobantesArgs, EmpresasArgs, LotesArgs},
    candado::CandadoArgs,
    export::ExportArgs,
    lote::CrearLoteArgs,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// Directory holding the layered `.env` files, by default the working directory
    #[clap(long)]
    env_dir: Option<std::path::PathBuf>,

    /// Print the effective configuration before running the command
    #[clap(long)]
    show_config: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List or search companies
    Empresas(EmpresasArgs),

    /// Browse a company's payroll batches
    Lotes(LotesArgs),

    /// Browse a company's DIAN vouchers
    Comprobantes(ComprobantesArgs),

    /// Export every filtered batch or voucher of a company to a spreadsheet
    Export(ExportArgs),

    /// Lock or unlock a batch, confirming twice
    Candado(CandadoArgs),

    /// Validate and create a new batch
    CrearLote(CrearLoteArgs),

    /// Interactive session
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match cli.env_dir {
        Some(dir) => ConfigLoader::with_base_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("loading configuration")?;
    init_tracing(&config).context("initializing tracing")?;
    debug!(profile = %config.profile, "Configuration loaded");

    if cli.show_config {
        eprintln!("{}", config.redacted_json()?);
    }

    match cli.command {
        Commands::Empresas(args) => cli::browse::run_empresas(&config, args).await,
        Commands::Lotes(args) => cli::browse::run_lotes(&config, args).await,
        Commands::Comprobantes(args) => cli::browse::run_comprobantes(&config, args).await,
        Commands::Export(args) => cli::export::run(&config, args).await,
        Commands::Candado(args) => cli::candado::run(&config, args).await,
        Commands::CrearLote(args) => cli::lote::run(&config, args).await,
        Commands::Shell => cli::shell::run(&config).await,
    }
}
