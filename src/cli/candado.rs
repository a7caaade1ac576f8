use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use clap::Args;
use nomina::config::AppConfig;
use nomina::lock::LockOutcome;
use nomina::models::Candado;

use crate::cli::browse::apply_lotes_filters;
use crate::cli::{EmpresaArg, SinkFormat, build_console, select_empresa};

/// Arguments for the Candado command
#[derive(Args, Debug)]
pub struct CandadoArgs {
    #[clap(flatten)]
    pub empresa: EmpresaArg,

    /// `secuencia` of the batch, which must be on the listed page
    #[clap(short, long)]
    pub lote: i64,

    /// New lock value, S or N
    #[clap(short, long)]
    pub valor: Candado,

    /// Batch year filter used to find the batch
    #[clap(long)]
    pub ano: Option<String>,

    /// Batch month filter used to find the batch
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub mes: Option<u32>,

    /// Answer yes to both confirmations
    #[clap(short = 'y', long)]
    pub si: bool,
}

pub async fn run(config: &AppConfig, args: CandadoArgs) -> Result<()> {
    let mut console = build_console(config, SinkFormat::default(), None)?;
    apply_lotes_filters(&mut console, args.ano.as_deref(), args.mes).await?;
    select_empresa(&mut console, &args.empresa).await?;

    let Some(first_prompt) = console.request_candado_change(args.lote, args.valor) else {
        println!(
            "El lote {} no está en la página listada o ya tiene el candado {}",
            args.lote, args.valor
        );
        return Ok(());
    };

    if !args.si && !confirm(first_prompt)? {
        console.cancel_candado_change();
        println!("Cambio cancelado");
        return Ok(());
    }
    let second_prompt = console.confirm_candado_first()?;
    if !args.si && !confirm(second_prompt)? {
        console.cancel_candado_change();
        println!("Cambio cancelado");
        return Ok(());
    }

    match console.confirm_candado_second().await? {
        LockOutcome::Applied(intent) => {
            println!("Lote {} candado {}", intent.secuencia, intent.new);
            Ok(())
        }
        LockOutcome::Rejected { message, .. } => bail!(message),
    }
}

/// Ask a yes/no question on the terminal.
fn confirm(prompt: &str) -> Result<bool> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{} [s/N] ", prompt)?;
    stderr.flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

pub fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}
