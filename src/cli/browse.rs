use anyhow::Result;
use clap::Args;
use nomina::browse::NavOutcome;
use nomina::config::AppConfig;
use nomina::console::{PageMove, PayrollConsole};

use crate::cli::render::{comprobante_line, empresa_line, lote_line, page_footer, print_items};
use crate::cli::{EmpresaArg, SinkFormat, build_console, select_empresa};

/// Arguments for the Empresas command
#[derive(Args, Debug)]
pub struct EmpresasArgs {
    /// NIT (digits) or name to search for
    #[clap(short, long)]
    pub buscar: Option<String>,

    /// Page to show, starting at 1
    #[clap(short, long, default_value_t = 1)]
    pub pagina: usize,

    /// Print JSON instead of text
    #[clap(long)]
    pub json: bool,
}

/// Arguments for the Lotes command
#[derive(Args, Debug)]
pub struct LotesArgs {
    #[clap(flatten)]
    pub empresa: EmpresaArg,

    /// Four-digit year
    #[clap(long)]
    pub ano: Option<String>,

    /// Month number, 1 to 12
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub mes: Option<u32>,

    #[clap(short, long, default_value_t = 1)]
    pub pagina: usize,

    #[clap(long)]
    pub json: bool,
}

/// Arguments for the Comprobantes command
#[derive(Args, Debug)]
pub struct ComprobantesArgs {
    #[clap(flatten)]
    pub empresa: EmpresaArg,

    /// Employee code, at least three characters
    #[clap(long)]
    pub codigo: Option<String>,

    /// Employee name, at least three characters
    #[clap(long)]
    pub nombre: Option<String>,

    #[clap(short, long, default_value_t = 1)]
    pub pagina: usize,

    #[clap(long)]
    pub json: bool,
}

pub async fn run_empresas(config: &AppConfig, args: EmpresasArgs) -> Result<()> {
    let mut console = build_console(config, SinkFormat::default(), None)?;
    console
        .search_empresas(args.buscar.as_deref().unwrap_or_default())
        .await?;
    for _ in 1..args.pagina {
        if console.empresas().go_to_next().await? == NavOutcome::NoOp {
            break;
        }
    }

    let empresas = console.empresas().items();
    let mut index = 0;
    print_items(&empresas, args.json, |empresa| {
        index += 1;
        empresa_line(index - 1, empresa, false)
    })?;
    if !args.json {
        println!("{}", page_footer(console.empresas()));
    }
    Ok(())
}

pub async fn run_lotes(config: &AppConfig, args: LotesArgs) -> Result<()> {
    let mut console = build_console(config, SinkFormat::default(), None)?;
    apply_lotes_filters(&mut console, args.ano.as_deref(), args.mes).await?;
    let empresa = select_empresa(&mut console, &args.empresa).await?;
    advance(&console, args.pagina, false).await?;

    let lotes = console.lotes().navigator().items();
    if !args.json {
        println!("{}", empresa.display_name());
    }
    print_items(&lotes, args.json, lote_line)?;
    if !args.json {
        println!("{}", page_footer(console.lotes().navigator()));
    }
    Ok(())
}

pub async fn run_comprobantes(config: &AppConfig, args: ComprobantesArgs) -> Result<()> {
    let mut console = build_console(config, SinkFormat::default(), None)?;
    apply_comprobantes_filters(&mut console, args.codigo.as_deref(), args.nombre.as_deref())
        .await?;
    let empresa = select_empresa(&mut console, &args.empresa).await?;
    advance(&console, args.pagina, true).await?;

    let comprobantes = console.comprobantes().navigator().items();
    if !args.json {
        println!("{}", empresa.display_name());
    }
    print_items(&comprobantes, args.json, comprobante_line)?;
    if !args.json {
        println!("{}", page_footer(console.comprobantes().navigator()));
        println!("Total procesados: {}", console.total_procesados());
    }
    Ok(())
}

/// Record batch filters; they are sent once a company is selected.
pub async fn apply_lotes_filters(
    console: &mut PayrollConsole,
    ano: Option<&str>,
    mes: Option<u32>,
) -> Result<()> {
    if let Some(ano) = ano {
        console.set_lotes_ano(ano).await?;
    }
    if mes.is_some() {
        console.set_lotes_mes(mes).await?;
    }
    Ok(())
}

pub async fn apply_comprobantes_filters(
    console: &mut PayrollConsole,
    codigo: Option<&str>,
    nombre: Option<&str>,
) -> Result<()> {
    if let Some(codigo) = codigo {
        console.set_comprobantes_codigo(codigo).await?;
    }
    if let Some(nombre) = nombre {
        console.set_comprobantes_nombre(nombre).await?;
    }
    Ok(())
}

async fn advance(console: &PayrollConsole, pagina: usize, comprobantes: bool) -> Result<()> {
    for _ in 1..pagina {
        let outcome = if comprobantes {
            console.move_comprobantes(PageMove::Next).await?
        } else {
            console.move_lotes(PageMove::Next).await?
        };
        if outcome == NavOutcome::NoOp {
            break;
        }
    }
    Ok(())
}
