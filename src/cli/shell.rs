//! Interactive session over one console instance.

use anyhow::Result;
use nomina::config::AppConfig;
use nomina::console::{PageMove, PayrollConsole};
use nomina::lock::{LockOutcome, LockStage};
use nomina::models::Candado;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::cli::lote::{accion_help, print_response};
use crate::cli::render::{comprobante_line, empresa_line, lote_line, page_footer};
use crate::cli::{SinkFormat, build_console};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Lotes,
    Comprobantes,
}

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empresas,
    Buscar(String),
    Usar(usize),
    SiguienteEmpresa,
    AnteriorEmpresa,
    Mostrar(View),
    Pagina(View, PageMove),
    Ano(String),
    Mes(Option<u32>),
    Codigo(String),
    Nombre(String),
    Limpiar(View),
    Cune { secuencia: i64, cune: String },
    Candado { secuencia: i64, valor: Candado },
    Si,
    No,
    Exportar(View),
    Crear { ano: String, mes: u32, accion: String },
    Ayuda,
    Salir,
}

fn parse_view(word: Option<&str>) -> Result<View, String> {
    match word {
        Some("lotes") => Ok(View::Lotes),
        Some("comprobantes") => Ok(View::Comprobantes),
        other => Err(format!(
            "se esperaba 'lotes' o 'comprobantes', se recibió '{}'",
            other.unwrap_or("")
        )),
    }
}

fn parse_move(word: Option<&str>) -> Result<Option<PageMove>, String> {
    match word {
        None => Ok(None),
        Some("primera") => Ok(Some(PageMove::First)),
        Some("sig") | Some("siguiente") => Ok(Some(PageMove::Next)),
        Some("ant") | Some("anterior") => Ok(Some(PageMove::Prev)),
        Some(other) => Err(format!("movimiento desconocido '{}'", other)),
    }
}

fn parse_number<T: std::str::FromStr>(word: Option<&str>, what: &str) -> Result<T, String> {
    word.and_then(|w| w.parse().ok())
        .ok_or_else(|| format!("{} inválido", what))
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err("línea vacía".to_string());
        };
        let rest = |words: std::str::SplitWhitespace<'_>| words.collect::<Vec<_>>().join(" ");

        let command = match head {
            "empresas" => ShellCommand::Empresas,
            "buscar" => ShellCommand::Buscar(rest(words)),
            "usar" => {
                let n: usize = parse_number(words.next(), "número de empresa")?;
                if n == 0 {
                    return Err("las empresas se numeran desde 1".to_string());
                }
                ShellCommand::Usar(n - 1)
            }
            "sig" => ShellCommand::SiguienteEmpresa,
            "ant" => ShellCommand::AnteriorEmpresa,
            "lotes" | "comprobantes" => {
                let view = parse_view(Some(head))?;
                match parse_move(words.next())? {
                    Some(movement) => ShellCommand::Pagina(view, movement),
                    None => ShellCommand::Mostrar(view),
                }
            }
            "ano" => ShellCommand::Ano(rest(words)),
            "mes" => match words.next() {
                None | Some("-") => ShellCommand::Mes(None),
                Some(word) => {
                    let mes: u32 = parse_number(Some(word), "mes")?;
                    if !(1..=12).contains(&mes) {
                        return Err("el mes debe estar entre 1 y 12".to_string());
                    }
                    ShellCommand::Mes(Some(mes))
                }
            },
            "codigo" => ShellCommand::Codigo(rest(words)),
            "nombre" => ShellCommand::Nombre(rest(words)),
            "limpiar" => ShellCommand::Limpiar(parse_view(words.next())?),
            "cune" => {
                let secuencia = parse_number(words.next(), "secuencia")?;
                ShellCommand::Cune {
                    secuencia,
                    cune: rest(words),
                }
            }
            "candado" => {
                let secuencia = parse_number(words.next(), "secuencia")?;
                let valor = words
                    .next()
                    .ok_or_else(|| "falta el valor S o N".to_string())?
                    .parse()?;
                ShellCommand::Candado { secuencia, valor }
            }
            "si" | "sí" | "s" => ShellCommand::Si,
            "no" | "n" => ShellCommand::No,
            "exportar" => ShellCommand::Exportar(parse_view(words.next())?),
            "crear" => {
                let ano = words
                    .next()
                    .ok_or_else(|| "falta el año".to_string())?
                    .to_string();
                let mes = parse_number(words.next(), "mes")?;
                let accion = words.next().unwrap_or_default().to_string();
                ShellCommand::Crear { ano, mes, accion }
            }
            "ayuda" | "?" => ShellCommand::Ayuda,
            "salir" | "exit" | "quit" => ShellCommand::Salir,
            other => return Err(format!("comando desconocido '{}'", other)),
        };
        Ok(command)
    }
}

fn help() -> String {
    format!(
        "\
empresas | buscar <nit o nombre> | usar <n> | sig | ant
lotes [primera|sig|ant] | ano <aaaa> | mes <1-12|-> | limpiar lotes
comprobantes [primera|sig|ant] | codigo <texto> | nombre <texto> | limpiar comprobantes
cune <secuencia> <valor>
candado <secuencia> <S|N>, luego si/no dos veces
exportar lotes|comprobantes
crear <año> <mes> [acción]   acciones: {}
salir",
        accion_help()
    )
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let mut console = build_console(config, SinkFormat::default(), None)?;
    if let Err(err) = console.load_empresas().await {
        warn!(error = %err, "Initial company load failed");
    }
    show_empresas(&console);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(prompt(&console).as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match ShellCommand::parse(&line) {
            Ok(ShellCommand::Salir) => break,
            Ok(command) => execute(&mut console, command).await,
            Err(message) => eprintln!("{}", message),
        }
    }
    Ok(())
}

fn prompt(console: &PayrollConsole) -> String {
    let empresa = console
        .current_empresa()
        .map(|e| e.display_name().to_string())
        .unwrap_or_else(|| "sin empresa".to_string());
    match console.lock().prompt() {
        Some(question) => format!("{} (si/no) > ", question),
        None => format!("nomina [{}] > ", empresa),
    }
}

/// Run one command; failures were already reported through the notifier.
async fn execute(console: &mut PayrollConsole, command: ShellCommand) {
    let result: Result<()> = async {
        match command {
            ShellCommand::Empresas => show_empresas(console),
            ShellCommand::Buscar(term) => {
                console.search_empresas(&term).await?;
                show_empresas(console);
            }
            ShellCommand::Usar(index) => {
                if console.select_empresa(index).await.is_none() {
                    println!("No hay empresa número {}", index + 1);
                }
                show_lotes(console);
            }
            ShellCommand::SiguienteEmpresa => {
                console.next_empresa().await?;
                show_lotes(console);
            }
            ShellCommand::AnteriorEmpresa => {
                console.prev_empresa().await?;
                show_lotes(console);
            }
            ShellCommand::Mostrar(view) => show(console, &view),
            ShellCommand::Pagina(view, movement) => {
                match view {
                    View::Lotes => console.move_lotes(movement).await?,
                    View::Comprobantes => console.move_comprobantes(movement).await?,
                };
                show(console, &view);
            }
            ShellCommand::Ano(raw) => {
                if console.set_lotes_ano(&raw).await?.is_some() {
                    show_lotes(console);
                }
            }
            ShellCommand::Mes(mes) => {
                console.set_lotes_mes(mes).await?;
                show_lotes(console);
            }
            ShellCommand::Codigo(raw) => {
                if console.set_comprobantes_codigo(&raw).await?.is_some() {
                    show_comprobantes(console);
                }
            }
            ShellCommand::Nombre(raw) => {
                if console.set_comprobantes_nombre(&raw).await?.is_some() {
                    show_comprobantes(console);
                }
            }
            ShellCommand::Limpiar(view) => {
                match view {
                    View::Lotes => console.clear_lotes_filters().await?,
                    View::Comprobantes => console.clear_comprobantes_filters().await?,
                };
                show(console, &view);
            }
            ShellCommand::Cune { secuencia, cune } => {
                if !console.set_cune(secuencia, &cune) {
                    println!("El comprobante {} no está en la página actual", secuencia);
                }
            }
            ShellCommand::Candado { secuencia, valor } => {
                if console.request_candado_change(secuencia, valor).is_none() {
                    println!("Sin cambios para el lote {}", secuencia);
                }
            }
            ShellCommand::Si => match console.lock().stage() {
                LockStage::FirstConfirmPending(_) => {
                    console.confirm_candado_first()?;
                }
                LockStage::SecondConfirmPending(_) => {
                    if let LockOutcome::Applied(_) = console.confirm_candado_second().await? {
                        show_lotes(console);
                    }
                }
                LockStage::Idle => println!("No hay nada que confirmar"),
            },
            ShellCommand::No => {
                if console.cancel_candado_change().is_some() {
                    println!("Cambio cancelado");
                }
            }
            ShellCommand::Exportar(view) => {
                let report = match view {
                    View::Lotes => console.export_lotes().await?,
                    View::Comprobantes => console.export_comprobantes().await?,
                };
                println!("{}", report.path.display());
            }
            ShellCommand::Crear { ano, mes, accion } => {
                let response = console.create_lote(&ano, mes, &accion).await?;
                print_response(&response);
            }
            ShellCommand::Ayuda => println!("{}", help()),
            ShellCommand::Salir => {}
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Err(err) = result {
        warn!(error = %err, "Shell command failed");
    }
}

fn show(console: &PayrollConsole, view: &View) {
    match view {
        View::Lotes => show_lotes(console),
        View::Comprobantes => show_comprobantes(console),
    }
}

fn show_empresas(console: &PayrollConsole) {
    let current = console.current_empresa().map(|e| e.secuencia);
    for (index, empresa) in console.empresas().items().iter().enumerate() {
        println!(
            "{}",
            empresa_line(index, empresa, Some(empresa.secuencia) == current)
        );
    }
    println!("{}", page_footer(console.empresas()));
}

fn show_lotes(console: &PayrollConsole) {
    for lote in console.lotes().navigator().items() {
        println!("{}", lote_line(&lote));
    }
    println!("lotes {}", page_footer(console.lotes().navigator()));
}

fn show_comprobantes(console: &PayrollConsole) {
    for comprobante in console.comprobantes().navigator().items() {
        println!("{}", comprobante_line(&comprobante));
    }
    println!(
        "comprobantes {} | total procesados {}",
        page_footer(console.comprobantes().navigator()),
        console.total_procesados()
    );
}
