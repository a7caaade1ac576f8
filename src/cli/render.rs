//! Plain-text and JSON rendering of console state.

use anyhow::Result;
use nomina::browse::PageNavigator;
use nomina::export::rows::{format_currency, format_date, status_label};
use nomina::models::{Comprobante, Empresa, Lote};
use serde::Serialize;

pub fn empresa_line(index: usize, empresa: &Empresa, selected: bool) -> String {
    format!(
        "{} {:>3}. [{}] NIT {} {}",
        if selected { '*' } else { ' ' },
        index + 1,
        empresa.secuencia,
        empresa.nit,
        empresa.display_name()
    )
}

pub fn lote_line(lote: &Lote) -> String {
    format!(
        "[{}] {} {} lote {} consecutivo {} | {} | {} | enviado {} | candado {}",
        lote.secuencia,
        lote.ano,
        lote.mes_nombre.to_uppercase(),
        lote.lote,
        lote.consecutivo,
        lote.accion_label(),
        format_date(lote.fechaenvio.as_deref()),
        status_label(&lote.ajuste),
        lote.candado
    )
}

pub fn comprobante_line(comprobante: &Comprobante) -> String {
    format!(
        "[{}] {} {} | pago {} | total {} | CUNE {}",
        comprobante.secuencia,
        comprobante.codigo_empleado(),
        comprobante.nombre_empleado.as_deref().unwrap_or("-"),
        format_date(comprobante.fechapago.as_deref()),
        format_currency(comprobante.comprobantetotal),
        comprobante.cune.as_deref().filter(|c| !c.is_empty()).unwrap_or("-")
    )
}

/// `página N` plus which directions are available.
pub fn page_footer<T>(navigator: &PageNavigator<T>) -> String
where
    T: Clone + Send + Sync + 'static,
{
    let snapshot = navigator.snapshot();
    format!(
        "página {} ({} registros){}{}",
        snapshot.page_number,
        snapshot.item_count,
        if snapshot.prev.is_some() { " [anterior]" } else { "" },
        if snapshot.next.is_some() { " [siguiente]" } else { "" },
    )
}

/// Print a page of items either as JSON or one line per item.
pub fn print_items<T: Serialize>(
    items: &[T],
    json: bool,
    mut line: impl FnMut(&T) -> String,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        for item in items {
            println!("{}", line(item));
        }
    }
    Ok(())
}
