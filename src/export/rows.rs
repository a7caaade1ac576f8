//! Record-to-row mapping and value formatting.
//!
//! Values are rendered the way the console shows them: `es-CO` currency with
//! two decimals, `d/m/yyyy` dates, action labels and `Enviado`/`Cancelado`
//! for the `S`/`N` flags.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::models::{Candado, Comprobante, Lote};

/// One column of an exported sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub header: &'static str,
    /// Width in characters
    pub width: f64,
}

const fn column(header: &'static str, width: f64) -> Column {
    Column { header, width }
}

/// A single exported value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    fn text<S: Into<String>>(value: S) -> Self {
        Cell::Text(value.into())
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Sheet-shaped export payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub sheet_name: &'static str,
    pub columns: &'static [Column],
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a table from exported records; every row starts with the company name.
    pub fn from_records<R: ExportRow>(records: &[R], empresa_nombre: &str) -> Self {
        Self {
            sheet_name: R::SHEET_NAME,
            columns: R::COLUMNS,
            rows: records.iter().map(|r| r.to_row(empresa_nombre)).collect(),
        }
    }
}

/// A record type that can be exported as a sheet row.
pub trait ExportRow {
    const SHEET_NAME: &'static str;
    /// File name prefix, e.g. `Lotes`
    const FILE_PREFIX: &'static str;
    const COLUMNS: &'static [Column];

    fn to_row(&self, empresa_nombre: &str) -> Vec<Cell>;
}

impl ExportRow for Lote {
    const SHEET_NAME: &'static str = "Lotes";
    const FILE_PREFIX: &'static str = "Lotes";
    const COLUMNS: &'static [Column] = &[
        column("Empresa", 25.0),
        column("Año", 6.0),
        column("Mes", 12.0),
        column("Lote", 8.0),
        column("Consecutivo", 12.0),
        column("Enviado", 12.0),
        column("Fecha Envío", 25.0),
        column("Acción", 18.0),
        column("Candado", 12.0),
    ];

    fn to_row(&self, empresa_nombre: &str) -> Vec<Cell> {
        vec![
            Cell::text(empresa_nombre),
            Cell::Number(f64::from(self.ano)),
            Cell::text(self.mes_nombre.to_uppercase()),
            Cell::Number(self.lote as f64),
            Cell::Number(self.consecutivo as f64),
            Cell::text(status_label(&self.ajuste)),
            Cell::text(format_date(self.fechaenvio.as_deref())),
            Cell::text(self.accion_label()),
            Cell::text(status_label(self.candado.as_str())),
        ]
    }
}

impl ExportRow for Comprobante {
    const SHEET_NAME: &'static str = "Comprobantes";
    const FILE_PREFIX: &'static str = "Comprobantes";
    const COLUMNS: &'static [Column] = &[
        column("Empresa", 25.0),
        column("Código Empleado", 15.0),
        column("Nombre Empleado", 30.0),
        column("Consecutivo", 12.0),
        column("Marcación", 12.0),
        column("CUNE", 20.0),
        column("Prefijo", 10.0),
        column("Número Comprobante", 18.0),
        column("Fecha Pago", 25.0),
        column("Devengado Total", 15.0),
        column("Deducido Total", 15.0),
        column("Redondeo Total", 15.0),
        column("Comprobante Total", 18.0),
        column("Sueldo Trabajado", 15.0),
        column("Días Laborados", 12.0),
        column("Auxilio Transporte", 15.0),
        column("Fecha Desde", 15.0),
        column("Fecha Hasta", 15.0),
        column("Tracking ID", 20.0),
        column("Nov. Contractual", 15.0),
    ];

    fn to_row(&self, empresa_nombre: &str) -> Vec<Cell> {
        let text = |value: &Option<String>| Cell::text(value.clone().unwrap_or_default());
        vec![
            Cell::text(empresa_nombre),
            Cell::text(self.codigo_empleado()),
            text(&self.nombre_empleado),
            self.consecutivo
                .map(|c| Cell::Number(c as f64))
                .unwrap_or_else(|| Cell::text("")),
            text(&self.marcacion),
            text(&self.cune),
            text(&self.prefijo),
            Cell::text(self.numero_comprobante()),
            Cell::text(format_date(self.fechapago.as_deref())),
            Cell::text(format_currency(self.devengadototal)),
            Cell::text(format_currency(self.deducidototal)),
            Cell::text(format_currency(self.redondeototal)),
            Cell::text(format_currency(self.comprobantetotal)),
            Cell::text(format_currency(self.sueldotrabajado)),
            Cell::Number(self.diaslaborados.unwrap_or_default()),
            Cell::text(format_currency(self.aux_transporte)),
            Cell::text(format_date(self.fechadesde.as_deref())),
            Cell::text(format_date(self.fechahasta.as_deref())),
            text(&self.tracking_id),
            text(&self.nov_contractual),
        ]
    }
}

/// `S` reads as sent, anything else as cancelled.
pub fn status_label(flag: &str) -> &'static str {
    if flag.trim() == Candado::S.as_str() {
        "Enviado"
    } else {
        "Cancelado"
    }
}

/// Fixed two decimals with `es-CO` separators: `1.234.567,89`. Missing values render as zero.
pub fn format_currency(value: Option<f64>) -> String {
    let value = value.unwrap_or_default();
    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    format!("{}{},{}", sign, grouped, fraction)
}

/// Date-only `d/m/yyyy`; `-` when missing or unparsable.
pub fn format_date(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_date)
        .map(|date| format!("{}/{}/{}", date.day(), date.month(), date.year()))
        .unwrap_or_else(|| "-".to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

/// `<prefix>_<empresa>_<YYYY-MM-DD>.xlsx`, with `Empresa` standing in for a blank name.
pub fn export_file_name(prefix: &str, empresa_nombre: &str, date: NaiveDate) -> String {
    let empresa = empresa_nombre.trim();
    let empresa = if empresa.is_empty() { "Empresa" } else { empresa };
    format!("{}_{}_{}.xlsx", prefix, empresa, date.format("%Y-%m-%d"))
}
