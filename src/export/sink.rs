//! Destinations for exported tables.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use tracing::info;

use crate::error::ExportError;
use crate::export::rows::{Cell, Table};

/// Writes a table under the given file name and returns the final path.
pub trait TabularSink: Send + Sync {
    fn write(&self, table: &Table, file_name: &str) -> Result<PathBuf, ExportError>;
}

/// Styled `.xlsx` workbook with a frozen header row.
#[derive(Debug, Clone)]
pub struct XlsxSink {
    dir: PathBuf,
}

impl XlsxSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    fn header_format() -> Format {
        Format::new()
            .set_bold()
            .set_font_size(11)
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x4472C4))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::White)
    }

    fn data_format() -> Format {
        Format::new()
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::RGB(0xD0D0D0))
    }
}

impl TabularSink for XlsxSink {
    fn write(&self, table: &Table, file_name: &str) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(file_name);
        let header = Self::header_format();
        let data = Self::data_format();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(table.sheet_name)?;

        for (col, column) in table.columns.iter().enumerate() {
            let col = col as u16;
            sheet.set_column_width(col, column.width)?;
            sheet.write_string_with_format(0, col, column.header, &header)?;
        }

        for (index, row) in table.rows.iter().enumerate() {
            let row_num = index as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(text) => {
                        sheet.write_string_with_format(row_num, col, text, &data)?;
                    }
                    Cell::Number(n) => {
                        sheet.write_number_with_format(row_num, col, *n, &data)?;
                    }
                }
            }
        }

        sheet.set_freeze_panes(1, 0)?;
        workbook.save(&path)?;

        info!(path = %path.display(), rows = table.len(), "Wrote xlsx export");
        Ok(path)
    }
}

/// Newline-delimited JSON: a header array followed by one array per row.
///
/// The `.xlsx` extension of the requested name is swapped for `.jsonl`.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    dir: PathBuf,
}

impl JsonLinesSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl TabularSink for JsonLinesSink {
    fn write(&self, table: &Table, file_name: &str) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(Path::new(file_name).with_extension("jsonl"));
        let mut out = BufWriter::new(File::create(&path)?);

        let headers: Vec<&str> = table.columns.iter().map(|c| c.header).collect();
        serde_json::to_writer(&mut out, &headers)?;
        out.write_all(b"\n")?;

        for row in &table.rows {
            let values: Vec<serde_json::Value> = row
                .iter()
                .map(|cell| match cell {
                    Cell::Text(text) => serde_json::Value::from(text.as_str()),
                    Cell::Number(n) => serde_json::Value::from(*n),
                })
                .collect();
            serde_json::to_writer(&mut out, &values)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        info!(path = %path.display(), rows = table.len(), "Wrote JSON lines export");
        Ok(path)
    }
}
