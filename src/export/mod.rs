//! # Full-collection export
//!
//! Walks every page of a filtered collection, maps the records to
//! human-readable rows and hands the table to a [`TabularSink`].

pub mod exporter;
pub mod rows;
pub mod sink;

pub use exporter::{ExportBatch, ExportReport, export_all, export_collection};
pub use rows::{Cell, Column, ExportRow, Table, export_file_name};
pub use sink::{JsonLinesSink, TabularSink, XlsxSink};
