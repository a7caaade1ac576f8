//! # nomina
//!
//! Library behind the `nomina` console for DIAN electronic-payroll
//! administration: browse companies, their payroll batches ("lotes") and
//! vouchers ("comprobantes") through cursor-linked pages, export filtered
//! collections to spreadsheets and toggle a batch's lock flag through a
//! two-step confirmation.

pub mod browse;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod export;
pub mod lock;
pub mod models;
pub mod notify;
pub mod telemetry;
