//! Excel exports of party ledgers and party summaries.
//!
//! Workbooks are laid out right to left and numbers are written with
//! Arabic-Indic digits.

mod endpoint;
mod localize;
mod workbook;

pub use endpoint::{export_parties_summary, export_party_ledger};
