//! The kinds of party a ledger can belong to, and the per-kind metadata that
//! drives routing, page labels and export names.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::endpoints::{self, format_endpoint};

/// Who a ledger is kept for.
///
/// Serialized as the route segment (e.g. "customers") and stored in the
/// database as the tag (e.g. "customer").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyKind {
    /// Someone who buys from the business.
    #[serde(rename = "customers")]
    Customer,
    /// Someone the business buys from.
    #[serde(rename = "suppliers")]
    Supplier,
    /// Cash held in custody by an employee for business expenses.
    #[serde(rename = "custodies")]
    Custody,
}

/// The metadata for one [PartyKind].
#[derive(Debug, PartialEq)]
pub struct PartyKindInfo {
    /// The value stored in the database.
    pub tag: &'static str,
    /// The URL path segment, e.g. "/parties/customers".
    pub route_segment: &'static str,
    pub singular: &'static str,
    pub plural: &'static str,
    /// The workbook sheet and file name for the summary export.
    pub export_label: &'static str,
    /// The description of the transaction recorded when a party is created.
    pub opening_description: &'static str,
    /// Whether transactions may be tagged with an expense category.
    pub tracks_expenses: bool,
}

static PARTY_KIND_TABLE: [PartyKindInfo; 3] = [
    PartyKindInfo {
        tag: "customer",
        route_segment: "customers",
        singular: "Customer",
        plural: "Customers",
        export_label: "العملاء",
        opening_description: "Customer opening balance",
        tracks_expenses: false,
    },
    PartyKindInfo {
        tag: "supplier",
        route_segment: "suppliers",
        singular: "Supplier",
        plural: "Suppliers",
        export_label: "الموردين",
        opening_description: "Supplier opening balance",
        tracks_expenses: false,
    },
    PartyKindInfo {
        tag: "custody",
        route_segment: "custodies",
        singular: "Custody",
        plural: "Custodies",
        export_label: "العهدة",
        opening_description: "Custody opening balance",
        tracks_expenses: true,
    },
];

impl PartyKind {
    /// Every kind, in navigation order.
    pub const ALL: [PartyKind; 3] = [PartyKind::Customer, PartyKind::Supplier, PartyKind::Custody];

    /// The labels and flags for this kind.
    pub fn info(self) -> &'static PartyKindInfo {
        &PARTY_KIND_TABLE[self as usize]
    }

    /// Look up a kind by the tag stored in the database.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.info().tag == tag)
    }

    /// Look up a kind by its URL segment, e.g. "customers".
    pub fn from_route_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.info().route_segment == segment)
    }

    /// The page listing every party of this kind.
    pub fn list_url(self) -> String {
        format_endpoint(endpoints::PARTIES_VIEW, self.info().route_segment)
    }

    /// The page for adding a party of this kind.
    pub fn new_party_url(self) -> String {
        format_endpoint(endpoints::NEW_PARTY_VIEW, self.info().route_segment)
    }

    /// The summary workbook download for this kind.
    pub fn export_url(self) -> String {
        format_endpoint(endpoints::PARTIES_EXPORT, self.info().route_segment)
    }
}

impl Display for PartyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.info().singular)
    }
}

impl ToSql for PartyKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(
            self.info().tag.as_bytes(),
        )))
    }
}

impl FromSql for PartyKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let tag = value.as_str()?;

        PartyKind::from_tag(tag)
            .ok_or_else(|| FromSqlError::Other(format!("unknown party kind \"{tag}\"").into()))
    }
}
