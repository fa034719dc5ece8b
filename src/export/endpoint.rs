//! Route handlers that download ledgers and party summaries as Excel workbooks.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::PartyId,
    export::workbook::{ledger_sheet, summary_sheet, write_workbook},
    not_found::get_404_not_found_response,
    party::{PartyKind, get_existing_party, get_party_summaries},
    transaction::get_party_transactions,
};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The state needed for the export route handlers.
#[derive(Debug, Clone)]
pub struct ExportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Download the ledger of a party with its running balance.
pub async fn export_party_ledger(
    State(state): State<ExportState>,
    Path(party_id): Path<PartyId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let party = get_existing_party(party_id, &connection)?;
    let transactions = get_party_transactions(party_id, &connection)?;
    drop(connection);

    let bytes = write_workbook(&ledger_sheet(&party, transactions))
        .inspect_err(|error| tracing::error!("could not export party {party_id}: {error}"))?;
    tracing::info!("Exported the ledger of party {party_id}");

    Ok(xlsx_response(&format!("{}-transactions.xlsx", party.name), bytes))
}

/// Download the totals of every party of the kind named in the URL.
pub async fn export_parties_summary(
    State(state): State<ExportState>,
    Path(route_segment): Path<String>,
) -> Result<Response, Error> {
    let Some(kind) = PartyKind::from_route_segment(&route_segment) else {
        return Ok(get_404_not_found_response());
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let summaries = get_party_summaries(kind, "", &connection)?;
    drop(connection);

    let bytes = write_workbook(&summary_sheet(kind, &summaries))
        .inspect_err(|error| tracing::error!("could not export {kind} summary: {error}"))?;
    tracing::info!("Exported the {kind} summary");

    Ok(xlsx_response(
        &format!("{}.xlsx", kind.info().export_label),
        bytes,
    ))
}

fn xlsx_response(file_name: &str, bytes: Vec<u8>) -> Response {
    let content_disposition = format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_owned()),
            (header::CONTENT_DISPOSITION, content_disposition),
        ],
        bytes,
    )
        .into_response()
}
