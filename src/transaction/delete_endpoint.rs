//! Defines the endpoint for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, TransactionBehavior};

use crate::{
    AppState, Error,
    database_id::{PartyId, TransactionId},
    endpoints::{self, format_endpoint},
    transaction::{delete_transaction, recalculate_party_balance},
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing ledgers.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a transaction, redirects to the party page on
/// success since every later running balance changes.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match remove_transaction(transaction_id, &mut connection) {
        Ok(party_id) => (
            HxRedirect(format_endpoint(endpoints::PARTY_VIEW, party_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Delete a transaction and recompute its party's balance in one SQL transaction.
///
/// Returns the ID of the party whose ledger changed.
pub fn remove_transaction(
    transaction_id: TransactionId,
    connection: &mut Connection,
) -> Result<PartyId, Error> {
    let sql_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let party_id = delete_transaction(transaction_id, &sql_transaction)?;
    recalculate_party_balance(party_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(party_id)
}
