//! Defines the endpoint for deleting a party and its ledger.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, alert::Alert, database_id::PartyId, party::delete_party};

/// The state needed to delete a party.
#[derive(Debug, Clone)]
pub struct DeletePartyState {
    /// The database connection for managing parties.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeletePartyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a party, responds with an alert.
pub async fn delete_party_endpoint(
    State(state): State<DeletePartyState>,
    Path(party_id): Path<PartyId>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_party(party_id, &mut connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::success("Party deleted", "Its transactions were deleted too.")
            .into_response(),
        Err(error) => {
            tracing::error!("Could not delete party {party_id}: {error}");
            error.into_alert_response()
        }
    }
}
