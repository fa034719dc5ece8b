//! Defines the endpoint for editing a single field of a transaction in place.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;

use crate::{
    AppState, Error,
    database_id::{PartyId, TransactionId},
    endpoints::{self, format_endpoint},
    party::get_existing_party,
    transaction::{
        FieldUpdate, TransactionField, get_transaction, recalculate_party_balance,
        update_transaction_field,
    },
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing ledgers.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data sent by an inline edit form: which field and its new raw value.
#[derive(Debug, Deserialize)]
pub struct EditTransactionForm {
    pub field: TransactionField,
    #[serde(default)]
    pub value: String,
}

/// A route handler for editing one field of a transaction, redirects to the
/// party page on success so that the running balances are redrawn.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<EditTransactionForm>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match edit_transaction(transaction_id, &form, &mut connection) {
        Ok(party_id) => (
            HxRedirect(format_endpoint(endpoints::PARTY_VIEW, party_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("Could not edit transaction {transaction_id} with {form:?}: {error}");
            error.into_alert_response()
        }
    }
}

/// Validate and apply one field change, then recompute the owning party's
/// balance, all within one SQL transaction.
///
/// Returns the ID of the party whose ledger changed.
///
/// # Errors
/// Returns [Error::UpdateMissingTransaction] if the transaction does not
/// exist, or a validation error for a bad value. Nothing is written on error.
pub fn edit_transaction(
    transaction_id: TransactionId,
    form: &EditTransactionForm,
    connection: &mut Connection,
) -> Result<PartyId, Error> {
    let sql_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let transaction = get_transaction(transaction_id, &sql_transaction).map_err(|error| match error
    {
        Error::NotFound => Error::UpdateMissingTransaction,
        error => error,
    })?;
    let party = get_existing_party(transaction.party_id, &sql_transaction)?;

    let update = FieldUpdate::parse(form.field, &form.value, party.kind)?;
    update_transaction_field(transaction_id, &update, &sql_transaction)?;
    recalculate_party_balance(party.id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(party.id)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        endpoints::{self, format_endpoint},
        party::{NewParty, PartyKind, create_party, get_party},
        test_utils::assert_hx_redirect,
        transaction::{
            TransactionField,
            edit_endpoint::{
                EditTransactionForm, EditTransactionState, edit_transaction,
                edit_transaction_endpoint,
            },
            get_party_transactions, get_transaction,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn edit(field: TransactionField, value: &str) -> EditTransactionForm {
        EditTransactionForm {
            field,
            value: value.to_owned(),
        }
    }

    #[tokio::test]
    async fn edit_debit_recomputes_balance() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Ahmed", PartyKind::Customer, 500.0), &mut conn)
            .unwrap();
        let opening = get_party_transactions(party.id, &conn).unwrap()[0].id;
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response = edit_transaction_endpoint(
            State(state.clone()),
            Path(opening),
            Form(edit(TransactionField::Debit, "750.5")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, &format_endpoint(endpoints::PARTY_VIEW, party.id));
        let conn = state.db_connection.lock().unwrap();
        assert_eq!(get_party(party.id, &conn).unwrap().balance, 750.5);
    }

    #[test]
    fn edits_non_amount_fields() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Khalid", PartyKind::Custody, 100.0), &mut conn)
            .unwrap();
        let id = get_party_transactions(party.id, &conn).unwrap()[0].id;

        edit_transaction(id, &edit(TransactionField::Description, " Advance "), &mut conn)
            .unwrap();
        edit_transaction(id, &edit(TransactionField::Date, "2024-12-31"), &mut conn).unwrap();
        edit_transaction(id, &edit(TransactionField::FundingSource, "albilad_bank"), &mut conn)
            .unwrap();
        edit_transaction(id, &edit(TransactionField::ExpenseCategory, "supplies"), &mut conn)
            .unwrap();

        let got = get_transaction(id, &conn).unwrap();
        assert_eq!(got.description, "Advance");
        assert_eq!(got.date, date!(2024 - 12 - 31));
        assert_eq!(got.funding_source.map(|source| source.tag()), Some("albilad_bank"));
        assert_eq!(got.expense_category.map(|category| category.tag()), Some("supplies"));
        assert_eq!(get_party(party.id, &conn).unwrap().balance, 100.0);
    }

    #[test]
    fn invalid_value_leaves_transaction_unchanged() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Ahmed", PartyKind::Customer, 500.0), &mut conn)
            .unwrap();
        let id = get_party_transactions(party.id, &conn).unwrap()[0].id;

        let result = edit_transaction(id, &edit(TransactionField::Credit, "lots"), &mut conn);

        assert_eq!(result, Err(Error::InvalidAmount("lots".to_owned())));
        assert_eq!(get_transaction(id, &conn).unwrap().credit, 0.0);
        assert_eq!(get_party(party.id, &conn).unwrap().balance, 500.0);
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = edit_transaction_endpoint(
            State(state),
            Path(1234),
            Form(edit(TransactionField::Debit, "1")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
