//! Defines the endpoint for adding a transaction to a party's ledger.

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
    database_id::PartyId,
    endpoints::{self, format_endpoint},
    parse_form_date,
    party::get_existing_party,
    transaction::{
        FundingSource, NewTransaction, Transaction, insert_transaction, parse_amount,
        parse_description, parse_expense_category, recalculate_party_balance,
    },
};

/// The state needed to add a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing ledgers.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw form data for a new transaction.
///
/// Amounts and tags are kept as text so that blank fields and invalid values
/// can be reported with a helpful alert.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    pub description: String,
    #[serde(default)]
    pub debit: String,
    #[serde(default)]
    pub credit: String,
    #[serde(default)]
    pub funding_source: String,
    #[serde(default)]
    pub expense_category: String,
    /// The effective date, e.g. "2025-01-15".
    pub date: String,
}

/// A route handler for adding a transaction, redirects to the party page on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Path(party_id): Path<PartyId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = add_transaction(party_id, &form, &mut connection) {
        tracing::debug!("Could not add transaction {form:?} to party {party_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(format_endpoint(endpoints::PARTY_VIEW, party_id)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Validate `form`, add it to the party's ledger and recompute the party's
/// balance, all within one SQL transaction.
///
/// # Errors
/// Returns a validation error for bad form values, or [Error::MissingParty]
/// if the party does not exist. Nothing is written on error.
pub fn add_transaction(
    party_id: PartyId,
    form: &TransactionForm,
    connection: &mut Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let party = get_existing_party(party_id, &sql_transaction)?;
    let new_transaction = NewTransaction {
        party_id,
        description: parse_description(&form.description)?,
        debit: parse_amount(&form.debit)?,
        credit: parse_amount(&form.credit)?,
        funding_source: FundingSource::parse_form_value(&form.funding_source)?,
        expense_category: parse_expense_category(&form.expense_category, party.kind)?,
        date: parse_form_date(&form.date)?,
    };

    let transaction = insert_transaction(&new_transaction, &sql_transaction)?;
    recalculate_party_balance(party_id, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(transaction)
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
            ExpenseCategory, FundingSource, MAX_TEXT_LENGTH, get_party_transactions,
            create_endpoint::{
                CreateTransactionState, TransactionForm, add_transaction,
                create_transaction_endpoint,
            },
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn form(debit: &str, credit: &str) -> TransactionForm {
        TransactionForm {
            description: "Invoice 7".to_owned(),
            debit: debit.to_owned(),
            credit: credit.to_owned(),
            funding_source: "none".to_owned(),
            expense_category: String::new(),
            date: "2025-01-20".to_owned(),
        }
    }

    #[tokio::test]
    async fn adds_transaction_and_redirects_to_party() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Ahmed", PartyKind::Customer, 500.0), &mut conn)
            .unwrap();
        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Path(party.id), Form(form("", "200")))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, &format_endpoint(endpoints::PARTY_VIEW, party.id));
        let conn = state.db_connection.lock().unwrap();
        assert_eq!(get_party(party.id, &conn).unwrap().balance, 300.0);
        let ledger = get_party_transactions(party.id, &conn).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[1].description, "Invoice 7");
        assert_eq!(ledger[1].date, date!(2025 - 01 - 20));
        assert_eq!(ledger[1].funding_source, None);
    }

    #[tokio::test]
    async fn invalid_amount_is_bad_request() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Ahmed", PartyKind::Customer, 0.0), &mut conn)
            .unwrap();
        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Path(party.id), Form(form("-3", "")))
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let conn = state.db_connection.lock().unwrap();
        assert_eq!(get_party_transactions(party.id, &conn).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_party_is_not_found() {
        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response =
            create_transaction_endpoint(State(state), Path(404), Form(form("1", ""))).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn custody_transaction_keeps_expense_category() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Khalid", PartyKind::Custody, 1000.0), &mut conn)
            .unwrap();
        let form = TransactionForm {
            funding_source: "cash".to_owned(),
            expense_category: "fuel".to_owned(),
            ..form("", "150")
        };

        let transaction = add_transaction(party.id, &form, &mut conn).unwrap();

        assert_eq!(transaction.funding_source, Some(FundingSource::Cash));
        assert_eq!(transaction.expense_category, Some(ExpenseCategory::Fuel));
        assert_eq!(get_party(party.id, &conn).unwrap().balance, 850.0);
    }

    #[test]
    fn rejects_expense_category_for_supplier() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Acme", PartyKind::Supplier, 0.0), &mut conn)
            .unwrap();
        let form = TransactionForm {
            expense_category: "fuel".to_owned(),
            ..form("10", "")
        };

        let result = add_transaction(party.id, &form, &mut conn);

        assert_eq!(
            result,
            Err(Error::ExpenseCategoryNotAllowed(PartyKind::Supplier))
        );
        assert_eq!(get_party(party.id, &conn).unwrap().balance, 0.0);
    }

    #[test]
    fn rejects_blank_description() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Ahmed", PartyKind::Customer, 0.0), &mut conn)
            .unwrap();
        let form = TransactionForm {
            description: "   ".to_owned(),
            ..form("10", "")
        };

        assert_eq!(
            add_transaction(party.id, &form, &mut conn),
            Err(Error::EmptyDescription)
        );
    }

    #[tokio::test]
    async fn description_too_long_to_export_is_bad_request() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Ahmed", PartyKind::Customer, 0.0), &mut conn)
            .unwrap();
        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let form = TransactionForm {
            description: "x".repeat(MAX_TEXT_LENGTH + 1),
            ..form("10", "")
        };

        let response =
            create_transaction_endpoint(State(state.clone()), Path(party.id), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let conn = state.db_connection.lock().unwrap();
        assert_eq!(get_party_transactions(party.id, &conn).unwrap().len(), 1);
    }

    #[test]
    fn rejects_amount_that_would_overflow_the_balance() {
        let mut conn = get_test_connection();
        let party = create_party(&NewParty::test("Ahmed", PartyKind::Customer, 500.0), &mut conn)
            .unwrap();

        let result = add_transaction(party.id, &form("1e308", ""), &mut conn);

        assert_eq!(result, Err(Error::InvalidAmount("1e308".to_owned())));
        let party = get_party(party.id, &conn).unwrap();
        assert_eq!(party.balance, 500.0);
        assert_eq!(get_party_transactions(party.id, &conn).unwrap().len(), 1);
    }
}
