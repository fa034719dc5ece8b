//! Defines the endpoint for creating a new party with its opening balance.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    parse_form_date,
    party::{Party, PartyKind, insert_party},
    transaction::{
        ExpenseCategory, FundingSource, MAX_TEXT_LENGTH, NewTransaction, insert_transaction,
        parse_amount, parse_expense_category, recalculate_party_balance,
    },
};

/// The state needed to create a party.
#[derive(Debug, Clone)]
pub struct CreatePartyState {
    /// The database connection for managing parties.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreatePartyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw form data for creating a party.
#[derive(Debug, Deserialize)]
pub struct PartyForm {
    pub kind: PartyKind,
    pub name: String,
    /// The amount the party owes when it is added, blank for zero.
    #[serde(default)]
    pub opening_balance: String,
    #[serde(default)]
    pub funding_source: String,
    #[serde(default)]
    pub expense_category: String,
    /// The effective date of the opening balance, e.g. "2025-01-15".
    pub date: String,
}

/// A validated party and its opening balance.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParty {
    pub kind: PartyKind,
    pub name: String,
    pub opening_balance: f64,
    pub funding_source: Option<FundingSource>,
    pub expense_category: Option<ExpenseCategory>,
    pub date: Date,
}

impl NewParty {
    /// Validate the raw form data.
    ///
    /// # Errors
    /// Returns [Error::EmptyPartyName] for a blank name,
    /// [Error::PartyNameTooLong] for a name that would not fit in an exported
    /// cell, or the matching validation error for a bad amount, tag or date.
    pub fn from_form(form: &PartyForm) -> Result<Self, Error> {
        let name = form.name.trim();

        if name.is_empty() {
            return Err(Error::EmptyPartyName);
        }

        if name.chars().count() > MAX_TEXT_LENGTH {
            return Err(Error::PartyNameTooLong);
        }

        Ok(Self {
            kind: form.kind,
            name: name.to_owned(),
            opening_balance: parse_amount(&form.opening_balance)?,
            funding_source: FundingSource::parse_form_value(&form.funding_source)?,
            expense_category: parse_expense_category(&form.expense_category, form.kind)?,
            date: parse_form_date(&form.date)?,
        })
    }
}

/// A route handler for creating a new party, redirects to the party page on success.
pub async fn create_party_endpoint(
    State(state): State<CreatePartyState>,
    Form(form): Form<PartyForm>,
) -> Response {
    let new_party = match NewParty::from_form(&form) {
        Ok(new_party) => new_party,
        Err(error) => {
            tracing::debug!("Invalid party form {form:?}: {error}");
            return error.into_alert_response();
        }
    };

    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_party(&new_party, &mut connection) {
        Ok(party) => (
            HxRedirect(format_endpoint(endpoints::PARTY_VIEW, party.id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not create party {new_party:?}: {error}");
            error.into_alert_response()
        }
    }
}

/// Insert a party together with its opening-balance transaction and compute
/// its balance, all within one SQL transaction.
pub fn create_party(new_party: &NewParty, connection: &mut Connection) -> Result<Party, Error> {
    let sql_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let party = insert_party(&new_party.name, new_party.kind, &sql_transaction)?;
    insert_transaction(
        &NewTransaction {
            party_id: party.id,
            description: new_party.kind.info().opening_description.to_owned(),
            debit: new_party.opening_balance,
            credit: 0.0,
            funding_source: new_party.funding_source,
            expense_category: new_party.expense_category,
            date: new_party.date,
        },
        &sql_transaction,
    )?;
    let balance = recalculate_party_balance(party.id, &sql_transaction)?;

    sql_transaction.commit()?;
    tracing::info!("Created {} {:?}", party.kind, party.name);

    Ok(Party { balance, ..party })
}

#[cfg(test)]
impl NewParty {
    /// A party with an opening balance dated 2025-01-01 and no tags.
    pub fn test(name: &str, kind: PartyKind, opening_balance: f64) -> Self {
        Self {
            kind,
            name: name.to_owned(),
            opening_balance,
            funding_source: None,
            expense_category: None,
            date: time::macros::date!(2025 - 01 - 01),
        }
    }
}
