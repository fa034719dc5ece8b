//! Ledgerbook is a web app for keeping the books of customers, suppliers and
//! custody accounts.
//!
//! Every party has a ledger of debit/credit transactions and a balance that is
//! recalculated from that ledger after every change. Ledgers can be exported to
//! Excel workbooks.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod export;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod party;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword, get_password_hash, set_password_hash};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use party::PartyKind;
pub use routing::build_router;

use crate::{
    alert::Alert, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response, transaction::MAX_TEXT_LENGTH,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The password entered at log-in does not match the stored admin password.
    #[error("invalid password")]
    InvalidCredentials,

    /// No admin password has been stored yet.
    ///
    /// The password is set with the `set_password` binary.
    #[error("the admin password has not been set")]
    PasswordNotSet,

    /// The session cookie is missing, could not be decrypted, or has expired.
    #[error("no valid session cookie in the cookie jar")]
    InvalidSession,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A party was submitted with a blank name.
    #[error("party name cannot be empty")]
    EmptyPartyName,

    /// A transaction was submitted with a blank description.
    #[error("transaction description cannot be empty")]
    EmptyDescription,

    /// A party name was longer than a spreadsheet cell can hold.
    #[error("party name cannot be longer than {max} characters", max = MAX_TEXT_LENGTH)]
    PartyNameTooLong,

    /// A transaction description was longer than a spreadsheet cell can hold.
    #[error(
        "transaction description cannot be longer than {max} characters",
        max = MAX_TEXT_LENGTH
    )]
    DescriptionTooLong,

    /// A debit, credit or opening balance was negative, not a number, or too large.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A date string could not be parsed as a calendar date.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The ledger of a party sums to a balance that is not a finite number.
    #[error("the balance of party {0} is too large to store")]
    BalanceOutOfRange(database_id::PartyId),

    /// The funding source is not one of the known options.
    #[error("\"{0}\" is not a known funding source")]
    InvalidFundingSource(String),

    /// The expense category is not one of the known options.
    #[error("\"{0}\" is not a known expense category")]
    InvalidExpenseCategory(String),

    /// An expense category was given for a party that does not track expenses.
    #[error("{0} ledgers do not track expense categories")]
    ExpenseCategoryNotAllowed(PartyKind),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The party a ledger operation refers to does not exist, or was deleted
    /// while the operation was running.
    #[error("the party {0} does not exist")]
    MissingParty(database_id::PartyId),

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete a party that does not exist
    #[error("tried to delete a party that is not in the database")]
    DeleteMissingParty,

    /// The spreadsheet library could not build the workbook.
    #[error("could not write the workbook: {0}")]
    ExportError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        Error::ExportError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound | Error::MissingParty(_) => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        let (status, title) = match &self {
            Error::EmptyPartyName
            | Error::EmptyDescription
            | Error::PartyNameTooLong
            | Error::DescriptionTooLong
            | Error::BalanceOutOfRange(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_)
            | Error::InvalidFundingSource(_)
            | Error::InvalidExpenseCategory(_)
            | Error::ExpenseCategoryNotAllowed(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
            Error::MissingParty(_) | Error::NotFound => {
                (StatusCode::NOT_FOUND, "Could not find the party")
            }
            Error::UpdateMissingTransaction => {
                (StatusCode::NOT_FOUND, "Could not update transaction")
            }
            Error::DeleteMissingTransaction => {
                (StatusCode::NOT_FOUND, "Could not delete transaction")
            }
            Error::DeleteMissingParty => (StatusCode::NOT_FOUND, "Could not delete party"),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                return Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
                .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let details = match &self {
            Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::DeleteMissingParty => format!(
                "{}. Try refreshing the page to see if it has already been deleted.",
                capitalise_first_char(&self.to_string())
            ),
            error => capitalise_first_char(&error.to_string()),
        };

        Alert::error(title, &details).into_response_with_status(status)
    }
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}

/// Parse a date from a HTML date input, e.g. "2025-01-15".
fn parse_form_date(raw: &str) -> Result<Date, Error> {
    const FORM_DATE_FORMAT: &[time::format_description::BorrowedFormatItem] =
        time::macros::format_description!("[year]-[month]-[day]");

    Date::parse(raw.trim(), FORM_DATE_FORMAT).map_err(|_| Error::InvalidDate(raw.to_owned()))
}
