//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/party/{party_id}', use [format_endpoint].

use std::fmt::Display;

/// The root route which redirects to the customers page or log in page.
pub const ROOT: &str = "/";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The page listing the parties of one kind, e.g. '/parties/customers'.
pub const PARTIES_VIEW: &str = "/parties/{kind}";
/// The page for creating a new party of one kind.
pub const NEW_PARTY_VIEW: &str = "/parties/{kind}/new";
/// The route for downloading the summary workbook of one party kind.
pub const PARTIES_EXPORT: &str = "/parties/{kind}/export";
/// The page for a single party's ledger.
pub const PARTY_VIEW: &str = "/party/{party_id}";
/// The route for downloading a party's ledger as a workbook.
pub const PARTY_EXPORT: &str = "/party/{party_id}/export";

/// The route for logging in.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to create a party.
pub const PARTIES_API: &str = "/api/parties";
/// The route to delete a party.
pub const PARTY_API: &str = "/api/parties/{party_id}";
/// The route to add a transaction to a party's ledger.
pub const PARTY_TRANSACTIONS_API: &str = "/api/parties/{party_id}/transactions";
/// The route to edit or delete a single transaction.
pub const TRANSACTION_API: &str = "/api/transactions/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `value`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/party/{party_id}', '{party_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, value: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        value,
        &endpoint_path[param_end..]
    )
}
