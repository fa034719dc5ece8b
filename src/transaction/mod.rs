//! Ledger transactions: the model, balance recalculation, and the endpoints
//! for adding, editing and deleting entries.

mod balance;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod inputs;
mod tags;

pub use balance::{
    LedgerRow, LedgerTotals, ledger_totals, recalculate_party_balance, running_balance,
};
pub use core::{
    FieldUpdate, MAX_TEXT_LENGTH, NewTransaction, Transaction, TransactionField,
    create_transaction_table, delete_party_transactions, delete_transaction,
    get_party_transactions, get_transaction, insert_transaction, parse_amount,
    parse_description, parse_expense_category, update_transaction_field,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use inputs::{expense_category_select, funding_source_select};
pub use tags::{ExpenseCategory, FundingSource, NONE_FORM_VALUE};

#[cfg(test)]
pub use create_endpoint::{TransactionForm, add_transaction};
