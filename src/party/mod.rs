//! Parties are the customers, suppliers and custody accounts that the business
//! keeps ledgers for.

mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod kind;
mod parties_page;
mod party_page;

pub use core::{
    Party, PartySummary, create_party_table, delete_party, get_existing_party, get_party,
    get_party_summaries, insert_party, set_party_balance,
};
pub use create_endpoint::create_party_endpoint;
pub use create_page::get_create_party_page;
pub use delete_endpoint::delete_party_endpoint;
pub use kind::PartyKind;
pub use parties_page::get_parties_page;
pub use party_page::get_party_page;

#[cfg(test)]
pub use create_endpoint::{NewParty, create_party};
