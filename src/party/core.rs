//! Defines the party model and its database queries.

use rusqlite::{Connection, Row, TransactionBehavior};

use crate::{
    Error,
    database_id::PartyId,
    party::PartyKind,
    transaction::{LedgerTotals, delete_party_transactions},
};

/// Someone the business keeps a ledger for.
#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    pub id: PartyId,
    pub name: String,
    pub kind: PartyKind,
    /// The sum of debits minus credits over the party's ledger.
    ///
    /// This is a cached value, it is recomputed after every change to the ledger.
    pub balance: f64,
}

/// A party with the totals of its ledger, as shown on the parties page and
/// in the summary export.
#[derive(Debug, Clone, PartialEq)]
pub struct PartySummary {
    pub party: Party,
    pub totals: LedgerTotals,
}

/// Create the party table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_party_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS party (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_party_kind_name ON party(kind, name);",
        (),
    )?;

    Ok(())
}

pub fn map_party_row(row: &Row) -> Result<Party, rusqlite::Error> {
    Ok(Party {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        balance: row.get(3)?,
    })
}

/// Insert a party with a zero balance.
///
/// `name` should already be trimmed and non-empty.
pub fn insert_party(name: &str, kind: PartyKind, connection: &Connection) -> Result<Party, Error> {
    let party = connection
        .prepare(
            "INSERT INTO party (name, kind, balance) VALUES (?1, ?2, 0)
             RETURNING id, name, kind, balance",
        )?
        .query_row((name, kind), map_party_row)?;

    Ok(party)
}

/// Retrieve a party from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid party,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_party(id: PartyId, connection: &Connection) -> Result<Party, Error> {
    let party = connection
        .prepare("SELECT id, name, kind, balance FROM party WHERE id = :id")?
        .query_one(&[(":id", &id)], map_party_row)?;

    Ok(party)
}

/// Like [get_party], but reports a missing party as [Error::MissingParty] for
/// operations that change the party's ledger.
pub fn get_existing_party(id: PartyId, connection: &Connection) -> Result<Party, Error> {
    get_party(id, connection).map_err(|error| match error {
        Error::NotFound => Error::MissingParty(id),
        error => error,
    })
}

/// Store a recomputed balance on a party.
///
/// # Errors
/// Returns [Error::MissingParty] if the party does not exist.
pub fn set_party_balance(id: PartyId, balance: f64, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("UPDATE party SET balance = ?1 WHERE id = ?2", (balance, id))?;

    if rows_affected == 0 {
        return Err(Error::MissingParty(id));
    }

    Ok(())
}

/// Delete a party and every transaction in its ledger as one unit.
///
/// # Errors
/// Returns [Error::DeleteMissingParty] if the party does not exist, in which
/// case nothing is deleted.
pub fn delete_party(id: PartyId, connection: &mut Connection) -> Result<(), Error> {
    let sql_transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let deleted_transactions = delete_party_transactions(id, &sql_transaction)?;
    let rows_affected = sql_transaction.execute("DELETE FROM party WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        // Dropping the SQL transaction rolls it back.
        return Err(Error::DeleteMissingParty);
    }

    sql_transaction.commit()?;
    tracing::info!("Deleted party {id} and {deleted_transactions} transactions");

    Ok(())
}

/// Get every party of one `kind` whose name contains `search`, ignoring case,
/// together with the totals of its ledger.
///
/// Parties are ordered by name. An empty `search` matches every party.
pub fn get_party_summaries(
    kind: PartyKind,
    search: &str,
    connection: &Connection,
) -> Result<Vec<PartySummary>, Error> {
    let search = search.trim().to_lowercase();

    connection
        .prepare(
            "SELECT p.id, p.name, p.kind, p.balance,
                COALESCE(SUM(t.debit), 0), COALESCE(SUM(t.credit), 0)
             FROM party p
             LEFT JOIN \"transaction\" t ON t.party_id = p.id
             WHERE p.kind = :kind
             GROUP BY p.id
             ORDER BY p.name COLLATE NOCASE ASC, p.id ASC",
        )?
        .query_map(&[(":kind", &kind)], |row| {
            Ok(PartySummary {
                party: map_party_row(row)?,
                totals: LedgerTotals {
                    debit: row.get(4)?,
                    credit: row.get(5)?,
                },
            })
        })?
        .filter(|summary| match summary {
            Ok(summary) => search.is_empty() || summary.party.name.to_lowercase().contains(&search),
            Err(_) => true,
        })
        .map(|summary| summary.map_err(Error::from))
        .collect()
}
