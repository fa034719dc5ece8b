//! Balance recalculation and the running-balance view of a ledger.

use rusqlite::Connection;

use crate::{
    Error,
    database_id::PartyId,
    party::set_party_balance,
    transaction::{Transaction, get_party_transactions},
};

/// The sum of debits and credits over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerTotals {
    pub debit: f64,
    pub credit: f64,
}

impl LedgerTotals {
    /// What the party owes, or is owed if negative.
    pub fn net(&self) -> f64 {
        self.debit - self.credit
    }
}

pub fn ledger_totals<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> LedgerTotals {
    transactions
        .into_iter()
        .fold(LedgerTotals::default(), |totals, transaction| LedgerTotals {
            debit: totals.debit + transaction.debit,
            credit: totals.credit + transaction.credit,
        })
}

/// Recompute a party's balance from its full ledger and store it on the party.
///
/// Call this inside the same SQL transaction as the change to the ledger so
/// that the stored balance always matches the committed transactions.
///
/// # Errors
/// Returns [Error::MissingParty] if the party does not exist, or
/// [Error::BalanceOutOfRange] if the ledger does not sum to a finite number,
/// in which case the caller must roll back.
pub fn recalculate_party_balance(party_id: PartyId, connection: &Connection) -> Result<f64, Error> {
    let transactions = get_party_transactions(party_id, connection)?;
    let balance = ledger_totals(&transactions).net();

    if !balance.is_finite() {
        tracing::warn!("Ledger of party {party_id} sums to {balance}, refusing to store it");
        return Err(Error::BalanceOutOfRange(party_id));
    }

    set_party_balance(party_id, balance, connection)?;
    tracing::debug!("Recalculated balance of party {party_id}: {balance}");

    Ok(balance)
}

/// A ledger entry together with the party's balance just after it.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub transaction: Transaction,
    pub running_balance: f64,
}

/// Compute the balance after each entry, and return the entries most recent first.
///
/// Entries are summed oldest first by effective date, with entries on the
/// same date in the order they were added.
pub fn running_balance(mut transactions: Vec<Transaction>) -> Vec<LedgerRow> {
    transactions.sort_by_key(|transaction| (transaction.date, transaction.id));

    let mut balance = 0.0;
    let mut rows: Vec<LedgerRow> = transactions
        .into_iter()
        .map(|transaction| {
            balance += transaction.net();

            LedgerRow {
                transaction,
                running_balance: balance,
            }
        })
        .collect();

    rows.reverse();
    rows
}

#[cfg(test)]
mod running_balance_tests {
    use time::{Date, OffsetDateTime, macros::date};

    use crate::transaction::{Transaction, running_balance};

    use super::ledger_totals;

    fn transaction(id: i64, date: Date, debit: f64, credit: f64) -> Transaction {
        Transaction {
            id,
            party_id: 1,
            description: format!("Entry {id}"),
            debit,
            credit,
            funding_source: None,
            expense_category: None,
            date,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_ledger_has_no_rows() {
        assert!(running_balance(Vec::new()).is_empty());
    }

    #[test]
    fn is_prefix_sum_in_date_order_displayed_newest_first() {
        let transactions = vec![
            transaction(3, date!(2025 - 03 - 01), 0.0, 50.0),
            transaction(1, date!(2025 - 01 - 01), 500.0, 0.0),
            transaction(2, date!(2025 - 02 - 01), 0.0, 200.0),
        ];

        let rows = running_balance(transactions);

        let got: Vec<(i64, f64)> = rows
            .iter()
            .map(|row| (row.transaction.id, row.running_balance))
            .collect();
        assert_eq!(got, [(3, 250.0), (2, 300.0), (1, 500.0)]);
    }

    #[test]
    fn same_date_entries_are_ordered_by_id() {
        let day = date!(2025 - 01 - 15);
        let transactions = vec![
            transaction(2, day, 0.0, 100.0),
            transaction(1, day, 300.0, 0.0),
        ];

        let rows = running_balance(transactions);

        assert_eq!(rows[1].transaction.id, 1);
        assert_eq!(rows[1].running_balance, 300.0);
        assert_eq!(rows[0].transaction.id, 2);
        assert_eq!(rows[0].running_balance, 200.0);
    }

    #[test]
    fn last_running_balance_equals_totals() {
        let transactions = vec![
            transaction(1, date!(2025 - 01 - 01), 120.0, 0.0),
            transaction(2, date!(2025 - 01 - 02), 0.0, 45.5),
            transaction(3, date!(2025 - 01 - 03), 10.25, 4.0),
        ];
        let totals = ledger_totals(&transactions);

        let rows = running_balance(transactions);

        assert_eq!(rows[0].running_balance, totals.net());
        assert_eq!(totals.debit, 130.25);
        assert_eq!(totals.credit, 49.5);
    }

    #[test]
    fn totals_do_not_depend_on_order() {
        let mut transactions = vec![
            transaction(1, date!(2025 - 01 - 01), 500.0, 0.0),
            transaction(2, date!(2025 - 01 - 02), 0.0, 200.0),
            transaction(3, date!(2025 - 01 - 03), 100.0, 0.0),
            transaction(4, date!(2025 - 01 - 04), 0.0, 75.0),
        ];
        let want = ledger_totals(&transactions);

        transactions.reverse();
        assert_eq!(ledger_totals(&transactions), want);

        transactions.swap(0, 2);
        assert_eq!(ledger_totals(&transactions), want);
        assert_eq!(want.net(), 325.0);
    }
}
