//! Defines the core data models and database queries for ledger transactions.

use rusqlite::{Connection, Row, ToSql};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::{PartyId, TransactionId},
    parse_form_date,
    party::PartyKind,
    transaction::{ExpenseCategory, FundingSource},
};

// ============================================================================
// MODELS
// ============================================================================

/// One entry in a party's ledger.
///
/// Debits and credits are kept in separate non-negative columns and are never
/// netted into a single signed amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    /// The party whose ledger this entry belongs to.
    pub party_id: PartyId,
    pub description: String,
    pub debit: f64,
    pub credit: f64,
    pub funding_source: Option<FundingSource>,
    /// Only set for custody ledgers.
    pub expense_category: Option<ExpenseCategory>,
    /// The effective date, used for ordering the ledger.
    pub date: Date,
    /// When the entry was recorded, in UTC.
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// How much this entry moves the party's balance.
    pub fn net(&self) -> f64 {
        self.debit - self.credit
    }
}

/// A validated transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub party_id: PartyId,
    pub description: String,
    pub debit: f64,
    pub credit: f64,
    pub funding_source: Option<FundingSource>,
    pub expense_category: Option<ExpenseCategory>,
    pub date: Date,
}

/// A change to a single field of a stored transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Description(String),
    Debit(f64),
    Credit(f64),
    FundingSource(Option<FundingSource>),
    ExpenseCategory(Option<ExpenseCategory>),
    Date(Date),
}

impl FieldUpdate {
    fn column_and_value(&self) -> (&'static str, &dyn ToSql) {
        match self {
            FieldUpdate::Description(description) => ("description", description),
            FieldUpdate::Debit(debit) => ("debit", debit),
            FieldUpdate::Credit(credit) => ("credit", credit),
            FieldUpdate::FundingSource(source) => ("funding_source", source),
            FieldUpdate::ExpenseCategory(category) => ("expense_category", category),
            FieldUpdate::Date(date) => ("date", date),
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// The longest text an XLSX cell accepts, in characters.
pub const MAX_TEXT_LENGTH: usize = 32_767;

/// The largest debit, credit or opening balance accepted from a form.
///
/// Far enough below `f64::MAX` that no realistic ledger sums to infinity.
pub const MAX_AMOUNT: f64 = 1e15;

/// Parse a debit, credit or opening balance from a form field.
///
/// A blank value is zero.
///
/// # Errors
/// Returns [Error::InvalidAmount] if the value is not a number, is negative,
/// or is larger than [MAX_AMOUNT].
pub fn parse_amount(raw: &str) -> Result<f64, Error> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Ok(0.0);
    }

    let amount: f64 = trimmed
        .parse()
        .map_err(|_| Error::InvalidAmount(raw.to_owned()))?;

    if !amount.is_finite() || !(0.0..=MAX_AMOUNT).contains(&amount) {
        return Err(Error::InvalidAmount(raw.to_owned()));
    }

    // Avoid storing "-0".
    Ok(amount.abs())
}

/// Trim a description and check that something is left.
///
/// # Errors
/// Returns [Error::EmptyDescription] for blank text, or
/// [Error::DescriptionTooLong] if it would not fit in an exported cell.
pub fn parse_description(raw: &str) -> Result<String, Error> {
    let description = raw.trim();

    if description.is_empty() {
        return Err(Error::EmptyDescription);
    }

    if description.chars().count() > MAX_TEXT_LENGTH {
        return Err(Error::DescriptionTooLong);
    }

    Ok(description.to_owned())
}

/// Parse an expense category for a party of `kind`.
///
/// # Errors
/// Returns [Error::ExpenseCategoryNotAllowed] if a category is given for a
/// party kind that does not track expenses.
pub fn parse_expense_category(
    raw: &str,
    kind: PartyKind,
) -> Result<Option<ExpenseCategory>, Error> {
    let category = ExpenseCategory::parse_form_value(raw)?;

    if category.is_some() && !kind.info().tracks_expenses {
        return Err(Error::ExpenseCategoryNotAllowed(kind));
    }

    Ok(category)
}

/// The fields of a transaction that can be edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionField {
    Description,
    Debit,
    Credit,
    FundingSource,
    ExpenseCategory,
    Date,
}

impl TransactionField {
    /// The name sent by the edit forms.
    pub fn form_name(self) -> &'static str {
        match self {
            TransactionField::Description => "description",
            TransactionField::Debit => "debit",
            TransactionField::Credit => "credit",
            TransactionField::FundingSource => "funding_source",
            TransactionField::ExpenseCategory => "expense_category",
            TransactionField::Date => "date",
        }
    }
}

impl FieldUpdate {
    /// Validate the raw form `value` for `field` on a ledger of `kind`.
    pub fn parse(field: TransactionField, value: &str, kind: PartyKind) -> Result<Self, Error> {
        let update = match field {
            TransactionField::Description => FieldUpdate::Description(parse_description(value)?),
            TransactionField::Debit => FieldUpdate::Debit(parse_amount(value)?),
            TransactionField::Credit => FieldUpdate::Credit(parse_amount(value)?),
            TransactionField::FundingSource => {
                FieldUpdate::FundingSource(FundingSource::parse_form_value(value)?)
            }
            TransactionField::ExpenseCategory => {
                FieldUpdate::ExpenseCategory(parse_expense_category(value, kind)?)
            }
            TransactionField::Date => FieldUpdate::Date(parse_form_date(value)?),
        };

        Ok(update)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, party_id, description, debit, credit, funding_source, \
    expense_category, date, created_at";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                party_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                debit REAL NOT NULL DEFAULT 0 CHECK (debit >= 0),
                credit REAL NOT NULL DEFAULT 0 CHECK (credit >= 0),
                funding_source TEXT,
                expense_category TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(party_id) REFERENCES party(id)
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_party_date ON \"transaction\"(party_id, date, id);",
        (),
    )?;

    Ok(())
}

/// Add a transaction to a party's ledger.
///
/// The party's cached balance is not touched, callers recompute it within
/// the same SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingParty] if the party does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_transaction(
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (party_id, description, debit, credit, funding_source, expense_category, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                new_transaction.party_id,
                &new_transaction.description,
                new_transaction.debit,
                new_transaction.credit,
                new_transaction.funding_source,
                new_transaction.expense_category,
                new_transaction.date,
                OffsetDateTime::now_utc(),
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::MissingParty(new_transaction.party_id),
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get every transaction in a party's ledger, oldest first.
///
/// Entries on the same date are ordered by ID, i.e. the order they were added.
pub fn get_party_transactions(
    party_id: PartyId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE party_id = :party_id
             ORDER BY date ASC, id ASC"
        ))?
        .query_map(&[(":party_id", &party_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Change one field of a transaction.
///
/// # Errors
/// Returns [Error::UpdateMissingTransaction] if `id` does not refer to a transaction.
pub fn update_transaction_field(
    id: TransactionId,
    update: &FieldUpdate,
    connection: &Connection,
) -> Result<(), Error> {
    let (column, value) = update.column_and_value();

    let rows_affected = connection.execute(
        &format!("UPDATE \"transaction\" SET {column} = ?1 WHERE id = ?2"),
        rusqlite::params![value, id],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(())
}

/// Delete a transaction and return the ID of the party it belonged to.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if `id` does not refer to a transaction.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<PartyId, Error> {
    connection
        .prepare("DELETE FROM \"transaction\" WHERE id = :id RETURNING party_id")?
        .query_one(&[(":id", &id)], |row| row.get(0))
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::DeleteMissingTransaction,
            error => error.into(),
        })
}

/// Delete every transaction in a party's ledger, returning how many were deleted.
pub fn delete_party_transactions(
    party_id: PartyId,
    connection: &Connection,
) -> Result<usize, Error> {
    let deleted = connection.execute(
        "DELETE FROM \"transaction\" WHERE party_id = ?1",
        [party_id],
    )?;

    Ok(deleted)
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        party_id: row.get(1)?,
        description: row.get(2)?,
        debit: row.get(3)?,
        credit: row.get(4)?,
        funding_source: row.get(5)?,
        expense_category: row.get(6)?,
        date: row.get(7)?,
        created_at: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        party::{PartyKind, insert_party},
        transaction::{
            FieldUpdate, FundingSource, NewTransaction, delete_party_transactions,
            delete_transaction, get_party_transactions, get_transaction, insert_transaction,
            update_transaction_field,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_transaction(party_id: i64, debit: f64, credit: f64) -> NewTransaction {
        NewTransaction {
            party_id,
            description: "Invoice".to_owned(),
            debit,
            credit,
            funding_source: None,
            expense_category: None,
            date: date!(2025 - 01 - 15),
        }
    }

    #[test]
    fn insert_succeeds() {
        let conn = get_test_connection();
        let party = insert_party("Ahmed", PartyKind::Customer, &conn).unwrap();
        let want = NewTransaction {
            funding_source: Some(FundingSource::AlrajhiBank),
            ..new_transaction(party.id, 12.3, 0.0)
        };

        let got = insert_transaction(&want, &conn).expect("Could not create transaction");

        assert_eq!(got.party_id, party.id);
        assert_eq!(got.debit, 12.3);
        assert_eq!(got.credit, 0.0);
        assert_eq!(got.funding_source, Some(FundingSource::AlrajhiBank));
        assert_eq!(got.expense_category, None);
        assert_eq!(get_transaction(got.id, &conn), Ok(got));
    }

    #[test]
    fn insert_fails_on_missing_party() {
        let conn = get_test_connection();

        let result = insert_transaction(&new_transaction(42, 1.0, 0.0), &conn);

        assert_eq!(result, Err(Error::MissingParty(42)));
    }

    #[test]
    fn ledger_is_ordered_by_date_then_id() {
        let conn = get_test_connection();
        let party = insert_party("Ahmed", PartyKind::Customer, &conn).unwrap();
        let later = NewTransaction {
            date: date!(2025 - 02 - 01),
            ..new_transaction(party.id, 1.0, 0.0)
        };
        let first = insert_transaction(&later, &conn).unwrap();
        let second = insert_transaction(&new_transaction(party.id, 2.0, 0.0), &conn).unwrap();
        let third = insert_transaction(&new_transaction(party.id, 3.0, 0.0), &conn).unwrap();

        let ids: Vec<i64> = get_party_transactions(party.id, &conn)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.id)
            .collect();

        assert_eq!(ids, [second.id, third.id, first.id]);
    }

    #[test]
    fn update_changes_only_one_field() {
        let conn = get_test_connection();
        let party = insert_party("Ahmed", PartyKind::Customer, &conn).unwrap();
        let transaction = insert_transaction(&new_transaction(party.id, 5.0, 0.0), &conn).unwrap();

        update_transaction_field(transaction.id, &FieldUpdate::Credit(2.5), &conn).unwrap();

        let got = get_transaction(transaction.id, &conn).unwrap();
        assert_eq!(got.credit, 2.5);
        assert_eq!(got.debit, 5.0);
        assert_eq!(got.description, transaction.description);
    }

    #[test]
    fn update_can_clear_funding_source() {
        let conn = get_test_connection();
        let party = insert_party("Ahmed", PartyKind::Customer, &conn).unwrap();
        let transaction = insert_transaction(
            &NewTransaction {
                funding_source: Some(FundingSource::Cash),
                ..new_transaction(party.id, 5.0, 0.0)
            },
            &conn,
        )
        .unwrap();

        update_transaction_field(transaction.id, &FieldUpdate::FundingSource(None), &conn)
            .unwrap();

        let got = get_transaction(transaction.id, &conn).unwrap();
        assert_eq!(got.funding_source, None);
    }

    #[test]
    fn update_missing_transaction_fails() {
        let conn = get_test_connection();

        let result = update_transaction_field(1, &FieldUpdate::Debit(1.0), &conn);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_returns_party_id() {
        let conn = get_test_connection();
        let party = insert_party("Ahmed", PartyKind::Customer, &conn).unwrap();
        let transaction = insert_transaction(&new_transaction(party.id, 5.0, 0.0), &conn).unwrap();

        assert_eq!(delete_transaction(transaction.id, &conn), Ok(party.id));
        assert_eq!(get_transaction(transaction.id, &conn), Err(Error::NotFound));
        assert_eq!(
            delete_transaction(transaction.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }

    #[test]
    fn delete_party_transactions_leaves_other_ledgers() {
        let conn = get_test_connection();
        let ahmed = insert_party("Ahmed", PartyKind::Customer, &conn).unwrap();
        let sara = insert_party("Sara", PartyKind::Customer, &conn).unwrap();
        insert_transaction(&new_transaction(ahmed.id, 5.0, 0.0), &conn).unwrap();
        insert_transaction(&new_transaction(ahmed.id, 0.0, 2.0), &conn).unwrap();
        insert_transaction(&new_transaction(sara.id, 1.0, 0.0), &conn).unwrap();

        assert_eq!(delete_party_transactions(ahmed.id, &conn), Ok(2));

        assert!(get_party_transactions(ahmed.id, &conn).unwrap().is_empty());
        assert_eq!(get_party_transactions(sara.id, &conn).unwrap().len(), 1);
    }
}
