//! Storage for the single admin password that guards the app.

use rusqlite::Connection;

use crate::{Error, auth::PasswordHash};

/// Create the admin table in the database.
///
/// The table holds at most one row.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_admin_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS admin (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            password TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Get the stored admin password hash.
///
/// # Errors
/// Returns [Error::PasswordNotSet] if no password has been stored yet, or
/// [Error::SqlError] if there is some other SQL error.
pub fn get_password_hash(connection: &Connection) -> Result<PasswordHash, Error> {
    connection
        .query_row("SELECT password FROM admin WHERE id = 1", (), |row| {
            let raw_hash: String = row.get(0)?;
            Ok(PasswordHash::new_unchecked(&raw_hash))
        })
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::PasswordNotSet,
            error => error,
        })
}

/// Store `password_hash` as the admin password, replacing any existing one.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn set_password_hash(
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO admin (id, password) VALUES (1, ?1)
        ON CONFLICT(id) DO UPDATE SET password = excluded.password",
        (password_hash.to_string(),),
    )?;

    Ok(())
}
