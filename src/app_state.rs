//! The state shared by every request handler.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize, timezone::get_local_offset};

/// The state of the REST server.
///
/// Handlers do not take the whole state, they each declare a smaller state
/// struct that is built from this one with [FromRef].
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key for encrypting the session cookie.
    pub cookie_key: Key,

    /// How long a session lasts after logging in.
    pub cookie_duration: Duration,

    /// The canonical name of the bookkeeper's timezone, e.g. "Asia/Riyadh".
    pub local_timezone: String,

    /// The ledger database. All ledger writes go through this one connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create the server state, creating any missing tables in `db_connection`.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known
    /// canonical timezone name, or an SQL error if the tables cannot be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the cookie key from the server secret.
///
/// The same secret always gives the same key, so sessions survive a restart.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
