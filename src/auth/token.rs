//! The admin session token carried in the encrypted auth cookie.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::auth::PasswordHash;

mod datetime_format {
    //! Specifies how to serialize a [time::OffsetDateTime] in a custom format that
    //! avoids serialisations with datetimes containing midnight.
    //!
    //! The default serializer for [time::OffsetDateTime] will serialize
    //! "00:00:00.000000" as "0:00:00.0" and the deserializer would error out
    //! because it expects the hours to be two digits, not one.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// Date time format for the cookie expiry, e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// The session token stored in the encrypted auth cookie.
///
/// A token is only honoured while it has not expired and while the admin
/// password is the one it was issued for.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    /// The [fingerprint](crate::PasswordHash::fingerprint) of the admin
    /// password hash at log-in time.
    pub fingerprint: String,

    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    pub expires_at: OffsetDateTime,
}

impl Token {
    /// Issue a token for `password_hash` that expires `duration` from now.
    ///
    /// The expiry is written in the bookkeeper's local offset so it reads
    /// naturally in the server logs.
    pub fn issue(
        password_hash: &PasswordHash,
        duration: Duration,
        local_offset: UtcOffset,
    ) -> Self {
        Self {
            fingerprint: password_hash.fingerprint(),
            expires_at: OffsetDateTime::now_utc().to_offset(local_offset) + duration,
        }
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    /// Whether the token was issued for the current admin password.
    pub fn was_issued_for(&self, password_hash: &PasswordHash) -> bool {
        self.fingerprint == password_hash.fingerprint()
    }
}
