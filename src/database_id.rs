//! Database ID type definitions.

/// Alias for the integer type used for mapping to party IDs.
pub type PartyId = i64;

/// Alias for the integer type used for mapping to transaction IDs.
pub type TransactionId = i64;
