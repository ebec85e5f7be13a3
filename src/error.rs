//! Error types for the tokr client library

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Result type for tokr client operations
pub type TokrResult<T> = Result<T, TokrError>;

/// Errors that can occur when building, encoding or submitting tokr instructions
#[derive(Debug, Error)]
pub enum TokrError {
    /// A value of a kind that cannot be used as a PDA seed
    #[error("Invalid seed kind at position {index}: {kind} values cannot be used as seeds")]
    InvalidSeedKind { index: usize, kind: &'static str },

    /// A seed longer than the runtime allows
    #[error("Seed at position {index} is {len} bytes, the maximum is {max}")]
    MaxSeedLengthExceeded { index: usize, len: usize, max: usize },

    /// Too many seeds for a single derivation
    #[error("{count} seeds supplied, the maximum is {max} including the bump")]
    MaxSeedsExceeded { count: usize, max: usize },

    /// No bump in [0, 255] produced an off-curve address
    #[error("Unable to find a viable program address bump seed")]
    AddressDerivationExhausted,

    /// The candidate address for an explicit bump lies on the ed25519 curve
    #[error("Provided seeds produce an address on the ed25519 curve")]
    OnCurveAddress,

    /// A record field does not match the declared schema
    #[error("Schema mismatch in {schema}.{field}: expected {expected}, found {found}")]
    SchemaMismatch {
        schema: &'static str,
        field: String,
        expected: String,
        found: String,
    },

    /// A typed read of a record field found nothing or a value of another kind
    #[error("Record field {field}: expected {expected}, found {found}")]
    RecordField {
        field: String,
        expected: String,
        found: String,
    },

    /// Failed to decode bytes with a schema
    #[error("Failed to deserialize {schema}: {reason}")]
    DeserializationError { schema: &'static str, reason: String },

    /// Failed to serialize data
    #[error("Failed to serialize data: {0}")]
    SerializationError(std::io::Error),

    /// Invalid program ID
    #[error("Invalid program ID: {0}")]
    InvalidProgramId(String),

    /// No program id configured for a domain
    #[error("No {0} program id configured for this cluster")]
    MissingProgram(&'static str),

    /// An identity status code outside the known range
    #[error("Unknown identity status code: {0}")]
    UnknownStatus(u8),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    /// Invalid account data
    #[error("Invalid account data: {0}")]
    InvalidAccountData(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error from the Solana client
    #[error("Solana client error: {0}")]
    ClientError(#[from] solana_client::client_error::ClientError),

    /// Opaque failure reported by a transaction submitter
    #[error("Transaction submission failed: {0}")]
    Submission(String),
}

impl From<std::io::Error> for TokrError {
    fn from(err: std::io::Error) -> Self {
        TokrError::SerializationError(err)
    }
}

impl From<serde_json::Error> for TokrError {
    fn from(err: serde_json::Error) -> Self {
        TokrError::Config(err.to_string())
    }
}
