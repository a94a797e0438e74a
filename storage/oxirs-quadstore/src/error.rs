//! Error types for the OxiRS quad store

use thiserror::Error;

/// Quad store error type
#[derive(Error, Debug)]
pub enum StoreError {
    /// A term appears in a position its kind cannot occupy
    #[error("Unsupported term kind: {kind} cannot be used as {position}")]
    UnsupportedTermKind {
        /// Kind of the offending term
        kind: &'static str,
        /// Statement position the term was used in
        position: &'static str,
    },

    /// Stored bytes do not match any canonical term form
    #[error("Invalid term encoding: {0}")]
    InvalidTermEncoding(String),

    /// Entity id exceeds the collection's issued maximum or is reserved
    #[error("Invalid entity id {id} (highest issued: {max})")]
    InvalidEntityId {
        /// The rejected id
        id: u64,
        /// Highest id issued in the collection
        max: u64,
    },

    /// An index entry references an id with no dictionary entry
    #[error("Dangling reference to id {0}")]
    DanglingReference(u64),

    /// Operation attempted after commit or cancel
    #[error("Transaction is closed")]
    TransactionClosed,

    /// Operation attempted on a closed store
    #[error("Store is closed")]
    StoreClosed,

    /// Collection does not exist
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Collection name rejected
    #[error("Invalid collection name: {0:?}")]
    InvalidCollectionName(String),

    /// Term value rejected at construction
    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    /// Stored key has an unexpected layout
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Failure reported by the key/value engine
    #[error("Engine error: {0}")]
    Engine(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for quad store operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::Engine(err.into_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}
