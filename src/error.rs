use thiserror::Error;

use crate::ledger::{AccountId, Balance};

/// Failure reported by a [`LedgerStore`](crate::store::LedgerStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem or transport failure underneath the store.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted key space could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Serialization(String),

    /// The backend refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Canonical error type returned by every contract operation.
#[derive(Debug, Error)]
pub enum ChaincodeError {
    #[error("incorrect number of arguments: expecting {expected}, got {got}")]
    InvalidArgumentCount { expected: usize, got: usize },

    #[error("expecting integer value for asset holding of {account}, got {value:?}")]
    InvalidBalanceFormat { account: AccountId, value: String },

    #[error("expecting integer transfer amount, got {0:?}")]
    InvalidAmountFormat(String),

    #[error("entity not found: {0}")]
    AccountNotFound(AccountId),

    #[error("received unknown function invocation: {0:?}")]
    UnknownOperation(String),

    #[error("invalid query function name {0:?}, expecting \"query\"")]
    InvalidQueryFunction(String),

    #[error("failed to get state for {account}: {source}")]
    StoreReadFailure {
        account: AccountId,
        #[source]
        source: StoreError,
    },

    #[error("failed to put state for {account}: {source}")]
    StoreWriteFailure {
        account: AccountId,
        #[source]
        source: StoreError,
    },

    #[error("failed to delete state for {account}: {source}")]
    StoreDeleteFailure {
        account: AccountId,
        #[source]
        source: StoreError,
    },

    #[error("stored value for {account} is not an integer balance: {value:?}")]
    CorruptBalance { account: AccountId, value: String },

    #[error("balance of {account} would overflow")]
    BalanceOverflow { account: AccountId },

    #[error("source and destination are the same account: {0}")]
    SelfTransfer(AccountId),

    #[error("negative transfer amount {0} rejected by overdraft policy")]
    NegativeAmount(Balance),

    #[error("insufficient funds in {account}: balance {balance}, amount {amount}")]
    InsufficientFunds {
        account: AccountId,
        balance: Balance,
        amount: Balance,
    },

    /// The destination write failed and restoring the source failed too.
    #[error("transfer partially committed: {account} left modified after {source}")]
    PartialCommit {
        account: AccountId,
        #[source]
        source: StoreError,
    },
}

pub type Result<T> = std::result::Result<T, ChaincodeError>;
