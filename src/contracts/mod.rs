//! The two-party ledger contract.
//!
//! A [`TwoPartyContract`] holds configuration only. Each operation receives
//! the store for the length of one call, reads the keys it needs, and writes
//! back decimal-encoded balances.

use tracing::{debug, error, info, warn};

use crate::config::{ContractConfig, OverdraftPolicy, WriteMode};
use crate::error::{ChaincodeError, Result, StoreError};
use crate::ledger::{
    checked_move, decode_balance, encode_balance, parse_amount, parse_balance, Balance,
};
use crate::store::LedgerStore;

mod dispatch;

pub use dispatch::{ErrorResponse, Function, QueryResponse, Response};

#[derive(Clone, Debug, Default)]
pub struct TwoPartyContract {
    config: ContractConfig,
}

fn expect_args<A: AsRef<str>>(args: &[A], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(ChaincodeError::InvalidArgumentCount {
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

impl TwoPartyContract {
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    /// `[accountA, balanceA, accountB, balanceB]`
    ///
    /// Overwrites whatever the store held for either account. If the second
    /// write fails the first one stays applied.
    pub fn init<A: AsRef<str>>(&self, store: &mut dyn LedgerStore, args: &[A]) -> Result<()> {
        expect_args(args, 4)?;
        let (account_a, account_b) = (args[0].as_ref(), args[2].as_ref());
        let balance_a = parse_balance(account_a, args[1].as_ref())?;
        let balance_b = parse_balance(account_b, args[3].as_ref())?;
        debug!(account_a, balance_a, account_b, balance_b, "init");

        write_balance(store, account_a, balance_a)?;
        write_balance(store, account_b, balance_b)?;
        info!(account_a, balance_a, account_b, balance_b, "accounts initialized");
        Ok(())
    }

    /// `[source, destination, amount]`
    pub fn transfer<A: AsRef<str>>(
        &self,
        store: &mut dyn LedgerStore,
        args: &[A],
    ) -> Result<()> {
        expect_args(args, 3)?;
        let (source, destination) = (args[0].as_ref(), args[1].as_ref());
        debug!(source, destination, amount = args[2].as_ref(), "transfer");

        let source_balance = read_balance(store, source)?;
        let destination_balance = read_balance(store, destination)?;
        let amount = parse_amount(args[2].as_ref())?;
        if source == destination {
            return Err(ChaincodeError::SelfTransfer(source.to_string()));
        }

        if self.config.overdraft == OverdraftPolicy::Deny {
            if amount < 0 {
                return Err(ChaincodeError::NegativeAmount(amount));
            }
            if source_balance < amount {
                return Err(ChaincodeError::InsufficientFunds {
                    account: source.to_string(),
                    balance: source_balance,
                    amount,
                });
            }
        }
        let (new_source, new_destination) = checked_move(
            source,
            source_balance,
            destination,
            destination_balance,
            amount,
        )?;

        write_balance(store, source, new_source)?;
        if let Err(err) = store.put(destination, &encode_balance(new_destination)) {
            return Err(self.recover_source(store, source, source_balance, destination, err));
        }
        info!(source, new_source, destination, new_destination, amount, "transfer committed");
        Ok(())
    }

    /// `[account]`. Removing an absent account succeeds.
    pub fn delete<A: AsRef<str>>(&self, store: &mut dyn LedgerStore, args: &[A]) -> Result<()> {
        expect_args(args, 1)?;
        let account = args[0].as_ref();
        debug!(account, "delete");
        store
            .delete(account)
            .map_err(|source| ChaincodeError::StoreDeleteFailure {
                account: account.to_string(),
                source,
            })?;
        info!(account, "account deleted");
        Ok(())
    }

    /// `[account]`. Read-only; the amount is the stored string as written,
    /// after checking that it holds an integer.
    pub fn balance_of<A: AsRef<str>>(
        &self,
        store: &dyn LedgerStore,
        args: &[A],
    ) -> Result<QueryResponse> {
        expect_args(args, 1)?;
        let account = args[0].as_ref();
        let bytes = read_stored(store, account)?;
        decode_balance(account, &bytes)?;
        let response = QueryResponse {
            name: account.to_string(),
            amount: String::from_utf8_lossy(&bytes).into_owned(),
        };
        debug!(account, amount = %response.amount, "query");
        Ok(response)
    }

    /// Called after the destination write of a transfer failed. The source
    /// already holds its debited value.
    fn recover_source(
        &self,
        store: &mut dyn LedgerStore,
        source: &str,
        previous: Balance,
        destination: &str,
        cause: StoreError,
    ) -> ChaincodeError {
        let failure = ChaincodeError::StoreWriteFailure {
            account: destination.to_string(),
            source: cause,
        };
        match self.config.write_mode {
            WriteMode::Sequential => {
                warn!(source, destination, "destination write failed, source stays debited");
                failure
            }
            WriteMode::Compensating => {
                warn!(source, destination, error = %failure, "destination write failed, restoring source");
                match store.put(source, &encode_balance(previous)) {
                    Ok(()) => failure,
                    Err(rollback) => {
                        error!(source, error = %rollback, "failed to restore source balance");
                        ChaincodeError::PartialCommit {
                            account: source.to_string(),
                            source: rollback,
                        }
                    }
                }
            }
        }
    }
}

fn read_stored(store: &dyn LedgerStore, account: &str) -> Result<Vec<u8>> {
    store
        .get(account)
        .map_err(|source| ChaincodeError::StoreReadFailure {
            account: account.to_string(),
            source,
        })?
        .ok_or_else(|| ChaincodeError::AccountNotFound(account.to_string()))
}

fn read_balance(store: &dyn LedgerStore, account: &str) -> Result<Balance> {
    decode_balance(account, &read_stored(store, account)?)
}

fn write_balance(store: &mut dyn LedgerStore, account: &str, balance: Balance) -> Result<()> {
    store
        .put(account, &encode_balance(balance))
        .map_err(|source| ChaincodeError::StoreWriteFailure {
            account: account.to_string(),
            source,
        })
}
