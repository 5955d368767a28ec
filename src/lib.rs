//! Two-party balance ledger chaincode.
//!
//! The crate is organised around a small number of pieces:
//!
//! * [`contracts`]: the state-transition functions (init, transfer,
//!   delete, query) and the name based dispatcher in front of them.
//! * [`store`]: the [`store::LedgerStore`] seam the contract reads and
//!   writes through, with in-memory and file-backed implementations.
//! * [`ledger`]: balance encoding helpers and the ledger state root.
//! * [`config`]: overdraft and write-recovery settings.
//!
//! ```
//! use twoparty_chaincode::{store::MemoryStore, TwoPartyContract};
//!
//! let contract = TwoPartyContract::default();
//! let mut store = MemoryStore::new();
//! contract.init(&mut store, &["alice", "100", "bob", "50"]).unwrap();
//! contract.transfer(&mut store, &["alice", "bob", "30"]).unwrap();
//! assert_eq!(contract.query(&store, "query", &["bob"]).unwrap().amount, "80");
//! ```

pub mod config;
pub mod contracts;
pub mod ledger;
pub mod store;

mod error;

pub use config::{ContractConfig, OverdraftPolicy, WriteMode};
pub use contracts::{ErrorResponse, Function, QueryResponse, Response, TwoPartyContract};
pub use error::{ChaincodeError, Result, StoreError};
