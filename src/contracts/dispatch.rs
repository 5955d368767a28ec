use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TwoPartyContract;
use crate::error::{ChaincodeError, Result};
use crate::store::LedgerStore;

/// Operation names understood by the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Init,
    Transfer,
    Delete,
    Query,
}

impl FromStr for Function {
    type Err = ChaincodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "init" => Ok(Function::Init),
            "invoke" | "transfer" => Ok(Function::Transfer),
            "delete" => Ok(Function::Delete),
            "query" => Ok(Function::Query),
            other => Err(ChaincodeError::UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Function::Init => "init",
            Function::Transfer => "invoke",
            Function::Delete => "delete",
            Function::Query => "query",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub name: String,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&ChaincodeError> for ErrorResponse {
    fn from(err: &ChaincodeError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Successful outcome of a dispatched call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// A mutating operation completed; there is no payload.
    Committed,
    Balance(QueryResponse),
}

impl Response {
    /// Bytes handed back to the platform: empty for writes, the JSON query
    /// response otherwise.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Response::Committed => Vec::new(),
            // a struct of two strings always serializes
            Response::Balance(q) => serde_json::to_vec(q).unwrap_or_default(),
        }
    }
}

impl TwoPartyContract {
    /// Routes any of the four operations by name.
    pub fn dispatch<A: AsRef<str>>(
        &self,
        store: &mut dyn LedgerStore,
        function: &str,
        args: &[A],
    ) -> Result<Response> {
        self.route(store, function.parse()?, args)
    }

    /// Write entry point: init, transfer and delete. Reads go through
    /// [`TwoPartyContract::query`].
    pub fn invoke<A: AsRef<str>>(
        &self,
        store: &mut dyn LedgerStore,
        function: &str,
        args: &[A],
    ) -> Result<()> {
        match function.parse::<Function>()? {
            Function::Query => Err(ChaincodeError::UnknownOperation(function.to_string())),
            parsed => self.route(store, parsed, args).map(|_| ()),
        }
    }

    /// Same routing as [`TwoPartyContract::invoke`].
    pub fn run<A: AsRef<str>>(
        &self,
        store: &mut dyn LedgerStore,
        function: &str,
        args: &[A],
    ) -> Result<()> {
        self.invoke(store, function, args)
    }

    /// Read entry point; `function` must be `"query"`.
    pub fn query<A: AsRef<str>>(
        &self,
        store: &dyn LedgerStore,
        function: &str,
        args: &[A],
    ) -> Result<QueryResponse> {
        if function != "query" {
            return Err(ChaincodeError::InvalidQueryFunction(function.to_string()));
        }
        self.balance_of(store, args)
    }

    fn route<A: AsRef<str>>(
        &self,
        store: &mut dyn LedgerStore,
        function: Function,
        args: &[A],
    ) -> Result<Response> {
        debug!(%function, args = args.len(), "dispatch");
        match function {
            Function::Init => self.init(store, args).map(|_| Response::Committed),
            Function::Transfer => self.transfer(store, args).map(|_| Response::Committed),
            Function::Delete => self.delete(store, args).map(|_| Response::Committed),
            Function::Query => self.balance_of(store, args).map(Response::Balance),
        }
    }
}
