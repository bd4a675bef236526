//! Accounts and the pre-configured account table
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{AccountId, ErrorKind, PrivateKey, PublicKey, Result, ResultExt};

/// Environment variable naming the JSON file holding the account table
pub const ACCOUNTS_ENV: &str = "HEDERA_CLIENT_ACCOUNTS";

/// Ledger account together with the private key controlling it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account id
    pub id: AccountId,
    /// Private key of the account
    pub private_key: PrivateKey,
}

impl Account {
    /// Creates a new account record
    #[inline]
    pub fn new(id: AccountId, private_key: PrivateKey) -> Self {
        Account { id, private_key }
    }

    /// Returns public key of the account
    #[inline]
    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }
}

/// Fixed list of accounts loaded once at startup
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct AccountTable {
    accounts: Vec<Account>,
}

impl AccountTable {
    /// Creates a table from given accounts
    pub fn new(accounts: Vec<Account>) -> Self {
        AccountTable { accounts }
    }

    /// Parses a table from JSON: `[{"id": "0.0.1001", "privateKey": "302e..."}]`
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).chain(|| {
            (
                ErrorKind::ConfigError,
                "Unable to deserialize account table from JSON",
            )
        })
    }

    /// Reads a table from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).chain(|| {
            (
                ErrorKind::IoError,
                format!("Unable to read account table at {}", path.display()),
            )
        })?;

        Self::from_json(&json)
    }

    /// Reads a table from the file named by `HEDERA_CLIENT_ACCOUNTS`
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(ACCOUNTS_ENV).chain(|| {
            (
                ErrorKind::ConfigError,
                format!("Environment variable {} is not set", ACCOUNTS_ENV),
            )
        })?;

        log::debug!("Loading account table from {}", path);
        Self::from_file(path)
    }

    /// Returns all accounts in table order
    #[inline]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Returns account with given id
    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == *id)
    }

    /// Returns number of accounts
    #[inline]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` if the table has no accounts
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
