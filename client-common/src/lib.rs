#![deny(missing_docs, unsafe_code, unstable_features)]
//! This crate contains all the common types and utilities used by other `client-*` crates.
pub mod account;
pub mod config;
pub mod error;
pub mod hbar;
pub mod id;
pub mod key;
pub mod ledger;
pub mod receipt;
pub mod transaction;

#[doc(inline)]
pub use account::{Account, AccountTable};
#[doc(inline)]
pub use config::{ClientConfig, Network};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result, ResultExt};
#[doc(inline)]
pub use hbar::Hbar;
#[doc(inline)]
pub use id::{AccountId, EntityId, Timestamp, TokenId, TopicId, TransactionId};
#[doc(inline)]
pub use key::{Key, PrivateKey, PublicKey, Signature, ThresholdKey};
#[doc(inline)]
pub use receipt::{Receipt, Status, TransactionRecord};
#[doc(inline)]
pub use transaction::{
    FrozenTransaction, HbarTransfer, TokenSupplyType, TokenTransfer, Transaction,
    TransactionBody,
};
