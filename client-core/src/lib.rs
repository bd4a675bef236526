#![deny(missing_docs, unsafe_code, unstable_features)]
//! # Hedera Ledger Client
//!
//! This crate exposes following functionalities for interacting with a Hedera ledger:
//! - Transaction orchestration (freeze, sign, execute, receipt) bound to an operator
//! - Account creation and HBAR balance queries
//! - Fungible token creation, minting, association and transfers
//! - Consensus topic creation, publication and subscriptions
pub mod hedera_client;
pub mod service;
pub mod subscription;

#[doc(inline)]
pub use hedera_client::HederaClient;
#[doc(inline)]
pub use service::{AccountService, MessageService, TokenService};
#[doc(inline)]
pub use subscription::SubscriptionHandle;
