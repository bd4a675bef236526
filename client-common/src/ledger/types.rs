//! Query results returned by the ledger
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Hbar, Key, Timestamp, TokenId, TokenSupplyType, TopicId, TransactionId};

/// Acknowledgement of a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResponse {
    /// Id to fetch the receipt and record with
    pub transaction_id: TransactionId,
    /// Node which accepted the transaction
    pub node_account_id: AccountId,
}

/// Point-in-time balances of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account id
    pub account_id: AccountId,
    /// HBAR balance
    pub hbars: Hbar,
    /// Balances of associated tokens
    pub tokens: BTreeMap<TokenId, u64>,
}

impl AccountBalance {
    /// Returns balance of given token, `0` when the account holds none or is not associated
    pub fn token_balance(&self, token_id: &TokenId) -> u64 {
        self.tokens.get(token_id).copied().unwrap_or_default()
    }

    /// Returns `true` if the account is associated with given token
    pub fn is_associated(&self, token_id: &TokenId) -> bool {
        self.tokens.contains_key(token_id)
    }
}

/// Token properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Token id
    pub token_id: TokenId,
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Number of decimal places
    pub decimals: u32,
    /// Units in circulation
    pub total_supply: u64,
    /// Supply ceiling, `0` for infinite supply
    pub max_supply: u64,
    /// Supply policy
    pub supply_type: TokenSupplyType,
    /// Treasury account
    pub treasury_account_id: AccountId,
    /// Admin key
    pub admin_key: Option<Key>,
    /// Supply key
    pub supply_key: Option<Key>,
    /// Freeze key
    pub freeze_key: Option<Key>,
}

/// Message published to a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessage {
    /// Topic the message was published to
    pub topic_id: TopicId,
    /// Consensus time of the message
    pub consensus_timestamp: Timestamp,
    /// Position of the message in the topic, starting at 1
    pub sequence_number: u64,
    /// Raw contents
    pub contents: Vec<u8>,
}

impl TopicMessage {
    /// Decodes contents as UTF-8 text, replacing invalid sequences
    pub fn contents_as_text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}
