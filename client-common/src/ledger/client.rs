use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::ledger::types::{AccountBalance, TokenInfo, TopicMessage, TransactionResponse};
use crate::{
    AccountId, FrozenTransaction, Receipt, Result, Timestamp, TokenId, TopicId, TransactionId,
    TransactionRecord,
};

/// Push stream of messages published to a topic
pub type TopicMessageStream = Pin<Box<dyn Stream<Item = Result<TopicMessage>> + Send>>;

/// Makes remote calls to the ledger network (backend agnostic)
#[async_trait]
pub trait Client: Send + Sync {
    /// Submits a frozen and signed transaction
    ///
    /// Fails before any receipt exists when the node rejects the transaction at precheck.
    async fn submit(&self, transaction: &FrozenTransaction) -> Result<TransactionResponse>;

    /// Fetches the receipt of a submitted transaction
    ///
    /// Status is [`Status::Unknown`] while the transaction has not reached consensus.
    ///
    /// [`Status::Unknown`]: crate::Status::Unknown
    async fn receipt(&self, transaction_id: &TransactionId) -> Result<Receipt>;

    /// Fetches the record of a submitted transaction
    async fn record(&self, transaction_id: &TransactionId) -> Result<TransactionRecord>;

    /// Queries HBAR and token balances of an account
    async fn account_balance(&self, account_id: &AccountId) -> Result<AccountBalance>;

    /// Queries token information
    async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo>;

    /// Opens a stream of messages published to `topic_id` at or after `start_time`
    async fn subscribe_topic(
        &self,
        topic_id: &TopicId,
        start_time: Timestamp,
    ) -> Result<TopicMessageStream>;
}
