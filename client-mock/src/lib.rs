//! In-memory ledger implementing [`Client`], for tests and local development
//!
//! Transactions reach consensus as soon as they are submitted. Receipts are withheld (reported as
//! [`Status::Unknown`]) until the configured consensus delay has elapsed.
mod state;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::ready;
use futures::stream::{self, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use client_common::ledger::types::{AccountBalance, TokenInfo, TopicMessage, TransactionResponse};
use client_common::ledger::{Client, TopicMessageStream};
use client_common::{
    Account, AccountId, Error, ErrorKind, FrozenTransaction, Hbar, Key, PrivateKey, Receipt,
    Result, Status, Timestamp, TokenId, TopicId, TransactionId, TransactionRecord,
};

use crate::state::{LedgerState, StoredRecord};

/// Behaviour of a [`MockLedger`]
#[derive(Debug, Clone)]
pub struct MockLedgerConfig {
    /// Flat fee charged for every transaction passing precheck
    pub transaction_fee: Hbar,
    /// Time between submission and availability of the receipt
    pub consensus_delay: Duration,
    /// Node id reported in transaction responses
    pub node_account_id: AccountId,
    /// Entity number of the first account, token or topic created
    pub first_entity_num: u64,
}

impl Default for MockLedgerConfig {
    fn default() -> Self {
        MockLedgerConfig {
            transaction_fee: Hbar::from_tinybars(5_000_000),
            consensus_delay: Duration::from_millis(0),
            node_account_id: AccountId::from_num(3),
            first_entity_num: 1001,
        }
    }
}

/// Shared in-memory ledger. Clones operate on the same state.
#[derive(Clone)]
pub struct MockLedger {
    config: Arc<MockLedgerConfig>,
    state: Arc<Mutex<LedgerState>>,
}

impl Default for MockLedger {
    fn default() -> Self {
        MockLedger::new(MockLedgerConfig::default())
    }
}

impl MockLedger {
    /// Creates an empty ledger
    pub fn new(config: MockLedgerConfig) -> MockLedger {
        let state = LedgerState::new(config.first_entity_num);

        MockLedger {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Returns the ledger configuration
    pub fn config(&self) -> &MockLedgerConfig {
        &self.config
    }

    /// Creates a funded account with a freshly generated key
    pub fn create_account(&self, balance: Hbar) -> Result<Account> {
        let private_key = PrivateKey::generate();
        let mut state = self.state()?;
        let account_id = AccountId::from_num(state.next_entity_num());

        state.insert_account(account_id, private_key.public_key().into(), balance);
        log::debug!("Funded account {} with {}", account_id, balance);

        Ok(Account::new(account_id, private_key))
    }

    /// Inserts (or replaces) an account guarded by `key`
    pub fn insert_account(&self, account_id: AccountId, key: Key, balance: Hbar) -> Result<()> {
        self.state()?.insert_account(account_id, key, balance);
        Ok(())
    }

    /// Returns all messages published to a topic, in sequence order
    pub fn messages(&self, topic_id: &TopicId) -> Result<Vec<TopicMessage>> {
        let state = self.state()?;
        let topic = state
            .topics
            .get(topic_id)
            .ok_or_else(|| topic_not_found(topic_id))?;

        Ok(topic.messages.clone())
    }

    /// Returns the memo a topic was created with
    pub fn topic_memo(&self, topic_id: &TopicId) -> Result<String> {
        let state = self.state()?;
        let topic = state
            .topics
            .get(topic_id)
            .ok_or_else(|| topic_not_found(topic_id))?;

        Ok(topic.memo.clone())
    }

    /// Deletes a topic. Open subscriptions to it reach end of stream.
    pub fn close_topic(&self, topic_id: &TopicId) -> Result<()> {
        self.state()?
            .topics
            .remove(topic_id)
            .map(|_| ())
            .ok_or_else(|| topic_not_found(topic_id))
    }

    fn state(&self) -> Result<MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|_| Error::new(ErrorKind::LockError, "Mock ledger state lock poisoned"))
    }

    fn has_reached_consensus(&self, stored: &StoredRecord) -> bool {
        stored.submitted_at.elapsed() >= self.config.consensus_delay
    }
}

#[async_trait]
impl Client for MockLedger {
    async fn submit(&self, transaction: &FrozenTransaction) -> Result<TransactionResponse> {
        let transaction_id = *transaction.transaction_id();

        self.state()?
            .submit(transaction, self.config.transaction_fee)
            .map_err(|status| {
                log::warn!("{} failed precheck with {}", transaction_id, status);
                Error::new(
                    ErrorKind::PrecheckFailed,
                    format!("Transaction {} rejected at precheck", transaction_id),
                )
                .with_status(status)
            })?;

        Ok(TransactionResponse {
            transaction_id,
            node_account_id: self.config.node_account_id,
        })
    }

    async fn receipt(&self, transaction_id: &TransactionId) -> Result<Receipt> {
        let state = self.state()?;
        let stored = state
            .records
            .get(transaction_id)
            .ok_or_else(|| transaction_not_found(transaction_id))?;

        if self.has_reached_consensus(stored) {
            Ok(stored.record.receipt.clone())
        } else {
            Ok(Receipt::new(Status::Unknown))
        }
    }

    async fn record(&self, transaction_id: &TransactionId) -> Result<TransactionRecord> {
        let state = self.state()?;

        match state.records.get(transaction_id) {
            Some(stored) if self.has_reached_consensus(stored) => Ok(stored.record.clone()),
            _ => Err(transaction_not_found(transaction_id)),
        }
    }

    async fn account_balance(&self, account_id: &AccountId) -> Result<AccountBalance> {
        self.state()?.balance(account_id).ok_or_else(|| {
            Error::new(
                ErrorKind::EntityNotFound,
                format!("Account {} not found", account_id),
            )
            .with_status(Status::InvalidAccountId)
        })
    }

    async fn token_info(&self, token_id: &TokenId) -> Result<TokenInfo> {
        self.state()?.tokens.get(token_id).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::EntityNotFound,
                format!("Token {} not found", token_id),
            )
            .with_status(Status::InvalidTokenId)
        })
    }

    async fn subscribe_topic(
        &self,
        topic_id: &TopicId,
        start_time: Timestamp,
    ) -> Result<TopicMessageStream> {
        // history and receiver are taken under the same lock so no message falls in between
        let (history, receiver) = {
            let state = self.state()?;
            let topic = state
                .topics
                .get(topic_id)
                .ok_or_else(|| topic_not_found(topic_id))?;

            let history = topic
                .messages
                .iter()
                .filter(|message| message.consensus_timestamp >= start_time)
                .cloned()
                .collect::<Vec<_>>();

            (history, topic.sender.subscribe())
        };

        let topic_id = *topic_id;
        let live = stream::unfold(receiver, move |mut receiver| async move {
            match receiver.recv().await {
                Ok(message) => Some((Ok(message), receiver)),
                Err(RecvError::Lagged(skipped)) => Some((
                    Err(Error::new(
                        ErrorKind::SubscriptionError,
                        format!(
                            "Subscription to topic {} lagged behind by {} messages",
                            topic_id, skipped
                        ),
                    )),
                    receiver,
                )),
                Err(RecvError::Closed) => None,
            }
        })
        .filter(move |item| {
            ready(match item {
                Ok(message) => message.consensus_timestamp >= start_time,
                Err(_) => true,
            })
        });

        Ok(Box::pin(stream::iter(history.into_iter().map(Ok)).chain(live)))
    }
}

fn transaction_not_found(transaction_id: &TransactionId) -> Error {
    Error::new(
        ErrorKind::TransactionNotFound,
        format!("No record of transaction {}", transaction_id),
    )
    .with_status(Status::ReceiptNotFound)
}

fn topic_not_found(topic_id: &TopicId) -> Error {
    Error::new(
        ErrorKind::EntityNotFound,
        format!("Topic {} not found", topic_id),
    )
    .with_status(Status::InvalidTopicId)
}
