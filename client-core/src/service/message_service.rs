use client_common::ledger::Client;
use client_common::transaction::{TopicCreate, TopicMessageSubmit};
use client_common::{
    Key, PrivateKey, Receipt, Result, Timestamp, TopicId, Transaction, TransactionBody,
};

use crate::{HederaClient, SubscriptionHandle};

/// Creates consensus topics, publishes to them and follows their messages
pub struct MessageService<C>
where
    C: Client,
{
    client: HederaClient<C>,
}

impl<C> MessageService<C>
where
    C: Client,
{
    /// Creates a new instance of message service
    #[inline]
    pub fn new(client: HederaClient<C>) -> Self {
        MessageService { client }
    }

    /// Returns underlying orchestrator
    #[inline]
    pub fn client(&self) -> &HederaClient<C> {
        &self.client
    }

    /// Returns underlying orchestrator for rebinding the operator
    #[inline]
    pub fn client_mut(&mut self) -> &mut HederaClient<C> {
        &mut self.client
    }

    /// Creates a topic whose messages must be authorized by `submit_key`
    ///
    /// With a [`Key::Threshold`] submit key, publishers sign with a quorum of its keys.
    pub async fn create_topic(&self, memo: &str, submit_key: Key) -> Result<Receipt> {
        let transaction = self.client.freeze(Transaction::new(TransactionBody::TopicCreate(
            TopicCreate {
                memo: memo.to_owned(),
                admin_key: None,
                submit_key: Some(submit_key),
            },
        )))?;

        let receipt = self.client.execute_transaction(transaction).await?;

        if let Some(topic_id) = receipt.topic_id {
            log::info!("Created topic {} ({})", topic_id, memo);
        }

        Ok(receipt)
    }

    /// Publishes a text message, signed with `signing_key` when given
    pub async fn publish_message(
        &self,
        topic_id: &TopicId,
        message: &str,
        signing_key: Option<&PrivateKey>,
    ) -> Result<Receipt> {
        let mut transaction = self.client.freeze(Transaction::new(
            TransactionBody::TopicMessageSubmit(TopicMessageSubmit {
                topic_id: *topic_id,
                message: message.as_bytes().to_vec(),
            }),
        ))?;

        if let Some(signing_key) = signing_key {
            transaction = transaction.sign(signing_key);
        }

        self.client.execute_transaction(transaction).await
    }

    /// Calls `on_message` with the text of every message published at or after `start_time`
    ///
    /// [`Timestamp::EPOCH`] starts at the first message of the topic. Must be called within a
    /// tokio runtime. The subscription lasts until the returned handle is unsubscribed or
    /// dropped, the stream ends or fails.
    pub async fn subscribe_to_topic<F>(
        &self,
        topic_id: &TopicId,
        start_time: Timestamp,
        on_message: F,
    ) -> Result<SubscriptionHandle>
    where
        F: FnMut(String) + Send + 'static,
    {
        let stream = self
            .client
            .ledger()
            .subscribe_topic(topic_id, start_time)
            .await?;

        log::debug!("Subscribed to topic {} from {}", topic_id, start_time);
        Ok(SubscriptionHandle::spawn(*topic_id, stream, on_message))
    }
}
