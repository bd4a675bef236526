//! Handle over a running topic subscription
use futures::StreamExt;
use tokio::task::JoinHandle;

use client_common::ledger::TopicMessageStream;
use client_common::TopicId;

/// Running subscription to a topic
///
/// The subscription is cancelled by [`SubscriptionHandle::unsubscribe`] or when the handle is
/// dropped. It also ends on its own at end of stream or on the first stream error; there is no
/// reconnection.
#[derive(Debug)]
pub struct SubscriptionHandle {
    topic_id: TopicId,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Spawns a task feeding the text of every message of `stream` to `on_message`
    ///
    /// Messages with a sequence number not greater than the last delivered one are skipped.
    pub(crate) fn spawn<F>(
        topic_id: TopicId,
        mut stream: TopicMessageStream,
        mut on_message: F,
    ) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut last_sequence_number = 0;

            while let Some(item) = stream.next().await {
                match item {
                    Ok(message) => {
                        if message.sequence_number <= last_sequence_number {
                            log::debug!(
                                "Skipping duplicate message {} of topic {}",
                                message.sequence_number,
                                topic_id
                            );
                            continue;
                        }

                        last_sequence_number = message.sequence_number;
                        on_message(message.contents_as_text());
                    }
                    Err(err) => {
                        log::warn!("Subscription to topic {} failed: {}", topic_id, err);
                        return;
                    }
                }
            }

            log::debug!("Subscription to topic {} reached end of stream", topic_id);
        });

        SubscriptionHandle { topic_id, task }
    }

    /// Returns the subscribed topic
    #[inline]
    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    /// Returns `true` once the subscription has ended, for whatever reason
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the subscription
    pub fn unsubscribe(self) {
        log::debug!("Unsubscribing from topic {}", self.topic_id);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
