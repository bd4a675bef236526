//! Transaction orchestration bound to an operator account
use std::sync::Arc;

use tokio::time::{sleep, timeout};

use client_common::ledger::Client;
use client_common::{
    Account, ClientConfig, Error, ErrorKind, FrozenTransaction, Receipt, Result, Status,
    Transaction, TransactionId, TransactionRecord,
};

/// Freezes, signs and executes transactions on behalf of an operator
///
/// The operator pays fees of transactions frozen without an explicit transaction id and signs
/// every executed transaction. Each instance carries its own operator; use
/// [`HederaClient::with_operator`] to get a handle for another actor over the same connection.
pub struct HederaClient<C>
where
    C: Client,
{
    client: Arc<C>,
    config: ClientConfig,
    operator: Option<Account>,
}

impl<C> Clone for HederaClient<C>
where
    C: Client,
{
    fn clone(&self) -> Self {
        HederaClient {
            client: self.client.clone(),
            config: self.config.clone(),
            operator: self.operator.clone(),
        }
    }
}

impl<C> HederaClient<C>
where
    C: Client,
{
    /// Creates a new instance of `HederaClient` without an operator
    pub fn new(client: C, config: ClientConfig) -> Self {
        Self::from_shared(Arc::new(client), config)
    }

    /// Creates a new instance of `HederaClient` over an already shared ledger client
    pub fn from_shared(client: Arc<C>, config: ClientConfig) -> Self {
        HederaClient {
            client,
            config,
            operator: None,
        }
    }

    /// Binds the operator used for all subsequent transactions of this handle
    pub fn set_operator(&mut self, operator: Account) {
        log::debug!("Operator set to {}", operator.id);
        self.operator = Some(operator);
    }

    /// Returns a handle over the same ledger client bound to another operator
    pub fn with_operator(&self, operator: Account) -> Self {
        let mut client = self.clone();
        client.set_operator(operator);
        client
    }

    /// Returns current operator, if any
    #[inline]
    pub fn operator(&self) -> Option<&Account> {
        self.operator.as_ref()
    }

    /// Returns current operator or fails with [`ErrorKind::OperatorNotSet`]
    pub fn require_operator(&self) -> Result<&Account> {
        self.operator.as_ref().ok_or_else(|| {
            Error::new(
                ErrorKind::OperatorNotSet,
                "An operator must be set before executing transactions",
            )
        })
    }

    /// Returns client configuration
    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns underlying ledger client
    #[inline]
    pub fn ledger(&self) -> &C {
        &self.client
    }

    /// Freezes a transaction with node, fee and payer parameters of this client
    ///
    /// Transactions without an explicit transaction id are paid for by the operator.
    pub fn freeze(&self, transaction: Transaction) -> Result<FrozenTransaction> {
        transaction.freeze(
            self.config.node_account_id,
            self.operator.as_ref().map(|operator| &operator.id),
            self.config.max_transaction_fee,
        )
    }

    /// Signs with the operator key, submits once and waits for the receipt
    ///
    /// A receipt carrying a failure status is returned as is. Errors are returned when the
    /// transaction is rejected at precheck or when no final receipt arrives in time.
    pub async fn execute_transaction(&self, transaction: FrozenTransaction) -> Result<Receipt> {
        let operator = self.require_operator()?;
        let transaction = transaction.sign(&operator.private_key);
        let transaction_id = *transaction.transaction_id();

        let response = self.client.submit(&transaction).await?;
        log::debug!(
            "Submitted {} {} to node {}",
            transaction.body().name(),
            transaction_id,
            response.node_account_id
        );

        let receipt = timeout(
            self.config.receipt_timeout,
            self.poll_receipt(&response.transaction_id),
        )
        .await
        .map_err(|_| {
            Error::new(
                ErrorKind::Timeout,
                format!(
                    "No receipt for transaction {} after {:?}",
                    transaction_id, self.config.receipt_timeout
                ),
            )
        })??;

        log::debug!("Receipt of {}: {}", transaction_id, receipt.status);
        Ok(receipt)
    }

    /// Fetches the record of an executed transaction
    pub async fn get_transaction_record(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord> {
        self.client.record(transaction_id).await
    }

    async fn poll_receipt(&self, transaction_id: &TransactionId) -> Result<Receipt> {
        loop {
            let receipt = self.client.receipt(transaction_id).await?;

            if receipt.status != Status::Unknown {
                return Ok(receipt);
            }

            sleep(self.config.receipt_poll_interval).await;
        }
    }
}
