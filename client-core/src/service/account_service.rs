use client_common::ledger::Client;
use client_common::transaction::AccountCreate;
use client_common::{
    Account, AccountId, AccountTable, ErrorKind, Hbar, PrivateKey, Result, ResultExt, Transaction,
    TransactionBody,
};

use crate::HederaClient;

/// Queries HBAR balances and creates accounts funded by the operator
pub struct AccountService<C>
where
    C: Client,
{
    client: HederaClient<C>,
}

impl<C> AccountService<C>
where
    C: Client,
{
    /// Creates a new instance of account service
    #[inline]
    pub fn new(client: HederaClient<C>) -> Self {
        AccountService { client }
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

    /// Returns current HBAR balance of an account
    pub async fn get_hbar_balance(&self, account_id: &AccountId) -> Result<Hbar> {
        let balance = self.client.ledger().account_balance(account_id).await?;
        Ok(balance.hbars)
    }

    /// Creates an account under a freshly generated key, funded by the operator
    ///
    /// Fails when the ledger rejects the creation, e.g. when the operator cannot cover the
    /// initial balance and the fee.
    pub async fn create_account(&self, initial_balance: Hbar) -> Result<Account> {
        let private_key = PrivateKey::generate();

        let transaction = self.client.freeze(Transaction::new(TransactionBody::AccountCreate(
            AccountCreate {
                key: private_key.public_key().into(),
                initial_balance,
            },
        )))?;

        let receipt = self
            .client
            .execute_transaction(transaction)
            .await?
            .validate_status()?;

        let account_id = receipt.account_id.chain(|| {
            (
                ErrorKind::EntityNotFound,
                "Account creation receipt carries no account id",
            )
        })?;

        log::info!("Created account {} with {}", account_id, initial_balance);
        Ok(Account::new(account_id, private_key))
    }

    /// Creates `count` accounts one after another, each with `initial_balance`
    pub async fn create_accounts(
        &self,
        count: usize,
        initial_balance: Hbar,
    ) -> Result<Vec<Account>> {
        let mut accounts = Vec::with_capacity(count);

        for _ in 0..count {
            accounts.push(self.create_account(initial_balance).await?);
        }

        Ok(accounts)
    }

    /// Returns the first account of `table` holding strictly more than `minimum`
    pub async fn find_account_with_balance<'a>(
        &self,
        table: &'a AccountTable,
        minimum: Hbar,
    ) -> Result<Option<&'a Account>> {
        for account in table.accounts() {
            if self.get_hbar_balance(&account.id).await? > minimum {
                return Ok(Some(account));
            }
        }

        Ok(None)
    }
}
