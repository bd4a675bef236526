use client_common::ledger::types::TokenInfo;
use client_common::ledger::Client;
use client_common::transaction::{TokenAssociate, TokenCreate, TokenMint, Transfer};
use client_common::{
    Account, AccountId, ErrorKind, FrozenTransaction, Receipt, Result, ResultExt, TokenId,
    TokenSupplyType, Transaction, TransactionBody, TransactionId,
};

use crate::HederaClient;

/// Creates, mints, associates and transfers fungible tokens
///
/// Failing receipts (e.g. `TOKEN_MAX_SUPPLY_REACHED`) are returned to the caller, not turned
/// into errors.
pub struct TokenService<C>
where
    C: Client,
{
    client: HederaClient<C>,
}

impl<C> TokenService<C>
where
    C: Client,
{
    /// Creates a new instance of token service
    #[inline]
    pub fn new(client: HederaClient<C>) -> Self {
        TokenService { client }
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

    /// Creates a fungible token held by `treasury`
    ///
    /// The treasury key becomes admin, supply and freeze key. With `fixed_supply` the max supply
    /// is pinned to `initial_supply`, so any later mint is rejected by the ledger.
    pub async fn create_token(
        &self,
        name: &str,
        symbol: &str,
        decimals: u32,
        initial_supply: u64,
        treasury: &Account,
        fixed_supply: bool,
    ) -> Result<Receipt> {
        let treasury_key = treasury.public_key();
        let (supply_type, max_supply) = if fixed_supply {
            (TokenSupplyType::Finite, initial_supply)
        } else {
            (TokenSupplyType::Infinite, 0)
        };

        let transaction = self.client.freeze(Transaction::new(TransactionBody::TokenCreate(
            TokenCreate {
                name: name.to_owned(),
                symbol: symbol.to_owned(),
                decimals,
                initial_supply,
                treasury_account_id: treasury.id,
                admin_key: Some(treasury_key.into()),
                supply_key: Some(treasury_key.into()),
                freeze_key: Some(treasury_key.into()),
                supply_type,
                max_supply,
            },
        )))?;

        let receipt = self
            .client
            .execute_transaction(transaction.sign(&treasury.private_key))
            .await?;

        if let Some(token_id) = receipt.token_id {
            log::info!("Created token {} ({}) with treasury {}", token_id, symbol, treasury.id);
        }

        Ok(receipt)
    }

    /// Returns token properties
    pub async fn get_token_info(&self, token_id: &TokenId) -> Result<TokenInfo> {
        self.client.ledger().token_info(token_id).await
    }

    /// Mints `amount` units into the treasury, signed with the treasury key
    pub async fn mint_token(
        &self,
        token_id: &TokenId,
        amount: u64,
        treasury: &Account,
    ) -> Result<Receipt> {
        let transaction = self.client.freeze(Transaction::new(TransactionBody::TokenMint(
            TokenMint {
                token_id: *token_id,
                amount,
            },
        )))?;

        self.client
            .execute_transaction(transaction.sign(&treasury.private_key))
            .await
    }

    /// Returns token balance of an account, `0` when it holds none or is not associated
    pub async fn get_token_balance(
        &self,
        account_id: &AccountId,
        token_id: &TokenId,
    ) -> Result<u64> {
        let balance = self.client.ledger().account_balance(account_id).await?;
        Ok(balance.token_balance(token_id))
    }

    /// Associates `account` with a token, signed with the account key
    ///
    /// A repeated association is rejected by the ledger.
    pub async fn associate_token(&self, account: &Account, token_id: &TokenId) -> Result<Receipt> {
        let transaction = self.client.freeze(Transaction::new(TransactionBody::TokenAssociate(
            TokenAssociate {
                account_id: account.id,
                token_ids: vec![*token_id],
            },
        )))?;

        self.client
            .execute_transaction(transaction.sign(&account.private_key))
            .await
    }

    /// Builds and freezes an unsigned multi-party transfer of one token
    ///
    /// Amounts are not checked locally, the ledger rejects transfers not summing to zero. The
    /// fee is paid by the account of `payer_transaction_id` when given, by the operator
    /// otherwise.
    pub fn create_token_transfer_transaction(
        &self,
        transfers: &[(AccountId, i64)],
        token_id: &TokenId,
        payer_transaction_id: Option<TransactionId>,
    ) -> Result<FrozenTransaction> {
        let mut transfer = Transfer::default();
        for (account_id, amount) in transfers {
            transfer.add_token_transfer(*token_id, *account_id, *amount);
        }

        let mut transaction = Transaction::new(TransactionBody::Transfer(transfer));
        if let Some(transaction_id) = payer_transaction_id {
            transaction = transaction.with_transaction_id(transaction_id);
        }

        self.client.freeze(transaction)
    }

    /// Moves `amount` units from `sender` to `receiver`, signed by the sender only
    ///
    /// The fee is paid by the operator. Fails with `InvalidInput` when `amount` has no negation.
    pub async fn transfer_token(
        &self,
        sender: &Account,
        receiver: &Account,
        token_id: &TokenId,
        amount: i64,
    ) -> Result<Receipt> {
        let debit = amount.checked_neg().chain(|| {
            (
                ErrorKind::InvalidInput,
                format!("Transfer amount {} cannot be debited", amount),
            )
        })?;

        let transaction = self.create_token_transfer_transaction(
            &[(sender.id, debit), (receiver.id, amount)],
            token_id,
            None,
        )?;

        self.client
            .execute_transaction(transaction.sign(&sender.private_key))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use client_common::{ClientConfig, Hbar, Key, Status};
    use client_mock::MockLedger;

    fn setup() -> (TokenService<MockLedger>, Account, Account) {
        let ledger = MockLedger::default();
        let operator = ledger
            .create_account(Hbar::from_hbars(100))
            .expect("Unable to create operator account");
        let treasury = ledger
            .create_account(Hbar::from_hbars(100))
            .expect("Unable to create treasury account");
        let client =
            HederaClient::new(ledger, ClientConfig::default()).with_operator(operator.clone());

        (TokenService::new(client), operator, treasury)
    }

    async fn create_token(
        service: &TokenService<MockLedger>,
        treasury: &Account,
        initial_supply: u64,
        fixed_supply: bool,
    ) -> TokenId {
        let receipt = service
            .create_token("Test Token", "HTT", 2, initial_supply, treasury, fixed_supply)
            .await
            .expect("Unable to create token");

        assert_eq!(Status::Success, receipt.status);
        receipt.token_id.expect("Receipt without token id")
    }

    #[tokio::test]
    async fn check_create_token() {
        let (service, _, treasury) = setup();
        let token_id = create_token(&service, &treasury, 0, false).await;

        let info = service.get_token_info(&token_id).await.unwrap();
        assert_eq!("Test Token", info.name);
        assert_eq!("HTT", info.symbol);
        assert_eq!(2, info.decimals);
        assert_eq!(0, info.total_supply);
        assert_eq!(TokenSupplyType::Infinite, info.supply_type);
        assert_eq!(treasury.id, info.treasury_account_id);
        assert_eq!(Some(Key::from(treasury.public_key())), info.supply_key);
    }

    #[tokio::test]
    async fn check_mint_infinite_supply() {
        let (service, _, treasury) = setup();
        let token_id = create_token(&service, &treasury, 0, false).await;

        let receipt = service.mint_token(&token_id, 1000, &treasury).await.unwrap();
        assert_eq!(Status::Success, receipt.status);
        assert_eq!(Some(1000), receipt.total_supply);

        assert_eq!(
            1000,
            service.get_token_balance(&treasury.id, &token_id).await.unwrap()
        );
    }

    #[tokio::test]
    async fn check_mint_fixed_supply() {
        let (service, _, treasury) = setup();
        let token_id = create_token(&service, &treasury, 100, true).await;

        let info = service.get_token_info(&token_id).await.unwrap();
        assert_eq!(TokenSupplyType::Finite, info.supply_type);
        assert_eq!(100, info.max_supply);

        let receipt = service.mint_token(&token_id, 10, &treasury).await.unwrap();
        assert_eq!(Status::TokenMaxSupplyReached, receipt.status);
    }

    #[tokio::test]
    async fn check_mint_without_supply_key_signature() {
        let (service, operator, treasury) = setup();
        let token_id = create_token(&service, &treasury, 0, false).await;

        let receipt = service.mint_token(&token_id, 10, &operator).await.unwrap();
        assert_eq!(Status::InvalidSignature, receipt.status);
    }

    #[tokio::test]
    async fn check_unassociated_balance_is_zero() {
        let (service, operator, treasury) = setup();
        let token_id = create_token(&service, &treasury, 50, false).await;

        assert_eq!(
            0,
            service.get_token_balance(&operator.id, &token_id).await.unwrap()
        );
    }

    #[tokio::test]
    async fn check_associate_twice() {
        let (service, operator, treasury) = setup();
        let token_id = create_token(&service, &treasury, 0, false).await;

        let receipt = service.associate_token(&operator, &token_id).await.unwrap();
        assert_eq!(Status::Success, receipt.status);

        let receipt = service.associate_token(&operator, &token_id).await.unwrap();
        assert_eq!(Status::TokenAlreadyAssociatedToAccount, receipt.status);
    }

    #[tokio::test]
    async fn check_transfer_amount_without_negation() {
        let (service, operator, treasury) = setup();
        let token_id = create_token(&service, &treasury, 100, false).await;

        let error = service
            .transfer_token(&treasury, &operator, &token_id, i64::MIN)
            .await
            .expect_err("Transferred an amount that cannot be debited");
        assert_eq!(ErrorKind::InvalidInput, error.kind());

        assert_eq!(
            100,
            service.get_token_balance(&treasury.id, &token_id).await.unwrap()
        );
    }

    #[tokio::test]
    async fn check_transfer_transaction_payer() {
        let (service, operator, treasury) = setup();
        let token_id = create_token(&service, &treasury, 0, false).await;

        let transaction = service
            .create_token_transfer_transaction(
                &[(treasury.id, -1), (operator.id, 1)],
                &token_id,
                None,
            )
            .unwrap();
        assert_eq!(operator.id, transaction.transaction_id().account_id);
        assert!(transaction.signatures().is_empty());

        let payer_transaction_id = TransactionId::generate(&treasury.id);
        let transaction = service
            .create_token_transfer_transaction(
                &[(treasury.id, -1), (operator.id, 1)],
                &token_id,
                Some(payer_transaction_id),
            )
            .unwrap();
        assert_eq!(&payer_transaction_id, transaction.transaction_id());
    }
}
