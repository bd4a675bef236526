use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use client_common::{
    Account, ClientConfig, Hbar, PrivateKey, Status, ThresholdKey, Timestamp, TokenId,
    TransactionId,
};
use client_core::{AccountService, HederaClient, MessageService, TokenService};
use client_mock::MockLedger;

struct Network {
    ledger: Arc<MockLedger>,
    client: HederaClient<MockLedger>,
    operator: Account,
}

impl Network {
    fn new() -> Network {
        let _ = env_logger::builder().is_test(true).try_init();

        let ledger = Arc::new(MockLedger::default());
        let operator = ledger
            .create_account(Hbar::from_hbars(1_000))
            .expect("Unable to fund operator account");

        let config = ClientConfig {
            receipt_poll_interval: Duration::from_millis(10),
            ..ClientConfig::default()
        };
        let client =
            HederaClient::from_shared(ledger.clone(), config).with_operator(operator.clone());

        Network {
            ledger,
            client,
            operator,
        }
    }

    fn account(&self, hbars: i64) -> Account {
        self.ledger
            .create_account(Hbar::from_hbars(hbars))
            .expect("Unable to fund account")
    }

    fn tokens(&self) -> TokenService<MockLedger> {
        TokenService::new(self.client.clone())
    }

    async fn token(&self, treasury: &Account, initial_supply: u64, fixed_supply: bool) -> TokenId {
        let receipt = self
            .tokens()
            .create_token("Test Token", "HTT", 2, initial_supply, treasury, fixed_supply)
            .await
            .expect("Unable to create token");

        assert_eq!(Status::Success, receipt.status);
        receipt.token_id.expect("Receipt without token id")
    }
}

#[tokio::test]
async fn mint_into_treasury() {
    let network = Network::new();
    let treasury = network.account(100);
    let tokens = network.tokens();

    let token_id = network.token(&treasury, 0, false).await;
    let receipt = tokens
        .mint_token(&token_id, 1000, &treasury)
        .await
        .expect("Unable to mint token");

    assert_eq!(Status::Success, receipt.status);
    assert_eq!(1000, tokens.get_token_balance(&treasury.id, &token_id).await.unwrap());

    let info = tokens.get_token_info(&token_id).await.unwrap();
    assert_eq!("Test Token", info.name);
    assert_eq!("HTT", info.symbol);
    assert_eq!(2, info.decimals);
    assert_eq!(1000, info.total_supply);
}

#[tokio::test]
async fn fixed_supply_rejects_mint() {
    let network = Network::new();
    let treasury = network.account(100);
    let tokens = network.tokens();

    let token_id = network.token(&treasury, 1000, true).await;
    let receipt = tokens.mint_token(&token_id, 1, &treasury).await.unwrap();

    assert_eq!(Status::TokenMaxSupplyReached, receipt.status);
    assert_eq!(236, receipt.status.code());
    assert_eq!(1000, tokens.get_token_info(&token_id).await.unwrap().total_supply);
}

#[tokio::test]
async fn threshold_topic_message_is_received() {
    let network = Network::new();
    let messages = MessageService::new(network.client.clone());
    let first = PrivateKey::generate();
    let second = PrivateKey::generate();
    let submit_key = ThresholdKey::new(1, vec![first.public_key(), second.public_key()])
        .expect("Unable to create threshold key");

    let receipt = messages
        .create_topic("1 of 2", submit_key.into())
        .await
        .expect("Unable to create topic");
    let topic_id = receipt.topic_id.expect("Receipt without topic id");

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let handle = messages
        .subscribe_to_topic(&topic_id, Timestamp::from(0), move |text| {
            let _ = sender.send(text);
        })
        .await
        .expect("Unable to subscribe");

    let receipt = messages
        .publish_message(&topic_id, "Hello Future", Some(&second))
        .await
        .unwrap();
    assert_eq!(Status::Success, receipt.status);

    let text = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
        .await
        .expect("No message within a second");
    assert_eq!(Some("Hello Future".to_owned()), text);

    handle.unsubscribe();
}

#[tokio::test]
async fn transfer_requires_association() {
    let network = Network::new();
    let treasury = network.account(100);
    let receiver = network.account(100);
    let tokens = network.tokens();

    let token_id = network.token(&treasury, 1000, false).await;

    let receipt = tokens
        .transfer_token(&treasury, &receiver, &token_id, 100)
        .await
        .unwrap();
    assert_eq!(Status::TokenNotAssociatedToAccount, receipt.status);
    assert_eq!(0, tokens.get_token_balance(&receiver.id, &token_id).await.unwrap());

    let receipt = tokens.associate_token(&receiver, &token_id).await.unwrap();
    assert_eq!(Status::Success, receipt.status);

    let receipt = tokens
        .transfer_token(&treasury, &receiver, &token_id, 100)
        .await
        .unwrap();
    assert_eq!(Status::Success, receipt.status);
    assert_eq!(100, tokens.get_token_balance(&receiver.id, &token_id).await.unwrap());
    assert_eq!(900, tokens.get_token_balance(&treasury.id, &token_id).await.unwrap());
}

#[tokio::test]
async fn unbalanced_transfer_is_rejected() {
    let network = Network::new();
    let treasury = network.account(100);
    let receiver = network.account(100);
    let tokens = network.tokens();

    let token_id = network.token(&treasury, 1000, false).await;
    tokens.associate_token(&receiver, &token_id).await.unwrap();

    let transaction = tokens
        .create_token_transfer_transaction(
            &[(treasury.id, -10), (receiver.id, 20)],
            &token_id,
            None,
        )
        .unwrap()
        .sign(&treasury.private_key);
    let receipt = network.client.execute_transaction(transaction).await.unwrap();

    assert_eq!(Status::TransfersNotZeroSumForToken, receipt.status);
    assert_eq!(0, tokens.get_token_balance(&receiver.id, &token_id).await.unwrap());
}

#[tokio::test]
async fn multi_party_transfer() {
    let network = Network::new();
    let treasury = network.account(100);
    let first = network.account(100);
    let second = network.account(100);
    let third = network.account(100);
    let tokens = network.tokens();

    let token_id = network.token(&treasury, 1000, false).await;
    for account in &[&first, &second, &third] {
        tokens.associate_token(account, &token_id).await.unwrap();
    }
    tokens.transfer_token(&treasury, &first, &token_id, 100).await.unwrap();
    tokens.transfer_token(&treasury, &second, &token_id, 100).await.unwrap();

    // two senders, two receivers
    let transaction = tokens
        .create_token_transfer_transaction(
            &[
                (first.id, -10),
                (second.id, -10),
                (third.id, 15),
                (treasury.id, 5),
            ],
            &token_id,
            None,
        )
        .unwrap()
        .sign(&first.private_key)
        .sign(&second.private_key);
    let receipt = network.client.execute_transaction(transaction).await.unwrap();
    assert_eq!(Status::Success, receipt.status);

    assert_eq!(90, tokens.get_token_balance(&first.id, &token_id).await.unwrap());
    assert_eq!(90, tokens.get_token_balance(&second.id, &token_id).await.unwrap());
    assert_eq!(15, tokens.get_token_balance(&third.id, &token_id).await.unwrap());
    assert_eq!(805, tokens.get_token_balance(&treasury.id, &token_id).await.unwrap());
}

#[tokio::test]
async fn operator_pays_transfer_fee() {
    let network = Network::new();
    let treasury = network.account(100);
    let receiver = network.account(100);
    let tokens = network.tokens();
    let accounts = AccountService::new(network.client.clone());

    let token_id = network.token(&treasury, 1000, false).await;
    tokens.associate_token(&receiver, &token_id).await.unwrap();

    let operator_before = accounts.get_hbar_balance(&network.operator.id).await.unwrap();
    let treasury_before = accounts.get_hbar_balance(&treasury.id).await.unwrap();
    let receiver_before = accounts.get_hbar_balance(&receiver.id).await.unwrap();

    let receipt = tokens
        .transfer_token(&treasury, &receiver, &token_id, 10)
        .await
        .unwrap();
    assert_eq!(Status::Success, receipt.status);

    // sender only authorizes the debit
    assert_eq!(
        treasury_before,
        accounts.get_hbar_balance(&treasury.id).await.unwrap()
    );
    assert_eq!(
        receiver_before,
        accounts.get_hbar_balance(&receiver.id).await.unwrap()
    );
    assert_eq!(
        operator_before.to_tinybars() - network.ledger.config().transaction_fee.to_tinybars(),
        accounts
            .get_hbar_balance(&network.operator.id)
            .await
            .unwrap()
            .to_tinybars()
    );
    assert_eq!(10, tokens.get_token_balance(&receiver.id, &token_id).await.unwrap());
}

#[tokio::test]
async fn recipient_pays_transfer_fee() {
    let network = Network::new();
    let treasury = network.account(100);
    let receiver = network.account(100);
    let tokens = network.tokens();
    let accounts = AccountService::new(network.client.clone());

    let token_id = network.token(&treasury, 1000, false).await;
    tokens.associate_token(&receiver, &token_id).await.unwrap();

    let operator_before = accounts.get_hbar_balance(&network.operator.id).await.unwrap();
    let receiver_before = accounts.get_hbar_balance(&receiver.id).await.unwrap();

    let transaction_id = TransactionId::generate(&receiver.id);
    let transaction = tokens
        .create_token_transfer_transaction(
            &[(treasury.id, -50), (receiver.id, 50)],
            &token_id,
            Some(transaction_id),
        )
        .unwrap()
        .sign(&treasury.private_key)
        .sign(&receiver.private_key);
    let receipt = network.client.execute_transaction(transaction).await.unwrap();
    assert_eq!(Status::Success, receipt.status);

    let record = network
        .client
        .get_transaction_record(&transaction_id)
        .await
        .expect("Unable to fetch transaction record");
    assert_eq!(&receiver.id, record.payer());

    let receiver_after = accounts.get_hbar_balance(&receiver.id).await.unwrap();
    assert_eq!(
        receiver_before.to_tinybars() - record.transaction_fee.to_tinybars(),
        receiver_after.to_tinybars()
    );
    assert_eq!(
        operator_before,
        accounts.get_hbar_balance(&network.operator.id).await.unwrap()
    );
    assert_eq!(50, tokens.get_token_balance(&receiver.id, &token_id).await.unwrap());
}

#[tokio::test]
async fn created_account_holds_initial_balance() {
    let network = Network::new();
    let accounts = AccountService::new(network.client.clone());
    let tokens = network.tokens();
    let treasury = network.account(100);
    let token_id = network.token(&treasury, 10, false).await;

    let account = accounts
        .create_account(Hbar::from_hbars(5))
        .await
        .expect("Unable to create account");

    assert!(accounts.get_hbar_balance(&account.id).await.unwrap() >= Hbar::from_hbars(5));
    assert_eq!(0, tokens.get_token_balance(&account.id, &token_id).await.unwrap());
}

#[tokio::test]
async fn operator_can_be_rebound() {
    let network = Network::new();
    let alice = network.account(100);
    let mut accounts = AccountService::new(network.client.clone());

    accounts.client_mut().set_operator(alice.clone());
    let alice_before = accounts.get_hbar_balance(&alice.id).await.unwrap();
    accounts.create_account(Hbar::from_hbars(1)).await.unwrap();

    assert!(accounts.get_hbar_balance(&alice.id).await.unwrap() < alice_before);
    assert_eq!(Some(&alice), accounts.client().operator());
}
