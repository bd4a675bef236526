//! Ledger state and the rules applied when a transaction reaches consensus
use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use tokio::sync::broadcast;
use tokio::time::Instant;

use client_common::ledger::types::{AccountBalance, TokenInfo, TopicMessage};
use client_common::transaction::{
    AccountCreate, TokenAssociate, TokenCreate, TokenMint, TopicCreate, TopicMessageSubmit,
    Transfer,
};
use client_common::{
    AccountId, FrozenTransaction, Hbar, HbarTransfer, Key, PublicKey, Receipt, Status, Timestamp,
    TokenId, TokenSupplyType, TokenTransfer, TopicId, TransactionBody, TransactionId,
    TransactionRecord,
};

const TOPIC_CHANNEL_CAPACITY: usize = 1024;

type Rule<T> = std::result::Result<T, Status>;

pub(crate) struct AccountState {
    pub key: Key,
    pub hbars: Hbar,
    pub tokens: BTreeMap<TokenId, u64>,
}

pub(crate) struct TopicState {
    pub memo: String,
    pub submit_key: Option<Key>,
    pub messages: Vec<TopicMessage>,
    pub sender: broadcast::Sender<TopicMessage>,
}

pub(crate) struct StoredRecord {
    pub submitted_at: Instant,
    pub record: TransactionRecord,
}

struct Outcome {
    receipt: Receipt,
    hbar_transfers: Vec<HbarTransfer>,
    token_transfers: Vec<TokenTransfer>,
}

impl Outcome {
    fn new(status: Status) -> Self {
        Outcome {
            receipt: Receipt::new(status),
            hbar_transfers: Vec::new(),
            token_transfers: Vec::new(),
        }
    }
}

pub(crate) struct LedgerState {
    pub accounts: HashMap<AccountId, AccountState>,
    pub tokens: HashMap<TokenId, TokenInfo>,
    pub topics: HashMap<TopicId, TopicState>,
    pub records: HashMap<TransactionId, StoredRecord>,
    next_entity_num: u64,
    last_consensus_nanos: i64,
}

impl LedgerState {
    pub fn new(first_entity_num: u64) -> Self {
        LedgerState {
            accounts: HashMap::new(),
            tokens: HashMap::new(),
            topics: HashMap::new(),
            records: HashMap::new(),
            next_entity_num: first_entity_num,
            last_consensus_nanos: 0,
        }
    }

    pub fn next_entity_num(&mut self) -> u64 {
        let num = self.next_entity_num;
        self.next_entity_num += 1;
        num
    }

    pub fn insert_account(&mut self, account_id: AccountId, key: Key, hbars: Hbar) {
        if account_id.num() >= self.next_entity_num {
            self.next_entity_num = account_id.num() + 1;
        }

        self.accounts.insert(
            account_id,
            AccountState {
                key,
                hbars,
                tokens: BTreeMap::new(),
            },
        );
    }

    pub fn balance(&self, account_id: &AccountId) -> Option<AccountBalance> {
        self.accounts.get(account_id).map(|account| AccountBalance {
            account_id: *account_id,
            hbars: account.hbars,
            tokens: account.tokens.clone(),
        })
    }

    /// Runs precheck, then applies the transaction and stores its record
    ///
    /// The fee is charged once precheck passes, whatever the outcome of the body.
    pub fn submit(&mut self, transaction: &FrozenTransaction, fee: Hbar) -> Rule<()> {
        self.precheck(transaction, fee)?;

        let transaction_id = *transaction.transaction_id();
        let payer_id = transaction_id.account_id;
        let consensus_timestamp = self.next_consensus_timestamp();

        if let Some(payer) = self.accounts.get_mut(&payer_id) {
            payer.hbars = Hbar::from_tinybars(payer.hbars.to_tinybars() - fee.to_tinybars());
        }

        let signers = transaction.signers();
        let outcome = self
            .apply(transaction.body(), &payer_id, &signers, consensus_timestamp)
            .unwrap_or_else(Outcome::new);

        log::debug!(
            "{} {} reached consensus with status {}",
            transaction.body().name(),
            transaction_id,
            outcome.receipt.status
        );

        let record = TransactionRecord {
            transaction_id,
            receipt: outcome.receipt,
            consensus_timestamp,
            transaction_fee: fee,
            memo: transaction.header().memo.clone(),
            hbar_transfers: outcome.hbar_transfers,
            token_transfers: outcome.token_transfers,
        };

        self.records.insert(
            transaction_id,
            StoredRecord {
                submitted_at: Instant::now(),
                record,
            },
        );

        Ok(())
    }

    fn precheck(&self, transaction: &FrozenTransaction, fee: Hbar) -> Rule<()> {
        let transaction_id = transaction.transaction_id();

        if self.records.contains_key(transaction_id) {
            return Err(Status::DuplicateTransaction);
        }

        let body_bytes = transaction.body_bytes();
        if transaction
            .signatures()
            .iter()
            .any(|pair| !pair.public_key.verify(body_bytes, &pair.signature))
        {
            return Err(Status::InvalidSignature);
        }

        let payer = self
            .accounts
            .get(&transaction_id.account_id)
            .ok_or(Status::PayerAccountNotFound)?;

        require(&payer.key, &transaction.signers())?;

        if transaction.header().max_transaction_fee < fee {
            return Err(Status::InsufficientTxFee);
        }

        if payer.hbars < fee {
            return Err(Status::InsufficientPayerBalance);
        }

        Ok(())
    }

    fn next_consensus_timestamp(&mut self) -> Timestamp {
        let now = Timestamp::now().to_unix_nanos();
        let next = now.max(self.last_consensus_nanos + 1);
        self.last_consensus_nanos = next;
        Timestamp::from_unix_nanos(next)
    }

    fn apply(
        &mut self,
        body: &TransactionBody,
        payer_id: &AccountId,
        signers: &[PublicKey],
        consensus_timestamp: Timestamp,
    ) -> Rule<Outcome> {
        match body {
            TransactionBody::AccountCreate(create) => self.create_account(create, payer_id),
            TransactionBody::TokenCreate(create) => self.create_token(create, signers),
            TransactionBody::TokenMint(mint) => self.mint_token(mint, signers),
            TransactionBody::TokenAssociate(associate) => self.associate_token(associate, signers),
            TransactionBody::Transfer(transfer) => self.transfer(transfer, signers),
            TransactionBody::TopicCreate(create) => self.create_topic(create, signers),
            TransactionBody::TopicMessageSubmit(submit) => {
                self.submit_message(submit, signers, consensus_timestamp)
            }
        }
    }

    fn create_account(&mut self, create: &AccountCreate, payer_id: &AccountId) -> Rule<Outcome> {
        if create.initial_balance.is_negative() {
            return Err(Status::InvalidAccountAmounts);
        }

        let payer = self
            .accounts
            .get_mut(payer_id)
            .ok_or(Status::PayerAccountNotFound)?;

        if payer.hbars < create.initial_balance {
            return Err(Status::InsufficientPayerBalance);
        }

        payer.hbars = Hbar::from_tinybars(
            payer.hbars.to_tinybars() - create.initial_balance.to_tinybars(),
        );

        let account_id = AccountId::from_num(self.next_entity_num());
        self.insert_account(account_id, create.key.clone(), create.initial_balance);
        log::info!("Created account {}", account_id);

        let mut outcome = Outcome::new(Status::Success);
        outcome.receipt.account_id = Some(account_id);
        outcome.hbar_transfers = vec![
            HbarTransfer {
                account_id: *payer_id,
                amount: -create.initial_balance,
            },
            HbarTransfer {
                account_id,
                amount: create.initial_balance,
            },
        ];

        Ok(outcome)
    }

    fn create_token(&mut self, create: &TokenCreate, signers: &[PublicKey]) -> Rule<Outcome> {
        if create.name.trim().is_empty() {
            return Err(Status::MissingTokenName);
        }

        if create.symbol.trim().is_empty() {
            return Err(Status::MissingTokenSymbol);
        }

        let treasury = self
            .accounts
            .get(&create.treasury_account_id)
            .ok_or(Status::InvalidAccountId)?;

        require(&treasury.key, signers)?;

        if let Some(ref admin_key) = create.admin_key {
            require(admin_key, signers)?;
        }

        let max_supply = match create.supply_type {
            TokenSupplyType::Finite => {
                if create.initial_supply > create.max_supply {
                    return Err(Status::InvalidTokenInitialSupply);
                }
                create.max_supply
            }
            TokenSupplyType::Infinite => 0,
        };

        let token_id = TokenId::from_num(self.next_entity_num());
        let info = TokenInfo {
            token_id,
            name: create.name.clone(),
            symbol: create.symbol.clone(),
            decimals: create.decimals,
            total_supply: create.initial_supply,
            max_supply,
            supply_type: create.supply_type,
            treasury_account_id: create.treasury_account_id,
            admin_key: create.admin_key.clone(),
            supply_key: create.supply_key.clone(),
            freeze_key: create.freeze_key.clone(),
        };
        self.tokens.insert(token_id, info);

        if let Some(treasury) = self.accounts.get_mut(&create.treasury_account_id) {
            treasury.tokens.insert(token_id, create.initial_supply);
        }

        log::info!(
            "Created token {} ({}) with treasury {}",
            token_id,
            create.symbol,
            create.treasury_account_id
        );

        let mut outcome = Outcome::new(Status::Success);
        outcome.receipt.token_id = Some(token_id);
        if create.initial_supply > 0 {
            outcome.token_transfers.push(TokenTransfer {
                token_id,
                account_id: create.treasury_account_id,
                amount: create.initial_supply as i64,
            });
        }

        Ok(outcome)
    }

    fn mint_token(&mut self, mint: &TokenMint, signers: &[PublicKey]) -> Rule<Outcome> {
        let token = self
            .tokens
            .get_mut(&mint.token_id)
            .ok_or(Status::InvalidTokenId)?;

        let supply_key = token
            .supply_key
            .as_ref()
            .ok_or(Status::TokenHasNoSupplyKey)?;
        require(supply_key, signers)?;

        if mint.amount == 0 {
            return Err(Status::InvalidTokenMintAmount);
        }

        let total_supply = token
            .total_supply
            .checked_add(mint.amount)
            .ok_or(Status::TokenMaxSupplyReached)?;

        if token.supply_type == TokenSupplyType::Finite && total_supply > token.max_supply {
            return Err(Status::TokenMaxSupplyReached);
        }

        token.total_supply = total_supply;
        let treasury_account_id = token.treasury_account_id;

        let treasury = self
            .accounts
            .get_mut(&treasury_account_id)
            .ok_or(Status::InvalidAccountId)?;
        *treasury.tokens.entry(mint.token_id).or_default() += mint.amount;

        let mut outcome = Outcome::new(Status::Success);
        outcome.receipt.total_supply = Some(total_supply);
        outcome.token_transfers.push(TokenTransfer {
            token_id: mint.token_id,
            account_id: treasury_account_id,
            amount: mint.amount as i64,
        });

        Ok(outcome)
    }

    fn associate_token(
        &mut self,
        associate: &TokenAssociate,
        signers: &[PublicKey],
    ) -> Rule<Outcome> {
        let account = self
            .accounts
            .get(&associate.account_id)
            .ok_or(Status::InvalidAccountId)?;

        require(&account.key, signers)?;

        for token_id in &associate.token_ids {
            if !self.tokens.contains_key(token_id) {
                return Err(Status::InvalidTokenId);
            }

            if account.tokens.contains_key(token_id) {
                return Err(Status::TokenAlreadyAssociatedToAccount);
            }
        }

        if let Some(account) = self.accounts.get_mut(&associate.account_id) {
            for token_id in &associate.token_ids {
                account.tokens.insert(*token_id, 0);
            }
        }

        Ok(Outcome::new(Status::Success))
    }

    fn transfer(&mut self, transfer: &Transfer, signers: &[PublicKey]) -> Rule<Outcome> {
        let mut hbar_net = BTreeMap::<AccountId, i128>::new();
        for leg in &transfer.hbar_transfers {
            *hbar_net.entry(leg.account_id).or_default() += i128::from(leg.amount.to_tinybars());
        }

        if hbar_net.values().sum::<i128>() != 0 {
            return Err(Status::InvalidAccountAmounts);
        }

        for (account_id, net) in &hbar_net {
            let account = self
                .accounts
                .get(account_id)
                .ok_or(Status::InvalidAccountId)?;

            if *net < 0 {
                require(&account.key, signers)?;

                if i128::from(account.hbars.to_tinybars()) < -net {
                    return Err(Status::InsufficientAccountBalance);
                }
            }
        }

        let legs_by_token = transfer
            .token_transfers
            .iter()
            .map(|leg| (leg.token_id, leg))
            .into_group_map();

        let mut token_net = BTreeMap::<(TokenId, AccountId), i128>::new();
        for (token_id, legs) in &legs_by_token {
            if !self.tokens.contains_key(token_id) {
                return Err(Status::InvalidTokenId);
            }

            if legs.iter().map(|leg| i128::from(leg.amount)).sum::<i128>() != 0 {
                return Err(Status::TransfersNotZeroSumForToken);
            }

            for leg in legs {
                *token_net.entry((*token_id, leg.account_id)).or_default() +=
                    i128::from(leg.amount);
            }
        }

        for ((token_id, account_id), net) in &token_net {
            let account = self
                .accounts
                .get(account_id)
                .ok_or(Status::InvalidAccountId)?;

            let balance = account
                .tokens
                .get(token_id)
                .ok_or(Status::TokenNotAssociatedToAccount)?;

            if *net < 0 {
                require(&account.key, signers)?;

                if i128::from(*balance) < -net {
                    return Err(Status::InsufficientTokenBalance);
                }
            }
        }

        for (account_id, net) in hbar_net {
            if let Some(account) = self.accounts.get_mut(&account_id) {
                let hbars = i128::from(account.hbars.to_tinybars()) + net;
                account.hbars = Hbar::from_tinybars(hbars as i64);
            }
        }

        for ((token_id, account_id), net) in token_net {
            if let Some(balance) = self
                .accounts
                .get_mut(&account_id)
                .and_then(|account| account.tokens.get_mut(&token_id))
            {
                *balance = (i128::from(*balance) + net) as u64;
            }
        }

        let mut outcome = Outcome::new(Status::Success);
        outcome.hbar_transfers = transfer.hbar_transfers.clone();
        outcome.token_transfers = transfer.token_transfers.clone();

        Ok(outcome)
    }

    fn create_topic(&mut self, create: &TopicCreate, signers: &[PublicKey]) -> Rule<Outcome> {
        if let Some(ref admin_key) = create.admin_key {
            require(admin_key, signers)?;
        }

        let topic_id = TopicId::from_num(self.next_entity_num());
        let (sender, _) = broadcast::channel(TOPIC_CHANNEL_CAPACITY);

        self.topics.insert(
            topic_id,
            TopicState {
                memo: create.memo.clone(),
                submit_key: create.submit_key.clone(),
                messages: Vec::new(),
                sender,
            },
        );
        log::info!("Created topic {} ({})", topic_id, create.memo);

        let mut outcome = Outcome::new(Status::Success);
        outcome.receipt.topic_id = Some(topic_id);

        Ok(outcome)
    }

    fn submit_message(
        &mut self,
        submit: &TopicMessageSubmit,
        signers: &[PublicKey],
        consensus_timestamp: Timestamp,
    ) -> Rule<Outcome> {
        let topic = self
            .topics
            .get_mut(&submit.topic_id)
            .ok_or(Status::InvalidTopicId)?;

        if let Some(ref submit_key) = topic.submit_key {
            require(submit_key, signers)?;
        }

        let sequence_number = topic.messages.len() as u64 + 1;
        let message = TopicMessage {
            topic_id: submit.topic_id,
            consensus_timestamp,
            sequence_number,
            contents: submit.message.clone(),
        };

        topic.messages.push(message.clone());
        // no receiver is not an error, history is replayed to later subscribers
        let _ = topic.sender.send(message);

        let mut outcome = Outcome::new(Status::Success);
        outcome.receipt.topic_sequence_number = Some(sequence_number);

        Ok(outcome)
    }
}

fn require(key: &Key, signers: &[PublicKey]) -> Rule<()> {
    if key.is_satisfied_by(signers) {
        Ok(())
    } else {
        Err(Status::InvalidSignature)
    }
}
