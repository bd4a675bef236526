//! Transaction requests and their lifecycle
//!
//! A [`Transaction`] is constructed with its parameters, then frozen into a
//! [`FrozenTransaction`] which binds the transaction id, node and max fee and fixes the byte
//! representation every signature commits to. Only frozen transactions can be signed.
//!
//! [`Transaction`]: self::Transaction
//! [`FrozenTransaction`]: self::FrozenTransaction
use parity_scale_codec::Encode;
use serde::{Deserialize, Serialize};

use crate::{
    AccountId, Error, ErrorKind, Hbar, Key, PrivateKey, PublicKey, Result, Signature, TokenId,
    TopicId, TransactionId,
};

/// Creates a new account
#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub struct AccountCreate {
    /// Key controlling the new account
    pub key: Key,
    /// Balance moved from the payer into the new account
    pub initial_balance: Hbar,
}

/// Supply policy of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Serialize, Deserialize)]
pub enum TokenSupplyType {
    /// Unbounded supply, minting is always allowed
    Infinite,
    /// Supply capped at `max_supply`
    Finite,
}

/// Creates a new fungible token
#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub struct TokenCreate {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Number of decimal places
    pub decimals: u32,
    /// Units credited to the treasury at creation
    pub initial_supply: u64,
    /// Account holding the initial supply and receiving minted units
    pub treasury_account_id: AccountId,
    /// Key allowed to update or delete the token
    pub admin_key: Option<Key>,
    /// Key allowed to mint and burn
    pub supply_key: Option<Key>,
    /// Key allowed to freeze accounts
    pub freeze_key: Option<Key>,
    /// Supply policy
    pub supply_type: TokenSupplyType,
    /// Supply ceiling, only meaningful for finite supply
    pub max_supply: u64,
}

/// Increases the supply of a token, crediting its treasury
#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub struct TokenMint {
    /// Token to mint
    pub token_id: TokenId,
    /// Units to mint
    pub amount: u64,
}

/// Associates tokens with an account so it can hold them
#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub struct TokenAssociate {
    /// Account to associate
    pub account_id: AccountId,
    /// Tokens to associate
    pub token_ids: Vec<TokenId>,
}

/// Single HBAR leg of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Serialize, Deserialize)]
pub struct HbarTransfer {
    /// Account debited (negative) or credited (positive)
    pub account_id: AccountId,
    /// Signed amount
    pub amount: Hbar,
}

/// Single token leg of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Serialize, Deserialize)]
pub struct TokenTransfer {
    /// Token moved
    pub token_id: TokenId,
    /// Account debited (negative) or credited (positive)
    pub account_id: AccountId,
    /// Signed amount in the smallest token unit
    pub amount: i64,
}

/// Multi-party transfer of HBAR and tokens
///
/// Amounts have to net to zero per token and for HBAR. This is enforced by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode)]
pub struct Transfer {
    /// HBAR legs
    pub hbar_transfers: Vec<HbarTransfer>,
    /// Token legs
    pub token_transfers: Vec<TokenTransfer>,
}

impl Transfer {
    /// Adds a token leg
    pub fn add_token_transfer(
        &mut self,
        token_id: TokenId,
        account_id: AccountId,
        amount: i64,
    ) -> &mut Self {
        self.token_transfers.push(TokenTransfer {
            token_id,
            account_id,
            amount,
        });
        self
    }

    /// Adds an HBAR leg
    pub fn add_hbar_transfer(&mut self, account_id: AccountId, amount: Hbar) -> &mut Self {
        self.hbar_transfers.push(HbarTransfer { account_id, amount });
        self
    }
}

/// Creates a consensus topic
#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub struct TopicCreate {
    /// Topic memo
    pub memo: String,
    /// Key allowed to update or delete the topic
    pub admin_key: Option<Key>,
    /// Key which has to sign every submitted message, anyone may submit when absent
    pub submit_key: Option<Key>,
}

/// Publishes a message to a topic
#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub struct TopicMessageSubmit {
    /// Destination topic
    pub topic_id: TopicId,
    /// Raw message contents
    pub message: Vec<u8>,
}

/// Operation performed by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub enum TransactionBody {
    /// Account creation
    AccountCreate(AccountCreate),
    /// Token creation
    TokenCreate(TokenCreate),
    /// Token mint
    TokenMint(TokenMint),
    /// Token association
    TokenAssociate(TokenAssociate),
    /// HBAR and token transfer
    Transfer(Transfer),
    /// Topic creation
    TopicCreate(TopicCreate),
    /// Topic message submission
    TopicMessageSubmit(TopicMessageSubmit),
}

impl TransactionBody {
    /// Returns a short name of the operation, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            TransactionBody::AccountCreate(_) => "AccountCreate",
            TransactionBody::TokenCreate(_) => "TokenCreate",
            TransactionBody::TokenMint(_) => "TokenMint",
            TransactionBody::TokenAssociate(_) => "TokenAssociate",
            TransactionBody::Transfer(_) => "Transfer",
            TransactionBody::TopicCreate(_) => "TopicCreate",
            TransactionBody::TopicMessageSubmit(_) => "TopicMessageSubmit",
        }
    }
}

/// Constructed, not yet frozen transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    body: TransactionBody,
    transaction_id: Option<TransactionId>,
    max_transaction_fee: Option<Hbar>,
    memo: String,
}

impl Transaction {
    /// Creates a transaction performing given operation
    pub fn new(body: TransactionBody) -> Self {
        Transaction {
            body,
            transaction_id: None,
            max_transaction_fee: None,
            memo: String::new(),
        }
    }

    /// Sets an explicit transaction id, which also selects the account paying the fee
    pub fn with_transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }

    /// Sets the max fee the payer is willing to pay
    pub fn with_max_transaction_fee(mut self, max_transaction_fee: Hbar) -> Self {
        self.max_transaction_fee = Some(max_transaction_fee);
        self
    }

    /// Sets the transaction memo
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Returns the operation of current transaction
    #[inline]
    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    /// Returns the explicit transaction id, if one was set
    #[inline]
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    /// Freezes current transaction
    ///
    /// The transaction id is the explicit one when set, otherwise it is generated for
    /// `default_payer`. Fails with [`ErrorKind::OperatorNotSet`] when neither exists.
    ///
    /// [`ErrorKind::OperatorNotSet`]: crate::ErrorKind::OperatorNotSet
    pub fn freeze(
        self,
        node_account_id: AccountId,
        default_payer: Option<&AccountId>,
        default_max_transaction_fee: Hbar,
    ) -> Result<FrozenTransaction> {
        let transaction_id = match (self.transaction_id, default_payer) {
            (Some(transaction_id), _) => transaction_id,
            (None, Some(payer)) => TransactionId::generate(payer),
            (None, None) => {
                return Err(Error::new(
                    ErrorKind::OperatorNotSet,
                    "Transaction id must be set or an operator bound before freezing",
                ))
            }
        };

        let max_transaction_fee = self
            .max_transaction_fee
            .unwrap_or(default_max_transaction_fee);

        if max_transaction_fee.is_negative() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Max transaction fee cannot be negative",
            ));
        }

        let header = TransactionHeader {
            transaction_id,
            node_account_id,
            max_transaction_fee,
            memo: self.memo,
        };
        let body_bytes = (&header, &self.body).encode();

        Ok(FrozenTransaction {
            header,
            body: self.body,
            body_bytes,
            signatures: Vec::new(),
        })
    }
}

impl From<TransactionBody> for Transaction {
    fn from(body: TransactionBody) -> Self {
        Transaction::new(body)
    }
}

/// Parameters bound to a transaction at freeze time
#[derive(Debug, Clone, PartialEq, Eq, Encode)]
pub struct TransactionHeader {
    /// Transaction id (payer and valid start)
    pub transaction_id: TransactionId,
    /// Node the transaction is sent to
    pub node_account_id: AccountId,
    /// Max fee the payer is willing to pay
    pub max_transaction_fee: Hbar,
    /// Transaction memo
    pub memo: String,
}

/// Signature together with the key that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePair {
    /// Signing key
    pub public_key: PublicKey,
    /// Signature over the frozen body bytes
    pub signature: Signature,
}

/// Frozen transaction, possibly carrying signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenTransaction {
    header: TransactionHeader,
    body: TransactionBody,
    body_bytes: Vec<u8>,
    signatures: Vec<SignaturePair>,
}

impl FrozenTransaction {
    /// Signs current transaction with given key
    ///
    /// Signatures accumulate. Signing twice with the same key keeps the first signature.
    pub fn sign(mut self, private_key: &PrivateKey) -> Self {
        let public_key = private_key.public_key();

        if !self.is_signed_by(&public_key) {
            let signature = private_key.sign(&self.body_bytes);
            self.signatures.push(SignaturePair {
                public_key,
                signature,
            });
        }

        self
    }

    /// Attaches a signature produced elsewhere over [`body_bytes`]
    ///
    /// [`body_bytes`]: self::FrozenTransaction::body_bytes
    pub fn add_signature(mut self, public_key: PublicKey, signature: Signature) -> Result<Self> {
        if !public_key.verify(&self.body_bytes, &signature) {
            return Err(Error::new(
                ErrorKind::SigningError,
                "Signature does not match the frozen transaction",
            ));
        }

        if !self.is_signed_by(&public_key) {
            self.signatures.push(SignaturePair {
                public_key,
                signature,
            });
        }

        Ok(self)
    }

    /// Returns `true` if current transaction carries a signature of given key
    pub fn is_signed_by(&self, public_key: &PublicKey) -> bool {
        self.signatures
            .iter()
            .any(|pair| pair.public_key == *public_key)
    }

    /// Returns the transaction id
    #[inline]
    pub fn transaction_id(&self) -> &TransactionId {
        &self.header.transaction_id
    }

    /// Returns the parameters bound at freeze time
    #[inline]
    pub fn header(&self) -> &TransactionHeader {
        &self.header
    }

    /// Returns the operation of current transaction
    #[inline]
    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    /// Returns the bytes every signature commits to
    #[inline]
    pub fn body_bytes(&self) -> &[u8] {
        &self.body_bytes
    }

    /// Returns attached signatures
    #[inline]
    pub fn signatures(&self) -> &[SignaturePair] {
        &self.signatures
    }

    /// Returns public keys of all signers
    pub fn signers(&self) -> Vec<PublicKey> {
        self.signatures.iter().map(|pair| pair.public_key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mint_body() -> TransactionBody {
        TransactionBody::TokenMint(TokenMint {
            token_id: TokenId::from_num(1001),
            amount: 1000,
        })
    }

    #[test]
    fn check_freeze_requires_payer() {
        let error = Transaction::new(mint_body())
            .freeze(AccountId::from_num(3), None, Hbar::from_hbars(1))
            .expect_err("Froze a transaction without payer");

        assert_eq!(ErrorKind::OperatorNotSet, error.kind());
    }

    #[test]
    fn check_explicit_transaction_id_wins() {
        let payer = AccountId::from_num(1002);
        let transaction_id = TransactionId::generate(&payer);

        let frozen = Transaction::new(mint_body())
            .with_transaction_id(transaction_id)
            .freeze(
                AccountId::from_num(3),
                Some(&AccountId::from_num(2)),
                Hbar::from_hbars(1),
            )
            .unwrap();

        assert_eq!(&transaction_id, frozen.transaction_id());
        assert_eq!(payer, frozen.transaction_id().account_id);
    }

    #[test]
    fn check_signatures_accumulate() {
        let first = PrivateKey::generate();
        let second = PrivateKey::generate();

        let frozen = Transaction::new(mint_body())
            .freeze(
                AccountId::from_num(3),
                Some(&AccountId::from_num(2)),
                Hbar::from_hbars(1),
            )
            .unwrap()
            .sign(&first)
            .sign(&second)
            .sign(&first);

        assert_eq!(2, frozen.signatures().len());
        assert_eq!(vec![first.public_key(), second.public_key()], frozen.signers());

        for pair in frozen.signatures() {
            assert!(pair.public_key.verify(frozen.body_bytes(), &pair.signature));
        }
    }

    #[test]
    fn check_signature_commits_to_header() {
        let key = PrivateKey::generate();
        let payer = AccountId::from_num(2);

        let first = Transaction::new(mint_body())
            .freeze(AccountId::from_num(3), Some(&payer), Hbar::from_hbars(1))
            .unwrap()
            .sign(&key);
        let second = Transaction::new(mint_body())
            .with_memo("other")
            .freeze(AccountId::from_num(3), Some(&payer), Hbar::from_hbars(1))
            .unwrap();

        let signature = first.signatures()[0].signature;
        let error = second
            .add_signature(key.public_key(), signature)
            .expect_err("Accepted signature over different bytes");
        assert_eq!(ErrorKind::SigningError, error.kind());
    }

    #[test]
    fn check_negative_fee_rejected() {
        let error = Transaction::new(mint_body())
            .with_max_transaction_fee(Hbar::from_tinybars(-1))
            .freeze(
                AccountId::from_num(3),
                Some(&AccountId::from_num(2)),
                Hbar::from_hbars(1),
            )
            .unwrap_err();

        assert_eq!(ErrorKind::InvalidInput, error.kind());
    }
}
