//! Transaction outcomes reported by the ledger
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    AccountId, Error, ErrorKind, Hbar, HbarTransfer, Result, Timestamp, TokenId, TokenTransfer,
    TopicId, TransactionId,
};

/// Ledger response code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Accepted by the node
    Ok,
    /// Payer account does not exist
    PayerAccountNotFound,
    /// A signature does not verify or a required signature is missing
    InvalidSignature,
    /// Max transaction fee is below the network fee
    InsufficientTxFee,
    /// Payer cannot cover fee (and funded amounts)
    InsufficientPayerBalance,
    /// Transaction id was already used
    DuplicateTransaction,
    /// Referenced account does not exist
    InvalidAccountId,
    /// No receipt exists for the transaction id
    ReceiptNotFound,
    /// Transaction has not reached consensus yet
    Unknown,
    /// Transaction succeeded
    Success,
    /// Debited account cannot cover a transfer
    InsufficientAccountBalance,
    /// HBAR transfer legs do not net to zero
    InvalidAccountAmounts,
    /// Referenced topic does not exist
    InvalidTopicId,
    /// Referenced token does not exist
    InvalidTokenId,
    /// Token decimals are invalid
    InvalidTokenDecimals,
    /// Initial supply is invalid or exceeds the max supply
    InvalidTokenInitialSupply,
    /// Token transfer legs do not net to zero
    TransfersNotZeroSumForToken,
    /// Token symbol is missing
    MissingTokenSymbol,
    /// Debited account cannot cover a token transfer
    InsufficientTokenBalance,
    /// Token cannot be minted because it has no supply key
    TokenHasNoSupplyKey,
    /// Mint amount is zero
    InvalidTokenMintAmount,
    /// Account is not associated with the token
    TokenNotAssociatedToAccount,
    /// Token name is missing
    MissingTokenName,
    /// Account is already associated with the token
    TokenAlreadyAssociatedToAccount,
    /// Mint would exceed the max supply of a finite token
    TokenMaxSupplyReached,
}

impl Status {
    /// Returns the numeric response code used by the ledger
    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::PayerAccountNotFound => 2,
            Status::InvalidSignature => 7,
            Status::InsufficientTxFee => 9,
            Status::InsufficientPayerBalance => 10,
            Status::DuplicateTransaction => 11,
            Status::InvalidAccountId => 15,
            Status::ReceiptNotFound => 18,
            Status::Unknown => 21,
            Status::Success => 22,
            Status::InsufficientAccountBalance => 28,
            Status::InvalidAccountAmounts => 48,
            Status::InvalidTopicId => 150,
            Status::InvalidTokenId => 167,
            Status::InvalidTokenDecimals => 168,
            Status::InvalidTokenInitialSupply => 169,
            Status::TransfersNotZeroSumForToken => 173,
            Status::MissingTokenSymbol => 174,
            Status::InsufficientTokenBalance => 178,
            Status::TokenHasNoSupplyKey => 180,
            Status::InvalidTokenMintAmount => 182,
            Status::TokenNotAssociatedToAccount => 184,
            Status::MissingTokenName => 190,
            Status::TokenAlreadyAssociatedToAccount => 194,
            Status::TokenMaxSupplyReached => 236,
        }
    }

    /// Returns `true` for a successful outcome
    #[inline]
    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    fn name(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
            Status::InvalidSignature => "INVALID_SIGNATURE",
            Status::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Status::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            Status::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Status::InvalidAccountId => "INVALID_ACCOUNT_ID",
            Status::ReceiptNotFound => "RECEIPT_NOT_FOUND",
            Status::Unknown => "UNKNOWN",
            Status::Success => "SUCCESS",
            Status::InsufficientAccountBalance => "INSUFFICIENT_ACCOUNT_BALANCE",
            Status::InvalidAccountAmounts => "INVALID_ACCOUNT_AMOUNTS",
            Status::InvalidTopicId => "INVALID_TOPIC_ID",
            Status::InvalidTokenId => "INVALID_TOKEN_ID",
            Status::InvalidTokenDecimals => "INVALID_TOKEN_DECIMALS",
            Status::InvalidTokenInitialSupply => "INVALID_TOKEN_INITIAL_SUPPLY",
            Status::TransfersNotZeroSumForToken => "TRANSFERS_NOT_ZERO_SUM_FOR_TOKEN",
            Status::MissingTokenSymbol => "MISSING_TOKEN_SYMBOL",
            Status::InsufficientTokenBalance => "INSUFFICIENT_TOKEN_BALANCE",
            Status::TokenHasNoSupplyKey => "TOKEN_HAS_NO_SUPPLY_KEY",
            Status::InvalidTokenMintAmount => "INVALID_TOKEN_MINT_AMOUNT",
            Status::TokenNotAssociatedToAccount => "TOKEN_NOT_ASSOCIATED_TO_ACCOUNT",
            Status::MissingTokenName => "MISSING_TOKEN_NAME",
            Status::TokenAlreadyAssociatedToAccount => "TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT",
            Status::TokenMaxSupplyReached => "TOKEN_MAX_SUPPLY_REACHED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Consensus status
    pub status: Status,
    /// Account created by the transaction
    pub account_id: Option<AccountId>,
    /// Token created by the transaction
    pub token_id: Option<TokenId>,
    /// Topic created by the transaction
    pub topic_id: Option<TopicId>,
    /// Sequence number of a submitted topic message
    pub topic_sequence_number: Option<u64>,
    /// Token supply after a mint
    pub total_supply: Option<u64>,
}

impl Receipt {
    /// Creates a receipt carrying only a status
    pub fn new(status: Status) -> Self {
        Receipt {
            status,
            account_id: None,
            token_id: None,
            topic_id: None,
            topic_sequence_number: None,
            total_supply: None,
        }
    }

    /// Returns `true` if the transaction succeeded
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turns a non-success receipt into an [`ErrorKind::ReceiptStatusError`]
    ///
    /// [`ErrorKind::ReceiptStatusError`]: crate::ErrorKind::ReceiptStatusError
    pub fn validate_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::new(
                ErrorKind::ReceiptStatusError,
                format!("Transaction failed with status {}", self.status),
            )
            .with_status(self.status))
        }
    }
}

/// Detailed outcome of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction id, its account is the fee payer
    pub transaction_id: TransactionId,
    /// Receipt of the transaction
    pub receipt: Receipt,
    /// Consensus time
    pub consensus_timestamp: Timestamp,
    /// Fee charged to the payer
    pub transaction_fee: Hbar,
    /// Transaction memo
    pub memo: String,
    /// HBAR movements, fee excluded
    pub hbar_transfers: Vec<HbarTransfer>,
    /// Token movements
    pub token_transfers: Vec<TokenTransfer>,
}

impl TransactionRecord {
    /// Returns the account that paid the fee
    #[inline]
    pub fn payer(&self) -> &AccountId {
        &self.transaction_id.account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_status_codes() {
        assert_eq!(22, Status::Success.code());
        assert_eq!(236, Status::TokenMaxSupplyReached.code());
        assert_eq!("TOKEN_MAX_SUPPLY_REACHED", Status::TokenMaxSupplyReached.to_string());
        assert_eq!(
            "\"TOKEN_NOT_ASSOCIATED_TO_ACCOUNT\"",
            serde_json::to_string(&Status::TokenNotAssociatedToAccount).unwrap()
        );
    }

    #[test]
    fn check_validate_status() {
        assert!(Receipt::new(Status::Success).validate_status().is_ok());

        let error = Receipt::new(Status::TokenMaxSupplyReached)
            .validate_status()
            .expect_err("Failed receipt passed validation");

        assert_eq!(ErrorKind::ReceiptStatusError, error.kind());
        assert_eq!(Some(Status::TokenMaxSupplyReached), error.status());
        assert_eq!(Some(236), error.status().map(Status::code));
    }
}
