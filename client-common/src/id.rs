//! Network-assigned entity identifiers, timestamps and transaction ids
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use parity_scale_codec::Encode;
use serde::de::{Deserializer, Error as SerdeDeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::{Error, ErrorKind, Result, ResultExt};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// `shard.realm.num` triple shared by every entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Encode)]
pub struct EntityId {
    /// Shard number
    pub shard: u64,
    /// Realm number
    pub realm: u64,
    /// Entity number
    pub num: u64,
}

impl EntityId {
    /// Creates an entity id in shard 0, realm 0
    #[inline]
    pub const fn from_num(num: u64) -> Self {
        EntityId {
            shard: 0,
            realm: 0,
            num,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s.split('.').collect::<Vec<_>>();

        if parts.len() != 3 {
            return Err(Error::new(
                ErrorKind::DeserializationError,
                format!("Expected `shard.realm.num`, found `{}`", s),
            ));
        }

        let parse = |part: &str| {
            part.parse::<u64>().chain(|| {
                (
                    ErrorKind::DeserializationError,
                    format!("Invalid entity id component in `{}`", s),
                )
            })
        };

        Ok(EntityId {
            shard: parse(parts[0])?,
            realm: parse(parts[1])?,
            num: parse(parts[2])?,
        })
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Encode)]
        pub struct $name(pub EntityId);

        impl $name {
            /// Creates an id in shard 0, realm 0 with given entity number
            #[inline]
            pub const fn from_num(num: u64) -> Self {
                $name(EntityId::from_num(num))
            }

            /// Returns the entity number
            #[inline]
            pub fn num(&self) -> u64 {
                self.0.num
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                EntityId::from_str(s).map($name)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let value = String::deserialize(deserializer)?;
                $name::from_str(&value).map_err(|err| D::Error::custom(err.to_string()))
            }
        }
    };
}

entity_id!(
    /// Account identifier
    AccountId
);
entity_id!(
    /// Fungible token identifier
    TokenId
);
entity_id!(
    /// Consensus topic identifier
    TopicId
);

/// Point in time with nanosecond precision
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Encode, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// Seconds since unix epoch
    pub seconds: i64,
    /// Nanoseconds within the second
    pub nanos: u32,
}

impl Timestamp {
    /// Earliest representable time, used to subscribe from the first message of a topic
    pub const EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    /// Current wall clock time
    pub fn now() -> Timestamp {
        Timestamp::from_unix_nanos(Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX))
    }

    /// Creates a timestamp from nanoseconds since unix epoch
    pub fn from_unix_nanos(nanos: i64) -> Timestamp {
        Timestamp {
            seconds: nanos.div_euclid(NANOS_PER_SECOND),
            nanos: nanos.rem_euclid(NANOS_PER_SECOND) as u32,
        }
    }

    /// Returns nanoseconds since unix epoch
    pub fn to_unix_nanos(&self) -> i64 {
        self.seconds
            .saturating_mul(NANOS_PER_SECOND)
            .saturating_add(i64::from(self.nanos))
    }
}

impl From<u64> for Timestamp {
    /// Interprets the value as whole seconds since unix epoch (`0` is the earliest time)
    ///
    /// Values past `i64::MAX` saturate.
    fn from(seconds: u64) -> Self {
        Timestamp {
            seconds: i64::try_from(seconds).unwrap_or(i64::MAX),
            nanos: 0,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// Identifier of a transaction: the paying account and the start of its validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Serialize, Deserialize)]
pub struct TransactionId {
    /// Account paying the network fee
    pub account_id: AccountId,
    /// Start of the validity window
    pub valid_start: Timestamp,
}

static LAST_VALID_START: AtomicI64 = AtomicI64::new(0);

impl TransactionId {
    /// Generates a new transaction id for given payer
    ///
    /// Valid start values are strictly increasing within the process, so two calls never
    /// yield the same id even on the same nanosecond.
    pub fn generate(payer: &AccountId) -> TransactionId {
        let now = Timestamp::now().to_unix_nanos();
        let mut previous = LAST_VALID_START.load(Ordering::Relaxed);

        let valid_start = loop {
            let candidate = now.max(previous + 1);
            match LAST_VALID_START.compare_exchange_weak(
                previous,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break candidate,
                Err(current) => previous = current,
            }
        };

        TransactionId {
            account_id: *payer,
            valid_start: Timestamp::from_unix_nanos(valid_start),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.valid_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_entity_id_parsing() {
        let account_id = AccountId::from_str("0.0.5678185").unwrap();

        assert_eq!(5678185, account_id.num());
        assert_eq!("0.0.5678185", account_id.to_string());

        let error = TokenId::from_str("0.0").expect_err("Parsed incomplete token id");
        assert_eq!(ErrorKind::DeserializationError, error.kind());

        let error = TopicId::from_str("0.0.x").expect_err("Parsed non numeric topic id");
        assert_eq!(ErrorKind::DeserializationError, error.kind());
    }

    #[test]
    fn check_serde_as_string() {
        let token_id = TokenId::from_num(42);
        let json = serde_json::to_string(&token_id).unwrap();

        assert_eq!("\"0.0.42\"", json);
        assert_eq!(token_id, serde_json::from_str::<TokenId>(&json).unwrap());
    }

    #[test]
    fn check_generated_transaction_ids_are_unique() {
        let payer = AccountId::from_num(2);

        let first = TransactionId::generate(&payer);
        let second = TransactionId::generate(&payer);

        assert_ne!(first, second);
        assert!(first.valid_start < second.valid_start);
        assert!(first.to_string().starts_with("0.0.2@"));
    }

    #[test]
    fn check_timestamp_nanos() {
        let timestamp = Timestamp::from_unix_nanos(1_500_000_001);

        assert_eq!(1, timestamp.seconds);
        assert_eq!(500_000_001, timestamp.nanos);
        assert_eq!(1_500_000_001, timestamp.to_unix_nanos());
        assert_eq!("1.500000001", timestamp.to_string());
        assert_eq!(Timestamp::EPOCH, Timestamp::from(0));
    }

    #[test]
    fn check_timestamp_from_seconds_saturates() {
        assert_eq!(1_700_000_000, Timestamp::from(1_700_000_000).seconds);
        assert_eq!(i64::MAX, Timestamp::from(u64::MAX).seconds);
        assert!(Timestamp::from(u64::MAX) > Timestamp::now());
    }
}
