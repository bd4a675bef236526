//! Client configuration
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Error, ErrorKind, Hbar, Result, ResultExt};

/// Environment variable selecting the network (`mainnet`, `testnet`, `previewnet`, `local`)
pub const NETWORK_ENV: &str = "HEDERA_CLIENT_NETWORK";
/// Environment variable overriding the default max transaction fee (in tinybars)
pub const MAX_FEE_ENV: &str = "HEDERA_CLIENT_MAX_FEE";
/// Environment variable overriding the receipt timeout (in milliseconds)
pub const RECEIPT_TIMEOUT_ENV: &str = "HEDERA_CLIENT_RECEIPT_TIMEOUT";

const DEFAULT_MAX_TRANSACTION_FEE: Hbar = Hbar::from_hbars(2);
const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
/// Every network accepts transactions at node `0.0.3`
const DEFAULT_NODE_ACCOUNT_NUM: u64 = 3;

/// Ledger network the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network
    Mainnet,
    /// Public test network
    Testnet,
    /// Preview network
    Previewnet,
    /// Locally running network
    Local,
}

impl Default for Network {
    fn default() -> Self {
        Network::Testnet
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Previewnet => "previewnet",
            Network::Local => "local",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "previewnet" => Ok(Network::Previewnet),
            "local" | "localhost" => Ok(Network::Local),
            other => Err(Error::new(
                ErrorKind::ConfigError,
                format!("Unknown network: {}", other),
            )),
        }
    }
}

/// Parameters bound into every transaction at freeze time and used while awaiting receipts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Network to use
    pub network: Network,
    /// Node account receiving submitted transactions
    pub node_account_id: AccountId,
    /// Max fee the payer is willing to pay when a transaction does not set one
    pub max_transaction_fee: Hbar,
    /// Interval between receipt polls
    #[serde(with = "duration_millis")]
    pub receipt_poll_interval: Duration,
    /// Time after which waiting on a receipt fails with a timeout error
    #[serde(with = "duration_millis")]
    pub receipt_timeout: Duration,
}

impl ClientConfig {
    /// Creates default configuration for given network
    pub fn for_network(network: Network) -> Self {
        ClientConfig {
            network,
            node_account_id: AccountId::from_num(DEFAULT_NODE_ACCOUNT_NUM),
            max_transaction_fee: DEFAULT_MAX_TRANSACTION_FEE,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }

    /// Creates configuration from `HEDERA_CLIENT_*` environment variables over defaults
    pub fn from_env() -> Result<Self> {
        let network = match std::env::var(NETWORK_ENV) {
            Ok(network) => network.parse()?,
            Err(_) => Network::default(),
        };

        let mut config = ClientConfig::for_network(network);

        if let Ok(max_fee) = std::env::var(MAX_FEE_ENV) {
            let tinybars = max_fee.trim().parse::<i64>().chain(|| {
                (
                    ErrorKind::ConfigError,
                    format!("{} must be a number of tinybars", MAX_FEE_ENV),
                )
            })?;
            config.max_transaction_fee = Hbar::from_tinybars(tinybars);
        }

        if let Ok(timeout) = std::env::var(RECEIPT_TIMEOUT_ENV) {
            let millis = timeout.trim().parse::<u64>().chain(|| {
                (
                    ErrorKind::ConfigError,
                    format!("{} must be a number of milliseconds", RECEIPT_TIMEOUT_ENV),
                )
            })?;
            config.receipt_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Parses configuration from JSON, missing fields take default values
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).chain(|| {
            (
                ErrorKind::ConfigError,
                "Unable to deserialize client configuration from JSON",
            )
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::for_network(Network::default())
    }
}

mod duration_millis {
    use std::convert::TryFrom;
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
