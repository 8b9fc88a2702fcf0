use std::ffi::OsString;

use serde::{Deserialize, Serialize};

use crate::error::EthError;

/// Variable holding the Infura project key.
pub const ENV_API_KEY: &str = "INFURA_API_KEY";
/// Variable overriding the HTTP JSON-RPC endpoint.
pub const ENV_RPC_URL: &str = "SEPOLIA_RPC_URL";
/// Variable overriding the WebSocket endpoint used for subscriptions.
pub const ENV_WS_URL: &str = "SEPOLIA_WS_URL";
/// Variable selecting the chain; defaults to Sepolia.
pub const ENV_CHAIN_ID: &str = "CHAIN_ID";

/// Definition of an EVM network reachable through Infura.
#[derive(Debug, Clone, Serialize)]
pub struct EvmNetwork {
    pub chain_id: u64,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    /// Subdomain of `infura.io` serving this network.
    pub infura_slug: &'static str,
    pub explorer_url: &'static str,
    pub is_testnet: bool,
}

impl EvmNetwork {
    pub fn infura_http_url(&self, api_key: &str) -> String {
        format!("https://{}.infura.io/v3/{api_key}", self.infura_slug)
    }

    pub fn infura_ws_url(&self, api_key: &str) -> String {
        format!("wss://{}.infura.io/ws/v3/{api_key}", self.infura_slug)
    }

    /// Block explorer link for a `0x`-prefixed transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url)
    }
}

/// Ethereum Mainnet (chain ID 1).
pub const ETHEREUM: EvmNetwork = EvmNetwork {
    chain_id: 1,
    name: "Ethereum",
    symbol: "ETH",
    decimals: 18,
    infura_slug: "mainnet",
    explorer_url: "https://etherscan.io",
    is_testnet: false,
};

/// Sepolia Testnet (chain ID 11155111).
pub const SEPOLIA: EvmNetwork = EvmNetwork {
    chain_id: 11155111,
    name: "Sepolia",
    symbol: "ETH",
    decimals: 18,
    infura_slug: "sepolia",
    explorer_url: "https://sepolia.etherscan.io",
    is_testnet: true,
};

/// Holesky Testnet (chain ID 17000).
pub const HOLESKY: EvmNetwork = EvmNetwork {
    chain_id: 17000,
    name: "Holesky",
    symbol: "ETH",
    decimals: 18,
    infura_slug: "holesky",
    explorer_url: "https://holesky.etherscan.io",
    is_testnet: true,
};

const ALL_NETWORKS: &[&EvmNetwork] = &[&ETHEREUM, &SEPOLIA, &HOLESKY];

/// Returns the network definition for a chain ID, or `None` if unknown.
pub fn get_network(chain_id: u64) -> Option<&'static EvmNetwork> {
    ALL_NETWORKS
        .iter()
        .find(|n| n.chain_id == chain_id)
        .copied()
}

pub fn supported_networks() -> Vec<&'static EvmNetwork> {
    ALL_NETWORKS.to_vec()
}

/// Node endpoints, passed explicitly to whatever talks to the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub http_url: String,
    #[serde(default)]
    pub ws_url: Option<String>,
    pub chain_id: u64,
}

impl NodeConfig {
    /// Builds Infura HTTP and WebSocket endpoints for `network`.
    pub fn infura(network: &EvmNetwork, api_key: &str) -> Result<Self, EthError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(EthError::InvalidConfig(format!("{ENV_API_KEY} is empty")));
        }

        Ok(Self {
            http_url: network.infura_http_url(api_key),
            ws_url: Some(network.infura_ws_url(api_key)),
            chain_id: network.chain_id,
        })
    }

    /// Parses and validates a JSON document such as
    /// `{"http_url": "...", "ws_url": "...", "chain_id": 11155111}`.
    pub fn from_json(json: &str) -> Result<Self, EthError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EthError::InvalidConfig(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves a config from key/value pairs, normally the process
    /// environment.
    ///
    /// An explicit [`ENV_RPC_URL`] wins. Otherwise [`ENV_API_KEY`] is combined
    /// with the network picked by [`ENV_CHAIN_ID`] (Sepolia when unset).
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, EthError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut api_key = None;
        let mut rpc_url = None;
        let mut ws_url = None;
        let mut chain_id = None;

        for (key, value) in vars {
            let slot = match key.as_ref() {
                ENV_API_KEY => &mut api_key,
                ENV_RPC_URL => &mut rpc_url,
                ENV_WS_URL => &mut ws_url,
                ENV_CHAIN_ID => &mut chain_id,
                _ => continue,
            };
            let value: String = value.into();
            if !value.trim().is_empty() {
                *slot = Some(value.trim().to_string());
            }
        }

        let chain_id = match chain_id {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                EthError::InvalidConfig(format!("{ENV_CHAIN_ID}={raw} is not a number: {e}"))
            })?,
            None => SEPOLIA.chain_id,
        };

        let config = match (rpc_url, api_key) {
            (Some(http_url), _) => Self {
                http_url,
                ws_url,
                chain_id,
            },
            (None, Some(api_key)) => {
                let network = get_network(chain_id).ok_or(EthError::UnsupportedChain(chain_id))?;
                let mut config = Self::infura(network, &api_key)?;
                if ws_url.is_some() {
                    config.ws_url = ws_url;
                }
                config
            }
            (None, None) => {
                return Err(EthError::InvalidConfig(format!(
                    "set {ENV_RPC_URL} or {ENV_API_KEY}"
                )))
            }
        };

        config.validate()?;
        tracing::debug!(chain_id = config.chain_id, "resolved node config");
        Ok(config)
    }

    /// [`NodeConfig::from_vars`] over the current process environment.
    pub fn from_env() -> Result<Self, EthError> {
        Self::from_os_vars(std::env::vars_os())
    }

    /// [`NodeConfig::from_vars`] over raw OS strings. Entries with non-UTF-8
    /// names are skipped; a non-UTF-8 value for a recognised name is an error.
    pub fn from_os_vars<I>(vars: I) -> Result<Self, EthError>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut known = Vec::new();
        for (key, value) in vars {
            let Some(key) = key.to_str() else { continue };
            if !matches!(key, ENV_API_KEY | ENV_RPC_URL | ENV_WS_URL | ENV_CHAIN_ID) {
                continue;
            }
            let value = value
                .into_string()
                .map_err(|_| EthError::InvalidConfig(format!("{key} is not valid UTF-8")))?;
            known.push((key.to_string(), value));
        }
        Self::from_vars(known)
    }

    pub fn validate(&self) -> Result<(), EthError> {
        if !(self.http_url.starts_with("https://") || self.http_url.starts_with("http://")) {
            return Err(EthError::InvalidConfig(format!(
                "http_url must be http(s): {}",
                self.http_url
            )));
        }

        if let Some(ws_url) = &self.ws_url {
            if !(ws_url.starts_with("wss://") || ws_url.starts_with("ws://")) {
                return Err(EthError::InvalidConfig(format!(
                    "ws_url must be ws(s): {ws_url}"
                )));
            }
        }

        if self.chain_id == 0 {
            return Err(EthError::InvalidConfig("chain_id must be non-zero".into()));
        }

        if get_network(self.chain_id).is_none() {
            tracing::warn!(chain_id = self.chain_id, "chain id is not a known network");
        }

        Ok(())
    }

    /// The known network for this config's chain, if any.
    pub fn network(&self) -> Option<&'static EvmNetwork> {
        get_network(self.chain_id)
    }
}
