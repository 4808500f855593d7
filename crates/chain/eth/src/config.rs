//! Ethereum-side configuration.

use std::env;

use chain_core::Address;

/// Default gas allowance for score submissions.
pub const DEFAULT_GAS_LIMIT: u64 = 4_712_388;

/// Configuration for one node endpoint and one deployed ledger contract.
#[derive(Clone, Debug)]
pub struct EthConfig {
    /// Node JSON-RPC endpoint URL.
    pub node_url: String,

    /// Chain id for replay-protected signing.
    pub chain_id: u64,

    /// Deployed score ledger contract.
    pub contract_address: Address,

    /// Who authorizes score claims.
    pub issuer_address: Address,

    /// The issuer's signing key, hex encoded.
    pub issuer_private_key: String,

    /// Local sender key, hex encoded. When absent, submissions must go
    /// through an injected external signer.
    pub player_private_key: Option<String>,

    /// Gas limit for score submissions.
    pub gas_limit: u64,
}

impl EthConfig {
    pub fn new(
        node_url: impl Into<String>,
        contract_address: Address,
        issuer_address: Address,
        issuer_private_key: impl Into<String>,
    ) -> Self {
        Self {
            node_url: node_url.into(),
            chain_id: 1,
            contract_address,
            issuer_address,
            issuer_private_key: issuer_private_key.into(),
            player_private_key: None,
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `NODE_URL` - Node JSON-RPC endpoint (required)
    /// - `CHAIN_ID` - Chain id for transaction signing (default: 1)
    /// - `CONTRACT_ADDRESS` - Deployed ledger contract (required)
    /// - `ISSUER_ADDRESS` - Score issuer address (required)
    /// - `ISSUER_PRIVATE_KEY` - Score issuer signing key (required)
    /// - `PLAYER_PRIVATE_KEY` - Local sender key (optional)
    /// - `GAS_LIMIT` - Gas allowance for submissions (default: 4712388)
    pub fn from_env() -> Result<Self, String> {
        let node_url = env::var("NODE_URL").map_err(|_| "NODE_URL is not set".to_string())?;

        let chain_id = match env::var("CHAIN_ID") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| format!("Invalid CHAIN_ID: {raw}"))?,
            Err(_) => 1,
        };

        let contract_address = parse_address_var("CONTRACT_ADDRESS")?;
        let issuer_address = parse_address_var("ISSUER_ADDRESS")?;

        let issuer_private_key =
            env::var("ISSUER_PRIVATE_KEY").map_err(|_| "ISSUER_PRIVATE_KEY is not set".to_string())?;
        let player_private_key = env::var("PLAYER_PRIVATE_KEY").ok();

        let gas_limit = match env::var("GAS_LIMIT") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| format!("Invalid GAS_LIMIT: {raw}"))?,
            Err(_) => DEFAULT_GAS_LIMIT,
        };

        Ok(Self {
            node_url,
            chain_id,
            contract_address,
            issuer_address,
            issuer_private_key,
            player_private_key,
            gas_limit,
        })
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_player_private_key(mut self, key: impl Into<String>) -> Self {
        self.player_private_key = Some(key.into());
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.node_url.starts_with("http://") && !self.node_url.starts_with("https://") {
            return Err(format!("NODE_URL is not an http(s) URL: {}", self.node_url));
        }
        if self.gas_limit == 0 {
            return Err("GAS_LIMIT must be nonzero".to_string());
        }
        Ok(())
    }
}

fn parse_address_var(key: &str) -> Result<Address, String> {
    let raw = env::var(key).map_err(|_| format!("{key} is not set"))?;
    raw.parse::<Address>()
        .map_err(|e| format!("Invalid {key}: {e}"))
}
