//! Chain endpoint and seller identity
//!
//! Both are read once from the environment at startup (a `.env` file is
//! loaded first when present):
//!
//! ```bash
//! export INCOGNITO_PROTOCOL="https"   # optional, defaults to http
//! export INCOGNITO_HOST="testnet.incognito.org"
//! export INCOGNITO_PORT="9334"        # optional
//! export SELLER_PRIVKEY="112t8r..."
//! export SELLER_ADDRESS="12S5Lr..."
//! ```

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Environment variable names
pub mod env_vars {
    pub const PROTOCOL: &str = "INCOGNITO_PROTOCOL";
    pub const HOST: &str = "INCOGNITO_HOST";
    pub const PORT: &str = "INCOGNITO_PORT";
    pub const SELLER_PRIVKEY: &str = "SELLER_PRIVKEY";
    pub const SELLER_ADDRESS: &str = "SELLER_ADDRESS";
}

const DEFAULT_PROTOCOL: &str = "http";

/// JSON-RPC endpoint of the chain node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    url: Url,
}

impl RpcConfig {
    /// Build from `INCOGNITO_PROTOCOL`, `INCOGNITO_HOST` and `INCOGNITO_PORT`
    pub fn from_env() -> Result<Self> {
        let host = non_empty_var(env_vars::HOST).ok_or_else(|| {
            Error::Config(format!(
                "Environment variable {} not set. Required for the chain RPC endpoint.",
                env_vars::HOST
            ))
        })?;
        let protocol =
            non_empty_var(env_vars::PROTOCOL).unwrap_or_else(|| DEFAULT_PROTOCOL.to_string());
        let port = non_empty_var(env_vars::PORT);

        Self::from_parts(&protocol, &host, port.as_deref())
    }

    /// Build from protocol, host and optional port
    pub fn from_parts(protocol: &str, host: &str, port: Option<&str>) -> Result<Self> {
        let raw = match port {
            Some(port) => format!("{}://{}:{}", protocol, host, port),
            None => format!("{}://{}", protocol, host),
        };
        Self::with_url(&raw)
    }

    /// Use an explicit endpoint URL
    pub fn with_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .map_err(|e| Error::Config(format!("Invalid RPC URL {}: {}", raw, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!("Unsupported RPC protocol: {}", url.scheme())));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Key material and public address of the selling account
///
/// The private key is held in a [`SecretString`] and is never serialized or
/// logged. Outside of a signing submitter it is only read to fingerprint it.
#[derive(Debug)]
pub struct SellerCredentials {
    private_key: SecretString,
    address: String,
}

impl SellerCredentials {
    pub fn new(private_key: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            private_key: SecretString::from(private_key.into()),
            address: address.into(),
        }
    }

    /// Read `SELLER_PRIVKEY` and `SELLER_ADDRESS`
    pub fn from_env() -> Result<Self> {
        let private_key = non_empty_var(env_vars::SELLER_PRIVKEY).ok_or_else(|| {
            Error::Config(format!(
                "Environment variable {} not set. Required for trade submission.",
                env_vars::SELLER_PRIVKEY
            ))
        })?;
        let address = non_empty_var(env_vars::SELLER_ADDRESS).ok_or_else(|| {
            Error::Config(format!(
                "Environment variable {} not set. Required for trade submission.",
                env_vars::SELLER_ADDRESS
            ))
        })?;

        Ok(Self::new(private_key, address))
    }

    /// Public payment address (safe to log)
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Short blake3 digest of the private key, safe to log
    ///
    /// Lets an operator confirm which key is loaded without revealing it.
    pub fn key_fingerprint(&self) -> String {
        let digest = blake3::hash(self.private_key.expose_secret().as_bytes());
        digest.to_hex()[..12].to_string()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
