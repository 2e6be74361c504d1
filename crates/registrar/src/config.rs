//! Environment-sourced configuration
//!
//! All credentials and contract addresses come from the environment (or a
//! `.env` file loaded by the binary). A missing required variable fails
//! fast with an error naming the variable, before any network call.

use pinata::PinataConfig;
use std::str::FromStr;
use story::{Address, StoryConfig, U256};
use thiserror::Error;
use timeline::TimelineConfig;

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid {
        var: &'static str,
        reason: String,
    },
}

/// Lookup function over the environment, injectable for tests
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn required(lookup: EnvLookup, var: &'static str) -> Result<String, ConfigError> {
    lookup(var)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(var))
}

fn optional_parse<T: FromStr>(lookup: EnvLookup, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) if !raw.is_empty() => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

/// Core configuration shared by every command
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub story: StoryConfig,
    pub pinata: PinataConfig,
    /// NFT contract the registry call references; falls back to the
    /// wallet address when absent, as the original deployment did
    pub token_contract: Option<Address>,
    /// Parent IP asset for derivative submissions
    pub parent_asset: Option<Address>,
    /// License terms already registered during setup; fresh terms are
    /// registered per run when absent
    pub license_terms_id: Option<U256>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: EnvLookup) -> Result<Self, ConfigError> {
        let story = StoryConfig {
            rpc_url: required(lookup, "STORY_RPC_URL")?,
            chain_id: optional_parse(lookup, "STORY_CHAIN_ID")?.unwrap_or(1315),
            private_key: Some(required(lookup, "STORY_WALLET_PRIVATE_KEY")?),
            ip_asset_registry: required(lookup, "IP_ASSET_REGISTRY_ADDRESS")?,
            licensing_module: required(lookup, "LICENSING_MODULE_ADDRESS")?,
            pil_template: required(lookup, "PIL_TEMPLATE_ADDRESS")?,
            royalty_policy: required(lookup, "ROYALTY_POLICY_ADDRESS")?,
            currency_token: required(lookup, "CURRENCY_TOKEN_ADDRESS")?,
            confirmation_timeout_secs: optional_parse(lookup, "CONFIRMATION_TIMEOUT_SECS")?
                .unwrap_or(120),
        };

        let mut pinata = PinataConfig::new(required(lookup, "PINATA_JWT")?);
        if let Some(url) = lookup("PINATA_API_URL").filter(|v| !v.is_empty()) {
            pinata.api_url = url;
        }
        if let Some(url) = lookup("PINATA_GATEWAY_URL").filter(|v| !v.is_empty()) {
            pinata.gateway_url = url;
        }

        Ok(Self {
            story,
            pinata,
            token_contract: optional_parse(lookup, "TOKEN_CONTRACT_ADDRESS")?,
            parent_asset: optional_parse(lookup, "PARENT_IP_ID")?,
            license_terms_id: optional_parse(lookup, "LICENSE_TERMS_ID")?,
        })
    }
}

/// Extra configuration required by the `watch` command
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub timeline: TimelineConfig,
    /// Handle of the account whose timeline is polled
    pub username: String,
    /// Seconds between timeline checks
    pub interval_secs: u64,
    /// Page size for each timeline fetch
    pub max_results: u32,
    /// Where the processed-post set is persisted
    pub processed_posts_path: String,
    /// Keywords that make a post eligible for registration
    pub keywords: Vec<String>,
}

/// Keywords the original tracker watched for
pub const DEFAULT_KEYWORDS: &[&str] = &["defi", "trading", "market", "analysis", "crypto"];

impl WatchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: EnvLookup) -> Result<Self, ConfigError> {
        let timeline = TimelineConfig::new(required(lookup, "TWITTER_BEARER_TOKEN")?);

        let keywords = match lookup("DISCOVERY_KEYWORDS").filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .split(',')
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            None => DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        };

        Ok(Self {
            timeline,
            username: required(lookup, "TWITTER_USERNAME")?,
            interval_secs: optional_parse(lookup, "DISCOVERY_INTERVAL_SECS")?.unwrap_or(900),
            max_results: optional_parse(lookup, "TIMELINE_MAX_RESULTS")?.unwrap_or(10),
            processed_posts_path: lookup("PROCESSED_POSTS_PATH")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "processed_posts.json".to_string()),
            keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const ADDR: &str = "0x1234567890123456789012345678901234567890";

    fn full_env() -> HashMap<&'static str, String> {
        let mut env = HashMap::new();
        env.insert("STORY_RPC_URL", "https://aeneid.storyrpc.io".to_string());
        env.insert("STORY_WALLET_PRIVATE_KEY", format!("0x{}", "1".repeat(64)));
        env.insert("IP_ASSET_REGISTRY_ADDRESS", ADDR.to_string());
        env.insert("LICENSING_MODULE_ADDRESS", ADDR.to_string());
        env.insert("PIL_TEMPLATE_ADDRESS", ADDR.to_string());
        env.insert("ROYALTY_POLICY_ADDRESS", ADDR.to_string());
        env.insert("CURRENCY_TOKEN_ADDRESS", ADDR.to_string());
        env.insert("PINATA_JWT", "jwt-token".to_string());
        env
    }

    fn lookup_in<'a>(
        env: &'a HashMap<&'static str, String>,
    ) -> impl Fn(&str) -> Option<String> + 'a {
        move |k: &str| env.get(k).cloned()
    }

    #[test]
    fn test_full_config_loads() {
        let env = full_env();
        let config = AppConfig::from_lookup(&lookup_in(&env)).unwrap();
        assert_eq!(config.story.chain_id, 1315);
        assert_eq!(config.story.confirmation_timeout_secs, 120);
        assert!(config.story.can_write());
        assert!(config.parent_asset.is_none());
        assert!(config.story.validate().is_ok());
    }

    #[test]
    fn test_missing_variable_is_named() {
        let mut env = full_env();
        env.remove("STORY_WALLET_PRIVATE_KEY");
        let err = AppConfig::from_lookup(&lookup_in(&env)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required environment variable STORY_WALLET_PRIVATE_KEY"
        );
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("PINATA_JWT", String::new());
        let err = AppConfig::from_lookup(&lookup_in(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("PINATA_JWT")));
    }

    #[test]
    fn test_invalid_optional_value() {
        let mut env = full_env();
        env.insert("STORY_CHAIN_ID", "not-a-number".to_string());
        let err = AppConfig::from_lookup(&lookup_in(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "STORY_CHAIN_ID", .. }));
    }

    #[test]
    fn test_optional_parent_asset() {
        let mut env = full_env();
        env.insert("PARENT_IP_ID", ADDR.to_string());
        let config = AppConfig::from_lookup(&lookup_in(&env)).unwrap();
        assert!(config.parent_asset.is_some());
    }

    #[test]
    fn test_watch_config_defaults() {
        let mut env = HashMap::new();
        env.insert("TWITTER_BEARER_TOKEN", "bearer".to_string());
        env.insert("TWITTER_USERNAME", "ToDaMoon_Ava".to_string());
        let config = WatchConfig::from_lookup(&lookup_in(&env)).unwrap();
        assert_eq!(config.interval_secs, 900);
        assert_eq!(config.max_results, 10);
        assert_eq!(config.keywords, DEFAULT_KEYWORDS);
    }

    #[test]
    fn test_watch_config_custom_keywords() {
        let mut env = HashMap::new();
        env.insert("TWITTER_BEARER_TOKEN", "bearer".to_string());
        env.insert("TWITTER_USERNAME", "ava".to_string());
        env.insert("DISCOVERY_KEYWORDS", "Art, NFT ,".to_string());
        let config = WatchConfig::from_lookup(&lookup_in(&env)).unwrap();
        assert_eq!(config.keywords, vec!["art", "nft"]);
    }

    #[test]
    fn test_watch_config_missing_username() {
        let mut env = HashMap::new();
        env.insert("TWITTER_BEARER_TOKEN", "bearer".to_string());
        let err = WatchConfig::from_lookup(&lookup_in(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("TWITTER_USERNAME")));
    }
}
