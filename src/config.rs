//! Configuration management
//!
//! Loads configuration from config.toml with support for:
//! - Voting policy limits and default weights
//! - Database pool settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Distinct submissions a public voter may vote on within one event
pub const MAX_PUBLIC_VOTES_PER_EVENT: u32 = 3;

/// Weight used for a sponsor whose qualifying voting power sums to zero
pub const DEFAULT_SPONSOR_WEIGHT: f64 = 1.0;

/// Judge weight when AddJudge omits it
pub const DEFAULT_JUDGE_WEIGHT: f64 = 1.0;

/// Judge vote quota when AddJudge omits it
pub const DEFAULT_JUDGE_MAX_VOTES: u32 = 100;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub voting: VotingPolicy,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Voting policy knobs consumed by the weight engine and judge whitelist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingPolicy {
    pub max_public_votes_per_event: u32,
    pub default_sponsor_weight: f64,
    pub default_judge_weight: f64,
    pub default_judge_max_votes: u32,
}

impl Default for VotingPolicy {
    fn default() -> Self {
        Self {
            max_public_votes_per_event: MAX_PUBLIC_VOTES_PER_EVENT,
            default_sponsor_weight: DEFAULT_SPONSOR_WEIGHT,
            default_judge_weight: DEFAULT_JUDGE_WEIGHT,
            default_judge_max_votes: DEFAULT_JUDGE_MAX_VOTES,
        }
    }
}

/// Database configuration (PostgreSQL URL comes from DATABASE_URL)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub pool_max_size: usize,
    pub query_timeout_secs: u64,
    pub sqlite_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            pool_max_size: 20,
            query_timeout_secs: 30,
            sqlite_path: "hackathon-voting.db".to_string(),
        }
    }
}

impl Config {
    /// Load from config.toml or use defaults
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load from specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            Self::parse(&content).context("Failed to parse config file")
        } else {
            Self::parse(DEFAULT_CONFIG).context("Failed to parse default config")
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// PostgreSQL URL from the environment, if set and non-empty
    pub fn database_url(&self) -> Option<String> {
        match std::env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Some(url),
            _ => None,
        }
    }
}
