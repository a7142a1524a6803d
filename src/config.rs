//! Resolver configuration, loadable from a JSON file.

use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::static_tokens::StaticTokenDefinition;

pub const DEFAULT_MAX_CONCURRENT_RESOLUTIONS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Human-readable chain label, used in logs.
    #[serde(default = "default_chain_name")]
    pub chain_name: String,
    /// Upper bound on in-flight resolutions per batch; size this to what the
    /// upstream RPC provider tolerates.
    #[serde(default = "default_max_concurrent_resolutions")]
    pub max_concurrent_resolutions: usize,
    /// Extra static definitions merged over the builtin list at startup.
    #[serde(default)]
    pub static_tokens: Vec<StaticTokenDefinition>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            chain_name: default_chain_name(),
            max_concurrent_resolutions: default_max_concurrent_resolutions(),
            static_tokens: Vec::new(),
        }
    }
}

impl ResolverSettings {
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| {
                format!(
                    "Failed to read resolver config file: {}",
                    path.as_ref().display()
                )
            })?;
        serde_json::from_str(&content).with_context(|| {
            format!(
                "Failed to parse resolver config from JSON: {}",
                path.as_ref().display()
            )
        })
    }
}

fn default_chain_name() -> String {
    "ethereum".to_string()
}

fn default_max_concurrent_resolutions() -> usize {
    DEFAULT_MAX_CONCURRENT_RESOLUTIONS
}
