//! Environment-driven configuration. This is the only place the binary reads
//! credentials; everything below the CLI receives typed config values and
//! never touches the environment.

use std::env;

use anyhow::{bail, Result};

use llm::LlmConfig;
use tools::FlightSearchConfig;

/// Resolved runtime settings for one invocation.
pub struct AppConfig {
    pub llm: LlmConfig,
    pub flight_search: Option<FlightSearchConfig>,
}

impl AppConfig {
    /// Read settings from the process environment. `.env` support is handled
    /// by the caller before this runs.
    ///
    /// Azure wins over plain OpenAI when both are configured, matching how
    /// deployments usually layer their `.env` files.
    pub fn from_env() -> Result<Self> {
        let llm = if let Ok(endpoint) = env::var("AZURE_OPENAI_ENDPOINT") {
            LlmConfig::Azure {
                endpoint,
                api_key: require("AZURE_OPENAI_API_KEY")?,
                deployment: require("AZURE_OPENAI_DEPLOYMENT")?,
            }
        } else if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            LlmConfig::OpenAi {
                api_key,
                model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            }
        } else {
            bail!(
                "no language model configured: set AZURE_OPENAI_ENDPOINT or \
                 OPENAI_API_KEY, or pass --offline"
            );
        };

        let flight_search = env::var("SERPAPI_API_KEY")
            .ok()
            .map(FlightSearchConfig::new);

        Ok(Self { llm, flight_search })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow::anyhow!("required environment variable {name} is not set"))
}
